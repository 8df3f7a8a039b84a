//! Tree builder turning a parsed hierarchy into an arena-backed category tree.

use std::collections::HashSet;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::CategoryTree;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::notation::{self, Hierarchy};

/// Constructs category trees from parsed hierarchies.
pub struct TreeBuilder {
    seen_names: HashSet<String>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            seen_names: HashSet::new(),
        }
    }

    /// Build a tree with one node per hierarchy entry, children in source order.
    ///
    /// Fails on the first category name that occurs twice.
    #[instrument(level = "debug", skip(self, hierarchy), fields(root = %hierarchy.name))]
    pub fn build(&mut self, hierarchy: &Hierarchy) -> DomainResult<CategoryTree> {
        self.seen_names.clear();
        self.claim(&hierarchy.name)?;

        let mut tree = CategoryTree::with_root(hierarchy.name.clone());
        let mut stack: Vec<(&Hierarchy, Index)> = Vec::new();
        // Reversed so that popping yields children left to right
        for child in hierarchy.children.iter().rev() {
            stack.push((child, tree.root()));
        }

        while let Some((current, parent_idx)) = stack.pop() {
            self.claim(&current.name)?;
            let current_idx = tree.insert_child(parent_idx, current.name.clone());
            for child in current.children.iter().rev() {
                stack.push((child, current_idx));
            }
        }

        tree.index_descendant_names();
        debug!(categories = tree.len(), depth = tree.depth(), "built category tree");
        Ok(tree)
    }

    fn claim(&mut self, name: &str) -> DomainResult<()> {
        if !self.seen_names.insert(name.to_string()) {
            return Err(DomainError::DuplicateNameInTree(name.to_string()));
        }
        Ok(())
    }
}

/// Parses `notation` and builds the category tree it describes.
#[instrument(level = "debug")]
pub fn parse_tree(notation: &str) -> DomainResult<CategoryTree> {
    let hierarchy = notation::parse(notation)?;
    TreeBuilder::new().build(&hierarchy)
}

impl std::str::FromStr for CategoryTree {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tree(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_hierarchy_when_building_then_children_keep_source_order() {
        let hierarchy = Hierarchy::node(
            "A",
            vec![
                Hierarchy::node("B", vec![Hierarchy::leaf("C"), Hierarchy::leaf("D")]),
                Hierarchy::leaf("E"),
            ],
        );

        let tree = TreeBuilder::new().build(&hierarchy).unwrap();

        let root = &tree[tree.root()];
        let names: Vec<&str> = root.children().iter().map(|&c| tree[c].name()).collect();
        assert_eq!(names, vec!["B", "E"]);
        let b = tree.find_node("B").unwrap();
        let names: Vec<&str> = tree[b].children().iter().map(|&c| tree[c].name()).collect();
        assert_eq!(names, vec!["C", "D"]);
        assert_eq!(tree.len(), hierarchy.category_count());
    }

    #[test]
    fn given_repeated_name_when_building_then_fails_with_duplicate() {
        let hierarchy = Hierarchy::node(
            "A",
            vec![
                Hierarchy::node("B", vec![Hierarchy::leaf("X")]),
                Hierarchy::node("C", vec![Hierarchy::leaf("X")]),
            ],
        );

        let err = TreeBuilder::new().build(&hierarchy).unwrap_err();
        assert_eq!(err, DomainError::DuplicateNameInTree("X".to_string()));
    }

    #[test]
    fn given_child_named_like_root_when_building_then_fails_with_duplicate() {
        let hierarchy = Hierarchy::node("A", vec![Hierarchy::leaf("A")]);
        let err = TreeBuilder::new().build(&hierarchy).unwrap_err();
        assert_eq!(err, DomainError::DuplicateNameInTree("A".to_string()));
    }

    #[test]
    fn given_builder_when_reused_then_previous_names_are_forgotten() {
        let mut builder = TreeBuilder::new();
        builder.build(&Hierarchy::leaf("A")).unwrap();
        assert!(builder.build(&Hierarchy::leaf("A")).is_ok());
    }

    #[test]
    fn given_notation_when_parsing_via_from_str_then_builds_tree() {
        let tree: CategoryTree = "A ( B C )".parse().unwrap();
        assert_eq!(tree.len(), 3);
        assert!(tree.contains("C"));
    }
}
