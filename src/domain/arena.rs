use std::collections::HashSet;
use std::ops;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};

/// One category in the tree.
#[derive(Debug)]
pub struct CategoryNode {
    name: String,
    /// Index of parent node in the arena, None for the root
    parent: Option<Index>,
    /// Indices of child nodes, in notation order
    children: Vec<Index>,
    /// Texts attached directly to this category
    items: Vec<String>,
    /// Own name plus every descendant's name
    descendant_names: HashSet<String>,
}

impl CategoryNode {
    fn new(name: String, parent: Option<Index>) -> Self {
        let descendant_names = HashSet::from([name.clone()]);
        Self {
            name,
            parent,
            children: Vec::new(),
            items: Vec::new(),
            descendant_names,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    pub fn children(&self) -> &[Index] {
        &self.children
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn descendant_names(&self) -> &HashSet<String> {
        &self.descendant_names
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.descendant_names.contains(name)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of items attached directly to this node that start with `prefix`.
    pub fn count_matching(&self, prefix: &str) -> usize {
        self.items
            .iter()
            .filter(|item| item.starts_with(prefix))
            .count()
    }
}

/// Arena-based category tree.
///
/// The shape is fixed once [`TreeBuilder`](crate::domain::TreeBuilder) returns it;
/// afterwards only the item lists grow. Nodes are never removed, so every
/// index handed out by a tree stays valid for that tree's lifetime.
#[derive(Debug)]
pub struct CategoryTree {
    arena: Arena<CategoryNode>,
    root: Index,
}

impl CategoryTree {
    pub(crate) fn with_root(name: String) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(CategoryNode::new(name, None));
        Self { arena, root }
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn insert_child(&mut self, parent: Index, name: String) -> Index {
        let child = self.arena.insert(CategoryNode::new(name, Some(parent)));
        self.arena[parent].children.push(child);
        child
    }

    /// Recomputes every node's `descendant_names` bottom-up.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn index_descendant_names(&mut self) {
        let order: Vec<Index> = self.iter_postorder().map(|(idx, _)| idx).collect();
        for idx in order {
            let mut names = HashSet::from([self.arena[idx].name.clone()]);
            for &child in &self.arena[idx].children {
                names.extend(self.arena[child].descendant_names.iter().cloned());
            }
            self.arena[idx].descendant_names = names;
        }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get_node(&self, idx: Index) -> Option<&CategoryNode> {
        self.arena.get(idx)
    }

    /// Number of categories in the tree.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// A tree always has its root category.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arena[self.root].contains_name(name)
    }

    /// Locates a category by walking down from the root, at each level
    /// entering the only child whose subtree knows the name.
    #[instrument(level = "trace", skip(self))]
    pub fn find_node(&self, name: &str) -> DomainResult<Index> {
        let mut current = self.root;
        loop {
            let node = &self.arena[current];
            if node.name == name {
                return Ok(current);
            }
            current = node
                .children
                .iter()
                .copied()
                .find(|&child| self.arena[child].contains_name(name))
                .ok_or_else(|| DomainError::UnknownCategory(name.to_string()))?;
        }
    }

    /// Appends `text` to the items of the category called `name`.
    #[instrument(level = "debug", skip(self, text))]
    pub fn add_item(&mut self, name: &str, text: impl Into<String>) -> DomainResult<()> {
        let idx = self.find_node(name)?;
        let text = text.into();
        debug!(category = name, item = %text, "adding item");
        self.arena[idx].items.push(text);
        Ok(())
    }

    /// Counts the items anywhere in the subtree of `name` that start with `prefix`.
    #[instrument(level = "debug", skip(self))]
    pub fn count_with_prefix(&self, name: &str, prefix: &str) -> DomainResult<usize> {
        let idx = self.find_node(name)?;
        let count = self.count_in_subtree(idx, prefix);
        debug!(count, "counted matching items");
        Ok(count)
    }

    /// Counts matching items in the subtree rooted at `idx`.
    pub fn count_in_subtree(&self, idx: Index, prefix: &str) -> usize {
        self.iter_subtree(idx)
            .map(|(_, node)| node.count_matching(prefix))
            .sum()
    }

    /// The matching items themselves, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn matching_items(&self, name: &str, prefix: &str) -> DomainResult<Vec<&str>> {
        let idx = self.find_node(name)?;
        Ok(self
            .iter_subtree(idx)
            .flat_map(|(_, node)| {
                node.items
                    .iter()
                    .filter(move |item| item.starts_with(prefix))
                    .map(String::as_str)
            })
            .collect())
    }

    /// Category names from the root down to `name`, both included.
    #[instrument(level = "debug", skip(self))]
    pub fn path_to(&self, name: &str) -> DomainResult<Vec<&str>> {
        let mut current = Some(self.find_node(name)?);
        let mut path = Vec::new();
        while let Some(idx) = current {
            let node = &self.arena[idx];
            path.push(node.name());
            current = node.parent;
        }
        path.reverse();
        Ok(path)
    }

    /// Total number of items attached anywhere in the tree.
    pub fn item_count(&self) -> usize {
        self.arena.iter().map(|(_, node)| node.items.len()).sum()
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        self.iter_subtree(self.root)
    }

    pub fn iter_subtree(&self, idx: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, idx)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut stack = vec![(self.root, 1)];
        let mut max_depth = 0;
        while let Some((idx, level)) = stack.pop() {
            max_depth = max_depth.max(level);
            stack.extend(self.arena[idx].children.iter().map(|&child| (child, level + 1)));
        }
        max_depth
    }

    /// Names of all categories without children, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.name())
            .collect()
    }
}

impl ops::Index<Index> for CategoryTree {
    type Output = CategoryNode;

    fn index(&self, idx: Index) -> &CategoryNode {
        &self.arena[idx]
    }
}

/// Pre-order, left-to-right traversal of a subtree.
pub struct TreeIterator<'a> {
    tree: &'a CategoryTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a CategoryTree, start: Index) -> Self {
        let stack = if tree.arena.contains(start) {
            vec![start]
        } else {
            Vec::new()
        };
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a CategoryNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.tree.get_node(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        self.stack.extend(node.children.iter().rev().copied());
        Some((current_idx, node))
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a CategoryTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a CategoryTree) -> Self {
        Self {
            tree,
            stack: vec![(tree.root, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a CategoryNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CategoryTree {
        // A ( B ( D ) C )
        let mut tree = CategoryTree::with_root("A".to_string());
        let b = tree.insert_child(tree.root(), "B".to_string());
        tree.insert_child(tree.root(), "C".to_string());
        tree.insert_child(b, "D".to_string());
        tree.index_descendant_names();
        tree
    }

    #[test]
    fn given_tree_when_iterating_then_visits_pre_order() {
        let tree = sample();
        let names: Vec<&str> = tree.iter().map(|(_, node)| node.name()).collect();
        assert_eq!(names, vec!["A", "B", "D", "C"]);
    }

    #[test]
    fn given_tree_when_iterating_postorder_then_children_come_first() {
        let tree = sample();
        let names: Vec<&str> = tree.iter_postorder().map(|(_, node)| node.name()).collect();
        assert_eq!(names, vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn given_indexed_tree_when_inspecting_then_descendant_names_are_unions() {
        let tree = sample();
        let b = tree.find_node("B").unwrap();
        let expected: HashSet<String> = ["B", "D"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tree[b].descendant_names(), &expected);
        assert_eq!(tree[tree.root()].descendant_names().len(), 4);
    }

    #[test]
    fn given_tree_when_measuring_then_reports_depth_and_leaves() {
        let tree = sample();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_names(), vec!["D", "C"]);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn given_nested_category_when_resolving_path_then_lists_ancestors() {
        let tree = sample();
        assert_eq!(tree.path_to("D").unwrap(), vec!["A", "B", "D"]);
        assert_eq!(tree.path_to("A").unwrap(), vec!["A"]);
    }

    #[test]
    fn given_items_when_counting_subtree_then_sums_all_levels() {
        let mut tree = sample();
        tree.add_item("A", "Why A?").unwrap();
        tree.add_item("D", "Why D?").unwrap();
        tree.add_item("C", "How C?").unwrap();
        assert_eq!(tree.count_in_subtree(tree.root(), "Why"), 2);
        assert_eq!(tree.item_count(), 3);
    }
}
