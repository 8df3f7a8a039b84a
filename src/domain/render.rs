//! Textual forms of a category tree: the canonical notation and a `termtree` view.

use std::collections::HashMap;
use std::fmt;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::CategoryTree;
use crate::domain::error::DomainResult;

/// Canonical notation of the subtree rooted at one node.
///
/// Leaves render as their bare name, inner nodes as `name ( child ... )`.
/// Items are not part of the notation.
pub struct Notation<'a> {
    tree: &'a CategoryTree,
    idx: Index,
}

impl fmt::Display for Notation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tree.get_node(self.idx).is_none() {
            return Ok(());
        }
        // None marks the ')' that closes a group
        let mut stack = vec![Some(self.idx)];
        let mut first = true;
        while let Some(entry) = stack.pop() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            let Some(idx) = entry else {
                f.write_str(")")?;
                continue;
            };
            let node = &self.tree[idx];
            f.write_str(node.name())?;
            if !node.is_leaf() {
                f.write_str(" (")?;
                stack.push(None);
                stack.extend(node.children().iter().rev().map(|&child| Some(child)));
            }
        }
        Ok(())
    }
}

impl CategoryTree {
    pub fn notation(&self, idx: Index) -> Notation<'_> {
        Notation { tree: self, idx }
    }

    /// Notation of the subtree rooted at the category called `name`.
    #[instrument(level = "debug", skip(self))]
    pub fn subtree_notation(&self, name: &str) -> DomainResult<String> {
        let idx = self.find_node(name)?;
        Ok(self.notation(idx).to_string())
    }
}

impl fmt::Display for CategoryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notation(self.root()))
    }
}

pub trait TreeNodeConvert {
    /// Builds a `termtree` view labelled with item counts.
    ///
    /// Construction is iterative, but `termtree::Tree` drops its leaves
    /// recursively, so views of trees thousands of levels deep need a
    /// correspondingly large stack.
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for CategoryTree {
    fn to_tree_string(&self) -> Tree<String> {
        fn label(tree: &CategoryTree, idx: Index) -> String {
            let node = &tree[idx];
            match node.items().len() {
                0 => node.name().to_string(),
                n => format!("{} [{}]", node.name(), n),
            }
        }

        // Post-order: every child's subtree is finished before its parent is.
        let mut finished: HashMap<Index, Tree<String>> = HashMap::new();
        for (idx, node) in self.iter_postorder() {
            let leaves = node
                .children()
                .iter()
                .filter_map(|child| finished.remove(child));
            let subtree = Tree::new(label(self, idx)).with_leaves(leaves);
            finished.insert(idx, subtree);
        }
        finished
            .remove(&self.root())
            .unwrap_or_else(|| Tree::new(label(self, self.root())))
    }
}
