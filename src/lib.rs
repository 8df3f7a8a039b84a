//! Category trees built from parenthesized notation, with subtree-scoped
//! prefix counting of the questions attached to them.
//!
//! ```
//! use qtree::parse_tree;
//!
//! let mut tree = parse_tree("Animals ( Reptiles Mammals ( Bears ) )").unwrap();
//! tree.add_item("Bears", "Why bears are so big?").unwrap();
//! assert_eq!(tree.count_with_prefix("Mammals", "Why").unwrap(), 1);
//! assert_eq!(tree.to_string(), "Animals ( Reptiles Mammals ( Bears ) )");
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

pub use domain::{parse_tree, CategoryTree, DomainError, DomainResult};
