//! Domain layer: notation parser, category tree and prefix counting
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod error;
pub mod notation;
pub mod render;

pub use arena::{CategoryNode, CategoryTree};
pub use builder::{parse_tree, TreeBuilder};
pub use error::{DomainError, DomainResult};
pub use notation::{parse, Hierarchy};
pub use render::{Notation, TreeNodeConvert};
