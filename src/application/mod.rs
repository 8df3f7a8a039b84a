//! Application layer: batch sessions driving the category tree
//!
//! This layer turns line-oriented input into domain calls and collects answers.

pub mod batch;
pub mod error;

pub use batch::{BatchInput, BatchRunner, Item, Query};
pub use error::{ApplicationError, ApplicationResult};
