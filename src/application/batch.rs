//! Batch sessions over the line-oriented question format
//!
//! ```text
//! 9                                   declared category count
//! Animals ( Reptiles Birds ( ... ) )  tree notation
//! 2                                   number of item lines
//! Birds: How do birds fly?            <category><item_separator><text>
//! Reptiles: Why are reptiles green?
//! 1                                   number of query lines
//! Animals How                         <category><query_separator><prefix>
//! ```

use std::path::Path;
use std::str;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{parse_tree, CategoryTree, DomainError};

/// A question attached to a category, with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub line: usize,
    pub category: String,
    pub text: String,
}

/// A prefix query scoped to a category, with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub line: usize,
    pub category: String,
    pub prefix: String,
}

/// A fully parsed batch document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    pub declared_categories: usize,
    pub notation: String,
    pub notation_line: usize,
    pub items: Vec<Item>,
    pub queries: Vec<Query>,
}

/// Parses batch documents and answers their queries.
pub struct BatchRunner<'a> {
    settings: &'a Settings,
}

impl<'a> BatchRunner<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn parse(&self, input: &str) -> ApplicationResult<BatchInput> {
        let mut lines = NumberedLines::new(input);

        let declared_categories = lines.next_count("category count")?;
        let (notation_line, notation) = lines.next_line("tree notation")?;

        let item_count = lines.next_count("item count")?;
        let mut items = Vec::new();
        for _ in 0..item_count {
            let (line, content) = lines.next_line("item line")?;
            let (category, text) =
                split_line(content, &self.settings.item_separator, line, "<category>", "<text>")?;
            items.push(Item {
                line,
                category: category.to_string(),
                text: text.to_string(),
            });
        }

        let query_count = lines.next_count("query count")?;
        let mut queries = Vec::new();
        for _ in 0..query_count {
            let (line, content) = lines.next_line("query line")?;
            let (category, prefix) = split_line(
                content,
                &self.settings.query_separator,
                line,
                "<category>",
                "<prefix>",
            )?;
            queries.push(Query {
                line,
                category: category.to_string(),
                prefix: prefix.to_string(),
            });
        }

        debug!(
            items = items.len(),
            queries = queries.len(),
            "parsed batch input"
        );
        Ok(BatchInput {
            declared_categories,
            notation: notation.to_string(),
            notation_line,
            items,
            queries,
        })
    }

    /// Builds the tree, attaches all items and answers the queries in order.
    #[instrument(level = "debug", skip_all)]
    pub fn run(&self, input: &BatchInput) -> ApplicationResult<Vec<usize>> {
        let tree = self.populate(input)?;
        input
            .queries
            .iter()
            .map(|query| {
                tree.count_with_prefix(&query.category, &query.prefix)
                    .map_err(|e| at_line(query.line, e))
            })
            .collect()
    }

    /// Builds the tree and attaches all items, without answering queries.
    #[instrument(level = "debug", skip_all)]
    pub fn populate(&self, input: &BatchInput) -> ApplicationResult<CategoryTree> {
        let mut tree = parse_tree(&input.notation).map_err(|e| at_line(input.notation_line, e))?;

        if self.settings.verify_category_count && input.declared_categories != tree.len() {
            return Err(ApplicationError::CategoryCountMismatch {
                declared: input.declared_categories,
                actual: tree.len(),
            });
        }

        for item in &input.items {
            tree.add_item(&item.category, item.text.as_str())
                .map_err(|e| at_line(item.line, e))?;
        }
        Ok(tree)
    }

    pub fn run_str(&self, input: &str) -> ApplicationResult<Vec<usize>> {
        let batch = self.parse(input)?;
        self.run(&batch)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn run_file(&self, path: &Path) -> ApplicationResult<Vec<usize>> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ApplicationError::OperationFailed {
                context: format!("read batch input: {}", path.display()),
                source: Box::new(e),
            })?;
        self.run_str(&content)
    }
}

fn at_line(line: usize, source: DomainError) -> ApplicationError {
    ApplicationError::DomainAtLine { line, source }
}

fn split_line<'s>(
    content: &'s str,
    separator: &str,
    line: usize,
    left: &str,
    right: &str,
) -> ApplicationResult<(&'s str, &'s str)> {
    content.split_once(separator).ok_or_else(|| {
        ApplicationError::invalid_input(
            line,
            format!("expected '{left}{separator}{right}', found '{content}'"),
        )
    })
}

/// Lines with 1-based numbers, reporting what was expected when input runs out.
struct NumberedLines<'a> {
    inner: std::iter::Enumerate<str::Lines<'a>>,
    consumed: usize,
}

impl<'a> NumberedLines<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            inner: input.lines().enumerate(),
            consumed: 0,
        }
    }

    fn next_line(&mut self, expected: &str) -> ApplicationResult<(usize, &'a str)> {
        match self.inner.next() {
            Some((idx, content)) => {
                self.consumed = idx + 1;
                Ok((idx + 1, content))
            }
            None => Err(ApplicationError::invalid_input(
                self.consumed + 1,
                format!("expected {expected}, found end of input"),
            )),
        }
    }

    fn next_count(&mut self, expected: &str) -> ApplicationResult<usize> {
        let (line, content) = self.next_line(expected)?;
        content.trim().parse().map_err(|e| {
            ApplicationError::invalid_input(
                line,
                format!("invalid {expected} '{}': {e}", content.trim()),
            )
        })
    }
}
