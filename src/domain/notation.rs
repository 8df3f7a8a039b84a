//! Parser for the parenthesized category notation.
//!
//! ```text
//! tree  := node EOF
//! node  := NAME group?
//! group := "(" node+ ")"
//! NAME  := \w+
//! ```
//!
//! Whitespace between tokens is insignificant, so `A(B C)` and `A ( B C )`
//! describe the same hierarchy.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<open>\()|(?P<close>\))|(?P<name>\w+)|(?P<invalid>[^\s()\w]+)").unwrap()
});

/// Parsed shape of a category tree, before any items are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    pub name: String,
    pub children: Vec<Hierarchy>,
}

impl Hierarchy {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn node(name: impl Into<String>, children: Vec<Hierarchy>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of categories in this hierarchy, itself included.
    pub fn category_count(&self) -> usize {
        let mut stack = vec![self];
        let mut count = 0;
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.children);
        }
        count
    }
}

impl Drop for Hierarchy {
    fn drop(&mut self) {
        // Flatten before dropping so deep chains don't recurse.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Name(&'a str),
    Open,
    Close,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "'{name}'"),
            Token::Open => f.write_str("'('"),
            Token::Close => f.write_str("')'"),
        }
    }
}

/// A token together with its byte offset in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub offset: usize,
    pub token: Token<'a>,
}

/// Splits the notation into name and parenthesis tokens.
///
/// Fails on the first run of characters that is neither whitespace, a
/// parenthesis nor a word character.
#[instrument(level = "trace")]
pub fn tokenize(input: &str) -> DomainResult<Vec<Spanned<'_>>> {
    let mut tokens = Vec::new();
    for caps in TOKEN_REGEX.captures_iter(input) {
        let token = if let Some(name) = caps.name("name") {
            Spanned {
                offset: name.start(),
                token: Token::Name(name.as_str()),
            }
        } else if let Some(open) = caps.name("open") {
            Spanned {
                offset: open.start(),
                token: Token::Open,
            }
        } else if let Some(close) = caps.name("close") {
            Spanned {
                offset: close.start(),
                token: Token::Close,
            }
        } else if let Some(invalid) = caps.name("invalid") {
            return Err(DomainError::malformed(
                invalid.start(),
                format!("invalid characters '{}'", invalid.as_str()),
            ));
        } else {
            continue;
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// Parses a complete notation string into a single rooted hierarchy.
///
/// Groups that are still open live on an explicit stack, so nesting depth is
/// bounded by memory rather than by the call stack.
#[instrument(level = "debug")]
pub fn parse(input: &str) -> DomainResult<Hierarchy> {
    let tokens = tokenize(input)?;
    // (category whose group is open, offset of its '(')
    let mut open: Vec<(Hierarchy, usize)> = Vec::new();
    let mut pos = 0;

    loop {
        let name = match (tokens.get(pos).copied(), open.last()) {
            (
                Some(Spanned {
                    token: Token::Name(name),
                    ..
                }),
                _,
            ) => name,
            (
                Some(Spanned {
                    offset,
                    token: Token::Close,
                }),
                Some((parent, _)),
            ) if parent.is_leaf() => {
                return Err(DomainError::malformed(
                    offset,
                    format!("empty child group for '{}'", parent.name),
                ))
            }
            (Some(Spanned { offset, token }), _) => {
                return Err(DomainError::malformed(
                    offset,
                    format!("expected category name, found {token}"),
                ))
            }
            (None, _) => {
                return Err(DomainError::malformed(
                    input.len(),
                    "expected category name, found end of input",
                ))
            }
        };
        pos += 1;

        let mut done = Hierarchy::leaf(name);
        if let Some(Spanned {
            offset,
            token: Token::Open,
        }) = tokens.get(pos).copied()
        {
            pos += 1;
            open.push((done, offset));
            continue;
        }

        // `done` is complete: attach it and close every group that ends here
        loop {
            let Some((mut parent, open_at)) = open.pop() else {
                if let Some(Spanned { offset, token }) = tokens.get(pos) {
                    return Err(DomainError::malformed(
                        *offset,
                        format!("unexpected {token} after root category '{}'", done.name),
                    ));
                }
                debug!(root = %done.name, categories = done.category_count(), "parsed notation");
                return Ok(done);
            };
            parent.children.push(done);
            match tokens.get(pos) {
                Some(Spanned {
                    token: Token::Close,
                    ..
                }) => {
                    pos += 1;
                    done = parent;
                }
                Some(_) => {
                    open.push((parent, open_at));
                    break;
                }
                None => {
                    return Err(DomainError::malformed(
                        open_at,
                        format!("unclosed '(' after '{}'", parent.name),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn given_nested_notation_when_parsing_then_preserves_shape_and_order() {
        let parsed =
            parse("Animals ( Reptiles Birds ( Eagles Pigeons Crows ) Mammals ( Bears ( Grizzly White ) ) )")
                .unwrap();

        let expected = Hierarchy::node(
            "Animals",
            vec![
                Hierarchy::leaf("Reptiles"),
                Hierarchy::node(
                    "Birds",
                    vec![
                        Hierarchy::leaf("Eagles"),
                        Hierarchy::leaf("Pigeons"),
                        Hierarchy::leaf("Crows"),
                    ],
                ),
                Hierarchy::node(
                    "Mammals",
                    vec![Hierarchy::node(
                        "Bears",
                        vec![Hierarchy::leaf("Grizzly"), Hierarchy::leaf("White")],
                    )],
                ),
            ],
        );
        assert_eq!(parsed, expected);
        assert_eq!(parsed.category_count(), 9);
    }

    #[test]
    fn given_single_name_when_parsing_then_returns_leaf_root() {
        let parsed = parse("Animals").unwrap();
        assert_eq!(parsed, Hierarchy::leaf("Animals"));
        assert!(parsed.is_leaf());
    }

    #[rstest]
    #[case("A(B C(D))")]
    #[case("  A ( B   C ( D ) )  \n")]
    #[case("A\t(\tB\nC (D))")]
    fn given_irregular_whitespace_when_parsing_then_same_hierarchy(#[case] input: &str) {
        let expected = Hierarchy::node(
            "A",
            vec![
                Hierarchy::leaf("B"),
                Hierarchy::node("C", vec![Hierarchy::leaf("D")]),
            ],
        );
        assert_eq!(parse(input).unwrap(), expected);
    }

    #[rstest]
    #[case::empty("", 0)]
    #[case::blank("   ", 3)]
    #[case::unclosed("A ( B", 2)]
    #[case::stray_close("A )", 2)]
    #[case::sibling_of_root("A B", 2)]
    #[case::empty_group("A ( )", 4)]
    #[case::group_without_name("( A )", 0)]
    #[case::nested_open("A ( ( B ) )", 4)]
    #[case::invalid_char("A ( B-C )", 5)]
    fn given_malformed_notation_when_parsing_then_reports_offset(
        #[case] input: &str,
        #[case] position: usize,
    ) {
        match parse(input) {
            Err(DomainError::MalformedNotation { position: p, .. }) => assert_eq!(p, position),
            other => panic!("expected MalformedNotation for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn given_notation_when_tokenizing_then_tokens_carry_offsets() {
        let tokens = tokenize("A (B_1)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Spanned {
                    offset: 0,
                    token: Token::Name("A")
                },
                Spanned {
                    offset: 2,
                    token: Token::Open
                },
                Spanned {
                    offset: 3,
                    token: Token::Name("B_1")
                },
                Spanned {
                    offset: 6,
                    token: Token::Close
                },
            ]
        );
    }
}
