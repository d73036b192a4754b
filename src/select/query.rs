//! Search-box query parsing.
//!
//! The select screen's search box accepts operator terms alongside free
//! text: `stars>=4 ruleset=1 sort=artist freedom` filters by rating and
//! ruleset, sorts by artist, and searches for "freedom". Tokens that are
//! not recognized terms stay part of the free-text search.

use thiserror::Error;

use crate::model::Ruleset;

use super::criteria::{Criteria, RatingRange, SortMode};

/// Error raised while parsing a search-box query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid number for `{key}`: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("unknown sort mode: {0}")]
    UnknownSort(String),
}

#[derive(Clone, Copy)]
enum Op {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Criteria {
    /// Parse a search-box query into criteria.
    ///
    /// Operator terms set the user rating range (`stars>4`, `stars<=7`,
    /// `stars=5`), the ruleset filter (`ruleset=1`) and the sort mode
    /// (`sort=artist`); every other token joins the free-text search.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let mut criteria = Criteria::default();
        let mut free: Vec<&str> = Vec::new();
        for token in query.split_whitespace() {
            let handled = match split_operator(token) {
                Some((key, op, value)) => apply_term(&mut criteria, key, op, value)?,
                None => false,
            };
            if !handled {
                free.push(token);
            }
        }
        criteria.search = free.join(" ");
        Ok(criteria)
    }
}

fn split_operator(token: &str) -> Option<(&str, Op, &str)> {
    const OPS: [(&str, Op); 5] = [
        (">=", Op::Ge),
        ("<=", Op::Le),
        (">", Op::Gt),
        ("<", Op::Lt),
        ("=", Op::Eq),
    ];
    for (pattern, op) in OPS {
        if let Some(pos) = token.find(pattern) {
            let key = &token[..pos];
            let value = &token[pos + pattern.len()..];
            if key.is_empty() || value.is_empty() {
                return None;
            }
            return Some((key, op, value));
        }
    }
    None
}

/// Returns Ok(false) when the key is not a recognized term, so the token
/// falls back to free text.
fn apply_term(criteria: &mut Criteria, key: &str, op: Op, value: &str) -> Result<bool, QueryError> {
    match key.to_ascii_lowercase().as_str() {
        "stars" | "rating" => {
            let v: f64 = value.parse().map_err(|_| QueryError::InvalidNumber {
                key: "stars",
                value: value.to_string(),
            })?;
            let range = criteria
                .user_rating_range
                .get_or_insert_with(RatingRange::default);
            match op {
                Op::Gt => {
                    range.min = Some(v);
                    range.min_exclusive = true;
                }
                Op::Ge => {
                    range.min = Some(v);
                    range.min_exclusive = false;
                }
                Op::Lt => {
                    range.max = Some(v);
                    range.max_exclusive = true;
                }
                Op::Le => {
                    range.max = Some(v);
                    range.max_exclusive = false;
                }
                Op::Eq => {
                    range.min = Some(v);
                    range.max = Some(v);
                    range.min_exclusive = false;
                    range.max_exclusive = false;
                }
            }
            Ok(true)
        }
        "ruleset" | "mode" if matches!(op, Op::Eq) => {
            let v: u8 = value.parse().map_err(|_| QueryError::InvalidNumber {
                key: "ruleset",
                value: value.to_string(),
            })?;
            criteria.ruleset = Some(Ruleset(v));
            Ok(true)
        }
        "sort" if matches!(op, Op::Eq) => {
            criteria.sort = match value.to_ascii_lowercase().as_str() {
                "title" => SortMode::Title,
                "artist" => SortMode::Artist,
                "author" | "creator" => SortMode::Author,
                "rating" | "stars" | "difficulty" => SortMode::Rating,
                "date" | "added" => SortMode::DateAdded,
                other => return Err(QueryError::UnknownSort(other.to_string())),
            };
            Ok(true)
        }
        _ => Ok(false),
    }
}
