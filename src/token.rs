//! Button tokens
//!
//! A button press carries a short token naming the node to open:
//! `"1_<node id>"` in the main tree, `"2_<node id>_<requester id>"` in a
//! requester's search results.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::tree::NodeId;

/// Identifies whoever a search result tree belongs to (chat id)
pub type RequesterId = i64;

const NORMAL_TAG: u8 = 1;
const SEARCH_TAG: u8 = 2;
const DELIMITER: char = '_';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Unknown token type: {0}")]
    UnknownType(String),

    #[error("Expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("Invalid token field: {0:?}")]
    InvalidField(String),
}

/// A node to open on a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Target {
    Normal { id: NodeId },
    Search { id: NodeId, requester: RequesterId },
}

impl Target {
    pub fn id(&self) -> NodeId {
        match self {
            Target::Normal { id } | Target::Search { id, .. } => *id,
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Normal { id } => write!(f, "{}{}{}", NORMAL_TAG, DELIMITER, id),
            Target::Search { id, requester } => {
                write!(f, "{}{}{}{}{}", SEARCH_TAG, DELIMITER, id, DELIMITER, requester)
            }
        }
    }
}

fn all_digits(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

fn parse_node_id(field: &str) -> Result<NodeId, TokenError> {
    if !all_digits(field) {
        return Err(TokenError::InvalidField(field.to_string()));
    }
    field
        .parse()
        .map(NodeId)
        .map_err(|_| TokenError::InvalidField(field.to_string()))
}

/// Chat ids of groups are negative, so a leading '-' is accepted here
fn parse_requester(field: &str) -> Result<RequesterId, TokenError> {
    if !all_digits(field.strip_prefix('-').unwrap_or(field)) {
        return Err(TokenError::InvalidField(field.to_string()));
    }
    field
        .parse()
        .map_err(|_| TokenError::InvalidField(field.to_string()))
}

impl FromStr for Target {
    type Err = TokenError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = token.split(DELIMITER).collect();
        let expect = |expected: usize| {
            if fields.len() == expected {
                Ok(())
            } else {
                Err(TokenError::FieldCount {
                    expected,
                    found: fields.len(),
                })
            }
        };

        let tag = fields[0];
        let tag_value = if all_digits(tag) { tag.parse::<u8>().ok() } else { None };

        match tag_value {
            Some(NORMAL_TAG) => {
                expect(2)?;
                Ok(Target::Normal {
                    id: parse_node_id(fields[1])?,
                })
            }
            Some(SEARCH_TAG) => {
                expect(3)?;
                Ok(Target::Search {
                    id: parse_node_id(fields[1])?,
                    requester: parse_requester(fields[2])?,
                })
            }
            _ => Err(TokenError::UnknownType(tag.to_string())),
        }
    }
}

/// Where a node view came from; decides which token its buttons carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeScope {
    Main,
    Search(RequesterId),
}

impl TreeScope {
    pub fn target(&self, id: NodeId) -> Target {
        match self {
            TreeScope::Main => Target::Normal { id },
            TreeScope::Search(requester) => Target::Search {
                id,
                requester: *requester,
            },
        }
    }
}
