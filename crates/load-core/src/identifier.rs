//! Validated SQL identifiers.
//!
//! Table and column names are interpolated into DDL and DML text, so every
//! name has to pass through [`Identifier::new`] first. Only unquoted,
//! ASCII identifiers are accepted.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// PostgreSQL truncates identifiers longer than `NAMEDATALEN - 1` bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Reasons a name is rejected as an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier '{name}' is {len} bytes long, the limit is {MAX_IDENTIFIER_LEN}")]
    TooLong { name: String, len: usize },

    #[error("identifier '{name}' must start with a letter or underscore")]
    InvalidStart { name: String },

    #[error("identifier '{name}' contains invalid character {ch:?} at position {position}")]
    InvalidCharacter {
        name: String,
        ch: char,
        position: usize,
    },
}

/// A table or column name matching `[A-Za-z_][A-Za-z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Result<Self, IdentifierError> {
        let name = name.into();
        let mut chars = name.chars();

        let first = chars.next().ok_or(IdentifierError::Empty)?;
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(IdentifierError::InvalidStart { name });
        }

        if let Some((position, ch)) = name
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(IdentifierError::InvalidCharacter {
                name: name.clone(),
                ch,
                position,
            });
        }

        if name.len() > MAX_IDENTIFIER_LEN {
            let len = name.len();
            return Err(IdentifierError::TooLong { name, len });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unquoted identifiers are case-insensitive in the store; this is the
    /// folded form used to compare them.
    pub fn folded(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Case-insensitive comparison, matching how the store resolves unquoted names.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
