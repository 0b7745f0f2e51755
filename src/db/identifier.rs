//! Identifier validation and quoting.
//!
//! Table names arrive from the agent and are untrusted. Any name MySQL can
//! store as a quoted identifier is accepted (`order-items`, `my table`,
//! `user.log`); the name then only ever reaches statement text through
//! [`quote_identifier`], which doubles embedded backticks so the whole name
//! stays one identifier. Validation rejects what cannot be a MySQL name at
//! all. Column names read back from the engine go through the same quoting.

use crate::error::{DbError, DbResult};
use std::fmt;

/// MySQL's identifier length limit for tables and columns.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// A validated schema object name (table or column).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validate an untrusted name.
    ///
    /// Rejects empty names, names over 64 characters, NUL, characters
    /// outside the Basic Multilingual Plane and trailing spaces. These are
    /// the names MySQL itself refuses, even quoted.
    pub fn parse(raw: &str) -> DbResult<Self> {
        if raw.is_empty() {
            return Err(DbError::validation("Table name cannot be empty"));
        }

        let len = raw.chars().count();
        if len > MAX_IDENTIFIER_LEN {
            return Err(DbError::validation(format!(
                "Identifier is {} characters long; the maximum is {}",
                len, MAX_IDENTIFIER_LEN
            )));
        }

        if let Some(bad) = raw.chars().find(|c| !is_identifier_char(*c)) {
            return Err(DbError::validation(format!(
                "Identifier '{}' contains character {:?}, which MySQL does not allow in names",
                raw.escape_default(),
                bad
            )));
        }

        if raw.ends_with(' ') {
            return Err(DbError::validation(format!(
                "Identifier '{}' cannot end with a space",
                raw
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form, safe to embed in statement text.
    pub fn quoted(&self) -> String {
        quote_identifier(&self.0)
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

// Quoted identifiers may hold any BMP character except U+0000.
fn is_identifier_char(c: char) -> bool {
    ('\u{1}'..='\u{FFFF}').contains(&c)
}

/// Quote any name with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
