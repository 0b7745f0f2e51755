//! Database access layer.
//!
//! - Per-invocation sessions (no pooling)
//! - Identifier validation and quoting
//! - Statement builders for the fixed tools
//! - Statement execution and row normalization

pub mod executor;
pub mod identifier;
pub mod session;
pub mod statements;
pub mod types;

pub use executor::{Outcome, Rows};
pub use identifier::{Identifier, quote_identifier};
pub use session::{Session, SessionProvider};
pub use statements::{BindValue, Statement};
