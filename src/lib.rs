//! naturalquery
//!
//! An MCP (Model Context Protocol) server that lets natural-language agents
//! explore and query one MySQL database through a fixed set of tools.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{DbError, DbResult};
pub use mcp::NaturalQueryService;
