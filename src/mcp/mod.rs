//! MCP server integration module.
//!
//! Bridges the MCP protocol and the MySQL tool handlers using the rmcp
//! framework.

pub mod service;

pub use service::NaturalQueryService;
