//! Read-only lookups. Each one must resolve: a miss is an error diagnostic.

pub mod agent_tool;
pub mod mcp_server_tool;
pub mod team;
