//! `archestra_mcp_server_tool` data source: find a tool an MCP server exposes.

use archestra_client::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::diag::{Diagnostic, Diagnostics};
use crate::framework::{DataSource, OperationContext};
use crate::resources::{check, expect_body};
use crate::schema::{Attribute, Schema};
use crate::value::{parse_uuid, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpServerToolLookup {
    pub id: Value<String>,
    pub mcp_server_id: Value<String>,
    pub name: Value<String>,
    pub description: Value<String>,
}

/// Tools without a server never match.
pub(crate) fn find_server_tool(tools: Vec<Tool>, server_id: &str, name: &str) -> Option<Tool> {
    tools.into_iter().find(|tool| {
        tool.name == name && tool.mcp_server.as_ref().is_some_and(|server| server.id == server_id)
    })
}

pub struct McpServerToolDataSource;

#[async_trait]
impl DataSource for McpServerToolDataSource {
    type Model = McpServerToolLookup;

    fn type_name(&self) -> &'static str {
        "archestra_mcp_server_tool"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Looks up a tool exposed by an MCP server.",
            vec![
                Attribute::string("id").computed().describe("Tool identifier"),
                Attribute::string("mcp_server_id").required().describe("The MCP server exposing the tool"),
                Attribute::string("name").required().describe("Tool name"),
                Attribute::string("description").computed(),
            ],
        )
    }

    async fn read(
        &self,
        ctx: OperationContext<'_>,
        config: McpServerToolLookup,
        diags: &mut Diagnostics,
    ) -> Option<McpServerToolLookup> {
        let server_id = check(parse_uuid(&config.mcp_server_id, "mcp_server_id", "MCP Server"), diags);
        let name = check(config.name.required("name"), diags);
        let (server_id, name) = (server_id?, name?);

        let tools = expect_body("read tools", ctx.client.list_tools(ctx.scope, &[]).await, diags)?.into_vec();
        let Some(tool) = find_server_tool(tools, &server_id.to_string(), &name) else {
            diags.push(Diagnostic::error(
                "Not Found",
                format!("Tool '{name}' not found for MCP server {server_id}"),
            ));
            return None;
        };
        Some(McpServerToolLookup {
            id: Value::Known(tool.id.to_string()),
            description: Value::from_option(tool.description),
            ..config
        })
    }
}

#[cfg(test)]
mod tests {
    use archestra_client::McpServerRef;
    use uuid::Uuid;

    use super::*;

    fn tool(name: &str, server: Option<&str>) -> Tool {
        Tool {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            mcp_server: server.map(|id| McpServerRef {
                id: id.to_string(),
                name: None,
            }),
        }
    }

    #[test]
    fn skips_tools_without_a_server() {
        let tools = vec![tool("search", None), tool("search", Some("s1"))];
        let found = find_server_tool(tools, "s1", "search").unwrap();
        assert!(found.mcp_server.is_some());
    }

    #[test]
    fn requires_the_same_server() {
        assert!(find_server_tool(vec![tool("search", Some("s2"))], "s1", "search").is_none());
    }
}
