//! `archestra_agent_tool` data source: find an agent's tool assignment by tool
//! name.

use archestra_client::{AgentTool, ListAgentToolsParams};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::diag::{Diagnostic, Diagnostics};
use crate::framework::{DataSource, OperationContext};
use crate::resources::agent_tool::LOOKUP_LIMIT;
use crate::resources::{check, expect_body};
use crate::schema::{Attribute, Schema};
use crate::value::{parse_uuid, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentToolLookup {
    pub id: Value<String>,
    pub agent_id: Value<String>,
    pub tool_name: Value<String>,
    pub tool_id: Value<String>,
    pub allow_usage_when_untrusted_data_is_present: Value<bool>,
    pub tool_result_treatment: Value<String>,
    pub response_modifier_template: Value<String>,
}

/// First row bound to `agent_id` whose tool is called `tool_name`.
pub(crate) fn find_agent_tool(rows: Vec<AgentTool>, agent_id: &str, tool_name: &str) -> Option<AgentTool> {
    rows.into_iter()
        .find(|row| row.agent.id == agent_id && row.tool.name == tool_name)
}

pub struct AgentToolDataSource;

#[async_trait]
impl DataSource for AgentToolDataSource {
    type Model = AgentToolLookup;

    fn type_name(&self) -> &'static str {
        "archestra_agent_tool"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Looks up a tool assigned to an agent by the tool's name.",
            vec![
                Attribute::string("id").computed().describe("Agent tool relationship identifier"),
                Attribute::string("agent_id").required().describe("The agent to search"),
                Attribute::string("tool_name").required().describe("Name of the assigned tool"),
                Attribute::string("tool_id").computed(),
                Attribute::bool("allow_usage_when_untrusted_data_is_present").computed(),
                Attribute::string("tool_result_treatment").computed(),
                Attribute::string("response_modifier_template").computed(),
            ],
        )
    }

    async fn read(
        &self,
        ctx: OperationContext<'_>,
        config: AgentToolLookup,
        diags: &mut Diagnostics,
    ) -> Option<AgentToolLookup> {
        let agent_id = check(parse_uuid(&config.agent_id, "agent_id", "Agent"), diags);
        let tool_name = check(config.tool_name.required("tool_name"), diags);
        let (agent_id, tool_name) = (agent_id?, tool_name?);

        let params = ListAgentToolsParams {
            agent_id: Some(agent_id),
            limit: Some(LOOKUP_LIMIT),
        };
        let rows = expect_body(
            "read agent tools",
            ctx.client.list_agent_tools(ctx.scope, &params, &[]).await,
            diags,
        )?
        .into_vec();

        let Some(row) = find_agent_tool(rows, &agent_id.to_string(), &tool_name) else {
            diags.push(Diagnostic::error(
                "Not Found",
                format!("Tool '{tool_name}' not found for agent {agent_id}"),
            ));
            return None;
        };
        Some(AgentToolLookup {
            id: Value::Known(row.id.to_string()),
            agent_id: config.agent_id,
            tool_name: config.tool_name,
            tool_id: Value::Known(row.tool.id),
            allow_usage_when_untrusted_data_is_present: Value::Known(row.allow_usage_when_untrusted_data_is_present),
            tool_result_treatment: Value::Known(row.tool_result_treatment),
            response_modifier_template: Value::from_option(row.response_modifier_template),
        })
    }
}

#[cfg(test)]
mod tests {
    use archestra_client::{AgentRef, ToolRef};
    use uuid::Uuid;

    use super::*;

    fn row(agent: &str, tool: &str) -> AgentTool {
        AgentTool {
            id: Uuid::new_v4(),
            agent: AgentRef {
                id: agent.to_string(),
                name: None,
            },
            tool: ToolRef {
                id: Uuid::new_v4().to_string(),
                name: tool.to_string(),
            },
            allow_usage_when_untrusted_data_is_present: false,
            tool_result_treatment: "untrusted".to_string(),
            response_modifier_template: None,
        }
    }

    #[test]
    fn matches_on_agent_and_tool_name() {
        let rows = vec![row("a1", "read_file"), row("a2", "write_file"), row("a2", "read_file")];
        let expected = rows[2].id;
        let found = find_agent_tool(rows, "a2", "read_file").unwrap();
        assert_eq!(found.id, expected);
    }

    #[test]
    fn misses_when_only_one_side_matches() {
        let rows = vec![row("a1", "write_file"), row("a2", "read_file")];
        assert!(find_agent_tool(rows, "a1", "read_file").is_none());
    }
}
