//! `archestra_agent_tool`: assigns a tool to an agent and configures how the
//! agent treats its results.
//!
//! The resource id is the composite `agent_id:tool_id`; the relationship row's
//! own UUID is exposed as `agent_tool_id`. Create and read locate the row by
//! listing the agent's tools, since assignment does not return it.

use std::str::FromStr;

use archestra_client::{AgentTool, ListAgentToolsParams, ToolResultTreatment, UpdateAgentTool};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{check, expect_body, expect_deleted, expect_success, fetch, Fetched};
use crate::diag::{AttributePath, Diagnostic, Diagnostics};
use crate::framework::{OperationContext, Resource};
use crate::schema::{Attribute, Schema};
use crate::value::{parse_uuid, parse_uuid_str, Value};

/// Page size used when locating an agent's assignment.
pub const LOOKUP_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentToolModel {
    pub id: Value<String>,
    pub agent_tool_id: Value<String>,
    pub agent_id: Value<String>,
    pub tool_id: Value<String>,
    pub allow_usage_when_untrusted_data_is_present: Value<bool>,
    pub tool_result_treatment: Value<String>,
    pub response_modifier_template: Value<String>,
}

impl AgentToolModel {
    fn from_server(row: AgentTool, agent_id: Uuid, tool_id: Uuid) -> Self {
        Self {
            id: Value::Known(composite_id(agent_id, tool_id)),
            agent_tool_id: Value::Known(row.id.to_string()),
            agent_id: Value::Known(agent_id.to_string()),
            tool_id: Value::Known(tool_id.to_string()),
            allow_usage_when_untrusted_data_is_present: Value::Known(row.allow_usage_when_untrusted_data_is_present),
            tool_result_treatment: Value::Known(row.tool_result_treatment),
            response_modifier_template: Value::from_option(row.response_modifier_template),
        }
    }
}

pub fn composite_id(agent_id: Uuid, tool_id: Uuid) -> String {
    format!("{agent_id}:{tool_id}")
}

/// The two halves of `agent_id:tool_id`, or `None` unless there are exactly two.
fn split_composite_id(raw: &str) -> Option<(&str, &str)> {
    let mut parts = raw.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(agent), Some(tool), None) => Some((agent, tool)),
        _ => None,
    }
}

/// Split `agent_id:tool_id` into its two UUIDs.
pub fn parse_composite_id(raw: &str) -> Result<(Uuid, Uuid), Diagnostic> {
    let (agent, tool) = split_composite_id(raw).ok_or_else(|| {
        Diagnostic::error(
            "Unexpected Import Identifier",
            format!("Expected import identifier with format: agent_id:tool_id. Got: {raw}"),
        )
    })?;
    Ok((parse_uuid_str(agent, "Agent")?, parse_uuid_str(tool, "Tool")?))
}

/// Configuration fields that are set in `plan`. Unset computed fields are left
/// to the server.
fn configuration(plan: &AgentToolModel, diags: &mut Diagnostics) -> Option<UpdateAgentTool> {
    let tool_result_treatment = match plan.tool_result_treatment.as_str() {
        Some(raw) => match ToolResultTreatment::from_str(raw) {
            Ok(treatment) => Some(treatment),
            Err(e) => {
                diags.push(
                    Diagnostic::error("Invalid Tool Result Treatment", e.to_string())
                        .at(AttributePath::root("tool_result_treatment")),
                );
                return None;
            }
        },
        None => None,
    };
    Some(UpdateAgentTool {
        allow_usage_when_untrusted_data_is_present: plan.allow_usage_when_untrusted_data_is_present.as_known().copied(),
        tool_result_treatment,
        response_modifier_template: plan.response_modifier_template.as_known().cloned(),
    })
}

/// Find the assignment row for `(agent_id, tool_id)`.
async fn locate(
    ctx: OperationContext<'_>,
    agent_id: Uuid,
    tool_id: Uuid,
    diags: &mut Diagnostics,
) -> Fetched<AgentTool> {
    let params = ListAgentToolsParams {
        agent_id: Some(agent_id),
        limit: Some(LOOKUP_LIMIT),
    };
    let rows = match fetch("list agent tools", ctx.client.list_agent_tools(ctx.scope, &params, &[]).await, diags) {
        Fetched::Found(rows) => rows.into_vec(),
        Fetched::Missing => return Fetched::Missing,
        Fetched::Failed => return Fetched::Failed,
    };
    let tool = tool_id.to_string();
    match rows.into_iter().find(|row| row.tool.id == tool) {
        Some(row) => Fetched::Found(row),
        None => Fetched::Missing,
    }
}

pub struct AgentToolResource;

#[async_trait]
impl Resource for AgentToolResource {
    type Model = AgentToolModel;

    fn type_name(&self) -> &'static str {
        "archestra_agent_tool"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Assigns a tool to an agent and configures its security policies.",
            vec![
                Attribute::string("id")
                    .computed()
                    .use_state_for_unknown()
                    .describe("Composite identifier agent_id:tool_id"),
                Attribute::string("agent_tool_id")
                    .computed()
                    .use_state_for_unknown()
                    .describe("Identifier of the agent-tool relationship"),
                Attribute::string("agent_id")
                    .required()
                    .requires_replace()
                    .describe("The agent to assign the tool to"),
                Attribute::string("tool_id")
                    .required()
                    .requires_replace()
                    .describe("The tool to assign"),
                Attribute::bool("allow_usage_when_untrusted_data_is_present")
                    .optional_computed()
                    .use_state_for_unknown()
                    .describe("Whether to allow tool usage when untrusted data is present"),
                Attribute::string("tool_result_treatment")
                    .optional_computed()
                    .use_state_for_unknown()
                    .describe("How to treat tool results (trusted, untrusted)"),
                Attribute::string("response_modifier_template")
                    .optional()
                    .describe("Template applied to the tool response before it reaches the model"),
            ],
        )
    }

    async fn create(
        &self,
        ctx: OperationContext<'_>,
        plan: AgentToolModel,
        diags: &mut Diagnostics,
    ) -> Option<AgentToolModel> {
        let agent_id = check(parse_uuid(&plan.agent_id, "agent_id", "Agent"), diags);
        let tool_id = check(parse_uuid(&plan.tool_id, "tool_id", "Tool"), diags);
        let config = configuration(&plan, diags);
        let (agent_id, tool_id, config) = (agent_id?, tool_id?, config?);

        let assigned = ctx.client.assign_tool_to_agent(ctx.scope, agent_id, tool_id, &[]).await;
        if !expect_success("assign tool to agent", assigned, diags) {
            return None;
        }
        tracing::info!(%agent_id, %tool_id, "assigned tool to agent");

        let row = match locate(ctx, agent_id, tool_id, diags).await {
            Fetched::Found(row) => row,
            Fetched::Missing => {
                diags.push(Diagnostic::error(
                    "Agent Tool Not Found",
                    format!("Tool {tool_id} was assigned to agent {agent_id} but the assignment could not be found"),
                ));
                return None;
            }
            Fetched::Failed => return None,
        };

        let row = if config.is_empty() {
            row
        } else {
            expect_body(
                "update agent tool",
                ctx.client.update_agent_tool(ctx.scope, row.id, &config, &[]).await,
                diags,
            )?
        };
        Some(AgentToolModel::from_server(row, agent_id, tool_id))
    }

    async fn read(
        &self,
        ctx: OperationContext<'_>,
        state: AgentToolModel,
        diags: &mut Diagnostics,
    ) -> Option<AgentToolModel> {
        let Some(raw) = check(state.id.required("id"), diags) else {
            return Some(state);
        };
        let Some((agent, tool)) = split_composite_id(&raw) else {
            tracing::warn!(id = %raw, "malformed agent tool id, removing from state");
            return None;
        };
        let agent_id = check(parse_uuid_str(agent, "Agent"), diags);
        let tool_id = check(parse_uuid_str(tool, "Tool"), diags);
        let (Some(agent_id), Some(tool_id)) = (agent_id, tool_id) else {
            return Some(state);
        };
        match locate(ctx, agent_id, tool_id, diags).await {
            Fetched::Found(row) => Some(AgentToolModel::from_server(row, agent_id, tool_id)),
            Fetched::Missing => {
                tracing::warn!(%agent_id, %tool_id, "agent tool no longer exists, removing from state");
                None
            }
            Fetched::Failed => Some(state),
        }
    }

    async fn update(
        &self,
        ctx: OperationContext<'_>,
        plan: AgentToolModel,
        state: AgentToolModel,
        diags: &mut Diagnostics,
    ) -> Option<AgentToolModel> {
        let id = check(parse_uuid(&state.agent_tool_id, "agent_tool_id", "Agent Tool"), diags);
        let agent_id = check(parse_uuid(&state.agent_id, "agent_id", "Agent"), diags);
        let tool_id = check(parse_uuid(&state.tool_id, "tool_id", "Tool"), diags);
        let config = configuration(&plan, diags);
        let (id, agent_id, tool_id, config) = (id?, agent_id?, tool_id?, config?);

        if config.is_empty() {
            return Some(AgentToolModel {
                response_modifier_template: plan.response_modifier_template,
                ..state
            });
        }
        let row = expect_body(
            "update agent tool",
            ctx.client.update_agent_tool(ctx.scope, id, &config, &[]).await,
            diags,
        )?;
        Some(AgentToolModel::from_server(row, agent_id, tool_id))
    }

    async fn delete(&self, ctx: OperationContext<'_>, state: AgentToolModel, diags: &mut Diagnostics) {
        let agent_id = check(parse_uuid(&state.agent_id, "agent_id", "Agent"), diags);
        let tool_id = check(parse_uuid(&state.tool_id, "tool_id", "Tool"), diags);
        let (Some(agent_id), Some(tool_id)) = (agent_id, tool_id) else {
            return;
        };
        let result = ctx.client.unassign_tool_from_agent(ctx.scope, agent_id, tool_id, &[]).await;
        expect_deleted("unassign tool from agent", result, diags);
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<AgentToolModel> {
        let (agent_id, tool_id) = check(parse_composite_id(id), diags)?;
        Some(AgentToolModel {
            id: Value::Known(composite_id(agent_id, tool_id)),
            agent_id: Value::Known(agent_id.to_string()),
            tool_id: Value::Known(tool_id.to_string()),
            ..AgentToolModel::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "00000000-0000-0000-0000-0000000000a1";
    const TOOL: &str = "00000000-0000-0000-0000-0000000000b2";

    #[test]
    fn composite_id_round_trips() {
        let (agent, tool) = parse_composite_id(&format!("{AGENT}:{TOOL}")).unwrap();
        assert_eq!(composite_id(agent, tool), format!("{AGENT}:{TOOL}"));
    }

    #[test]
    fn composite_id_requires_separator() {
        let err = parse_composite_id(AGENT).unwrap_err();
        assert_eq!(err.summary, "Unexpected Import Identifier");
    }

    #[test]
    fn composite_id_rejects_extra_parts() {
        let err = parse_composite_id(&format!("{AGENT}:{TOOL}:x")).unwrap_err();
        assert_eq!(err.summary, "Unexpected Import Identifier");
    }

    #[test]
    fn composite_id_rejects_bad_halves() {
        let err = parse_composite_id(&format!("{AGENT}:nope")).unwrap_err();
        assert_eq!(err.summary, "Invalid Tool ID");
    }

    #[test]
    fn import_seeds_both_halves() {
        let mut diags = Diagnostics::new();
        let model = AgentToolResource.import(&format!("{AGENT}:{TOOL}"), &mut diags).unwrap();
        assert_eq!(model.agent_id.as_str(), Some(AGENT));
        assert_eq!(model.tool_id.as_str(), Some(TOOL));
        assert!(model.agent_tool_id.is_null());
    }

    #[test]
    fn configuration_skips_unset_fields() {
        let plan = AgentToolModel {
            allow_usage_when_untrusted_data_is_present: Value::Unknown,
            tool_result_treatment: Value::Known("trusted".into()),
            ..AgentToolModel::default()
        };
        let mut diags = Diagnostics::new();
        let body = configuration(&plan, &mut diags).unwrap();
        assert_eq!(body.allow_usage_when_untrusted_data_is_present, None);
        assert_eq!(body.tool_result_treatment, Some(ToolResultTreatment::Trusted));
        assert!(diags.is_empty());
    }

    #[test]
    fn configuration_rejects_unknown_treatment() {
        let plan = AgentToolModel {
            tool_result_treatment: Value::Known("sometimes".into()),
            ..AgentToolModel::default()
        };
        let mut diags = Diagnostics::new();
        assert!(configuration(&plan, &mut diags).is_none());
        assert!(diags.has_errors());
    }
}
