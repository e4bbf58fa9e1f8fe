//! `archestra_mcp_server_team_access`: grants a team access to an MCP server.
//!
//! The grant carries no payload. Read does not contact the server; the state
//! is kept as applied.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{check, expect_deleted, expect_success};
use crate::diag::{Diagnostic, Diagnostics};
use crate::framework::{OperationContext, Resource};
use crate::schema::{Attribute, Schema};
use crate::value::{parse_uuid, parse_uuid_str, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpServerTeamAccessModel {
    pub id: Value<String>,
    pub mcp_server_id: Value<String>,
    pub team_id: Value<String>,
}

pub fn grant_id(server_id: Uuid, team_id: &str) -> String {
    format!("{server_id}:{team_id}")
}

pub fn parse_grant_id(raw: &str) -> Result<(Uuid, String), Diagnostic> {
    let unexpected = || {
        Diagnostic::error(
            "Unexpected Import Identifier",
            format!("Expected import identifier with format: mcp_server_id:team_id. Got: {raw}"),
        )
    };
    let (server, team) = raw.split_once(':').ok_or_else(unexpected)?;
    if team.is_empty() {
        return Err(unexpected());
    }
    Ok((parse_uuid_str(server, "MCP Server")?, team.to_string()))
}

fn target(model: &McpServerTeamAccessModel, diags: &mut Diagnostics) -> Option<(Uuid, String)> {
    let server_id = check(parse_uuid(&model.mcp_server_id, "mcp_server_id", "MCP Server"), diags);
    let team_id = check(model.team_id.required("team_id"), diags);
    Some((server_id?, team_id?))
}

pub struct McpServerTeamAccessResource;

#[async_trait]
impl Resource for McpServerTeamAccessResource {
    type Model = McpServerTeamAccessModel;

    fn type_name(&self) -> &'static str {
        "archestra_mcp_server_team_access"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Manages team access to an MCP server.",
            vec![
                Attribute::string("id")
                    .computed()
                    .use_state_for_unknown()
                    .describe("Composite identifier mcp_server_id:team_id"),
                Attribute::string("mcp_server_id")
                    .required()
                    .requires_replace()
                    .describe("The ID of the MCP server."),
                Attribute::string("team_id")
                    .required()
                    .requires_replace()
                    .describe("The ID of the team."),
            ],
        )
    }

    async fn create(
        &self,
        ctx: OperationContext<'_>,
        plan: McpServerTeamAccessModel,
        diags: &mut Diagnostics,
    ) -> Option<McpServerTeamAccessModel> {
        let (server_id, team_id) = target(&plan, diags)?;
        let result = ctx
            .client
            .grant_team_mcp_server_access(ctx.scope, server_id, &team_id, &[])
            .await;
        if !expect_success("grant team MCP server access", result, diags) {
            return None;
        }
        tracing::info!(%server_id, team_id = %team_id, "granted team access");
        Some(McpServerTeamAccessModel {
            id: Value::Known(grant_id(server_id, &team_id)),
            mcp_server_id: Value::Known(server_id.to_string()),
            team_id: Value::Known(team_id),
        })
    }

    async fn read(
        &self,
        _ctx: OperationContext<'_>,
        state: McpServerTeamAccessModel,
        _diags: &mut Diagnostics,
    ) -> Option<McpServerTeamAccessModel> {
        Some(state)
    }

    async fn update(
        &self,
        _ctx: OperationContext<'_>,
        plan: McpServerTeamAccessModel,
        state: McpServerTeamAccessModel,
        _diags: &mut Diagnostics,
    ) -> Option<McpServerTeamAccessModel> {
        Some(McpServerTeamAccessModel { id: state.id, ..plan })
    }

    async fn delete(&self, ctx: OperationContext<'_>, state: McpServerTeamAccessModel, diags: &mut Diagnostics) {
        let Some((server_id, team_id)) = target(&state, diags) else {
            return;
        };
        let result = ctx
            .client
            .revoke_team_mcp_server_access(ctx.scope, server_id, &team_id, &[])
            .await;
        expect_deleted("revoke team MCP server access", result, diags);
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<McpServerTeamAccessModel> {
        let (server_id, team_id) = check(parse_grant_id(id), diags)?;
        Some(McpServerTeamAccessModel {
            id: Value::Known(grant_id(server_id, &team_id)),
            mcp_server_id: Value::Known(server_id.to_string()),
            team_id: Value::Known(team_id),
        })
    }
}
