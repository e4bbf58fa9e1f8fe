use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{CREATED, DELETED, OK};
use crate::client::ArchestraClient;
use crate::editor::RequestEditor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::ApiResponse;
use crate::types::{AgentTool, ListAgentToolsParams, ListEnvelope, UpdateAgentTool};

impl ArchestraClient {
    pub fn build_list_agent_tools(&self, params: &ListAgentToolsParams) -> Result<HttpRequest, ApiError> {
        let mut query = Vec::new();
        if let Some(agent_id) = params.agent_id {
            query.push(("agentId", agent_id.to_string()));
        }
        if let Some(limit) = params.limit {
            query.push(("limit", limit.to_string()));
        }
        self.request(HttpMethod::Get, &["api", "agent-tools"], &query)
    }

    pub fn build_assign_tool_to_agent(&self, agent_id: Uuid, tool_id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(
            HttpMethod::Post,
            &["api", "agents", &agent_id.to_string(), "tools", &tool_id.to_string()],
            &[],
        )
    }

    pub fn build_update_agent_tool(&self, id: Uuid, input: &UpdateAgentTool) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, &["api", "agent-tools", &id.to_string()], input)
    }

    pub fn build_unassign_tool_from_agent(&self, agent_id: Uuid, tool_id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(
            HttpMethod::Delete,
            &["api", "agents", &agent_id.to_string(), "tools", &tool_id.to_string()],
            &[],
        )
    }

    pub async fn list_agent_tools(
        &self,
        scope: &CancellationToken,
        params: &ListAgentToolsParams,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<ListEnvelope<AgentTool>>, ApiError> {
        self.call(scope, self.build_list_agent_tools(params)?, editors, OK).await
    }

    pub async fn assign_tool_to_agent(
        &self,
        scope: &CancellationToken,
        agent_id: Uuid,
        tool_id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let request = self.build_assign_tool_to_agent(agent_id, tool_id)?;
        self.call(scope, request, editors, CREATED).await
    }

    pub async fn update_agent_tool(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        input: &UpdateAgentTool,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<AgentTool>, ApiError> {
        self.call(scope, self.build_update_agent_tool(id, input)?, editors, OK).await
    }

    pub async fn unassign_tool_from_agent(
        &self,
        scope: &CancellationToken,
        agent_id: Uuid,
        tool_id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let request = self.build_unassign_tool_from_agent(agent_id, tool_id)?;
        self.call(scope, request, editors, DELETED).await
    }
}
