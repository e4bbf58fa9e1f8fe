use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::ArchestraClient;
use crate::editor::RequestEditor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::{ApiResponse, ANY_2XX};

impl ArchestraClient {
    fn grant_request(&self, method: HttpMethod, server_id: Uuid, team_id: &str) -> Result<HttpRequest, ApiError> {
        self.request(
            method,
            &["api", "v1", "mcp-servers", &server_id.to_string(), "teams", team_id],
            &[],
        )
    }

    pub fn build_grant_team_mcp_server_access(&self, server_id: Uuid, team_id: &str) -> Result<HttpRequest, ApiError> {
        self.grant_request(HttpMethod::Post, server_id, team_id)
    }

    pub fn build_revoke_team_mcp_server_access(&self, server_id: Uuid, team_id: &str) -> Result<HttpRequest, ApiError> {
        self.grant_request(HttpMethod::Delete, server_id, team_id)
    }

    pub async fn grant_team_mcp_server_access(
        &self,
        scope: &CancellationToken,
        server_id: Uuid,
        team_id: &str,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let request = self.build_grant_team_mcp_server_access(server_id, team_id)?;
        self.call(scope, request, editors, &ANY_2XX).await
    }

    pub async fn revoke_team_mcp_server_access(
        &self,
        scope: &CancellationToken,
        server_id: Uuid,
        team_id: &str,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let request = self.build_revoke_team_mcp_server_access(server_id, team_id)?;
        self.call(scope, request, editors, &ANY_2XX).await
    }
}
