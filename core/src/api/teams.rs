use tokio_util::sync::CancellationToken;

use super::{CREATED, DELETED, OK};
use crate::client::ArchestraClient;
use crate::editor::RequestEditor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::ApiResponse;
use crate::types::{AddTeamMember, CreateTeam, Team, TeamMember, UpdateTeam};

impl ArchestraClient {
    pub fn build_create_team(&self, input: &CreateTeam) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &["api", "teams"], input)
    }

    pub fn build_get_team(&self, id: &str) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Get, &["api", "teams", id], &[])
    }

    pub fn build_update_team(&self, id: &str, input: &UpdateTeam) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &["api", "teams", id], input)
    }

    pub fn build_delete_team(&self, id: &str) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Delete, &["api", "teams", id], &[])
    }

    pub fn build_list_team_members(&self, team_id: &str) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Get, &["api", "teams", team_id, "members"], &[])
    }

    pub fn build_add_team_member(&self, team_id: &str, input: &AddTeamMember) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &["api", "teams", team_id, "members"], input)
    }

    pub fn build_remove_team_member(&self, team_id: &str, user_id: &str) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Delete, &["api", "teams", team_id, "members", user_id], &[])
    }

    pub async fn create_team(
        &self,
        scope: &CancellationToken,
        input: &CreateTeam,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<Team>, ApiError> {
        self.call(scope, self.build_create_team(input)?, editors, CREATED).await
    }

    pub async fn get_team(
        &self,
        scope: &CancellationToken,
        id: &str,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<Team>, ApiError> {
        self.call(scope, self.build_get_team(id)?, editors, OK).await
    }

    pub async fn update_team(
        &self,
        scope: &CancellationToken,
        id: &str,
        input: &UpdateTeam,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<Team>, ApiError> {
        self.call(scope, self.build_update_team(id, input)?, editors, OK).await
    }

    pub async fn delete_team(
        &self,
        scope: &CancellationToken,
        id: &str,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        self.call(scope, self.build_delete_team(id)?, editors, DELETED).await
    }

    pub async fn list_team_members(
        &self,
        scope: &CancellationToken,
        team_id: &str,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<Vec<TeamMember>>, ApiError> {
        self.call(scope, self.build_list_team_members(team_id)?, editors, OK).await
    }

    pub async fn add_team_member(
        &self,
        scope: &CancellationToken,
        team_id: &str,
        input: &AddTeamMember,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<TeamMember>, ApiError> {
        let request = self.build_add_team_member(team_id, input)?;
        self.call(scope, request, editors, CREATED).await
    }

    pub async fn remove_team_member(
        &self,
        scope: &CancellationToken,
        team_id: &str,
        user_id: &str,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let request = self.build_remove_team_member(team_id, user_id)?;
        self.call(scope, request, editors, DELETED).await
    }
}

#[cfg(test)]
mod tests {
    use crate::client::tests::client;
    use crate::http::HttpMethod;
    use crate::types::{AddTeamMember, UpdateTeam};

    #[test]
    fn update_team_is_a_put() {
        let input = UpdateTeam {
            name: Some("renamed".to_string()),
            description: None,
        };
        let req = client().build_update_team("team-1", &input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:9000/api/teams/team-1");
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"renamed"}"#));
    }

    #[test]
    fn member_paths_escape_string_ids() {
        let req = client().build_remove_team_member("t 1", "user/2").unwrap();
        assert_eq!(req.url, "http://localhost:9000/api/teams/t%201/members/user%2F2");
    }

    #[test]
    fn add_member_sends_role() {
        let input = AddTeamMember {
            user_id: "u2".to_string(),
            role: Some("owner".to_string()),
        };
        let req = client().build_add_team_member("t", &input).unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"{"userId":"u2","role":"owner"}"#));
    }
}
