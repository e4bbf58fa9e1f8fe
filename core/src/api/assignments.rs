use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{CREATED, DELETED, OK};
use crate::client::ArchestraClient;
use crate::editor::RequestEditor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::ApiResponse;
use crate::types::{CreateUserRoleAssignment, UserRoleAssignment};

const PATH: &str = "user-role-assignments";

impl ArchestraClient {
    pub fn build_create_user_role_assignment(
        &self,
        input: &CreateUserRoleAssignment,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &["v1", PATH], input)
    }

    pub fn build_get_user_role_assignment(&self, id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Get, &["v1", PATH, &id.to_string()], &[])
    }

    pub fn build_delete_user_role_assignment(&self, id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Delete, &["v1", PATH, &id.to_string()], &[])
    }

    pub async fn create_user_role_assignment(
        &self,
        scope: &CancellationToken,
        input: &CreateUserRoleAssignment,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<UserRoleAssignment>, ApiError> {
        let request = self.build_create_user_role_assignment(input)?;
        self.call(scope, request, editors, CREATED).await
    }

    pub async fn get_user_role_assignment(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<UserRoleAssignment>, ApiError> {
        self.call(scope, self.build_get_user_role_assignment(id)?, editors, OK).await
    }

    pub async fn delete_user_role_assignment(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let request = self.build_delete_user_role_assignment(id)?;
        self.call(scope, request, editors, DELETED).await
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::client::tests::client;
    use crate::types::CreateUserRoleAssignment;

    #[test]
    fn create_assignment_uses_camel_case_ids() {
        let input = CreateUserRoleAssignment {
            user_id: Uuid::nil(),
            role_id: Uuid::from_u128(7),
        };
        let req = client().build_create_user_role_assignment(&input).unwrap();
        assert_eq!(req.url, "http://localhost:9000/v1/user-role-assignments");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["userId"], Uuid::nil().to_string());
        assert_eq!(body["roleId"], Uuid::from_u128(7).to_string());
    }
}
