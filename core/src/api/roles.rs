use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{CREATED, DELETED, OK};
use crate::client::ArchestraClient;
use crate::editor::RequestEditor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::ApiResponse;
use crate::types::{CreateRole, Role, UpdateRole};

impl ArchestraClient {
    pub fn build_create_role(&self, input: &CreateRole) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &["v1", "roles"], input)
    }

    pub fn build_get_role(&self, id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Get, &["v1", "roles", &id.to_string()], &[])
    }

    pub fn build_update_role(&self, id: Uuid, input: &UpdateRole) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, &["v1", "roles", &id.to_string()], input)
    }

    pub fn build_delete_role(&self, id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Delete, &["v1", "roles", &id.to_string()], &[])
    }

    pub async fn create_role(
        &self,
        scope: &CancellationToken,
        input: &CreateRole,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<Role>, ApiError> {
        self.call(scope, self.build_create_role(input)?, editors, CREATED).await
    }

    pub async fn get_role(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<Role>, ApiError> {
        self.call(scope, self.build_get_role(id)?, editors, OK).await
    }

    pub async fn update_role(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        input: &UpdateRole,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<Role>, ApiError> {
        self.call(scope, self.build_update_role(id, input)?, editors, OK).await
    }

    pub async fn delete_role(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        self.call(scope, self.build_delete_role(id)?, editors, DELETED).await
    }
}
