use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{CREATED, DELETED, OK};
use crate::client::ArchestraClient;
use crate::editor::RequestEditor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::ApiResponse;
use crate::types::{CreateUser, UpdateUser, User};

impl ArchestraClient {
    pub fn build_create_user(&self, input: &CreateUser) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &["v1", "users"], input)
    }

    pub fn build_get_user(&self, id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Get, &["v1", "users", &id.to_string()], &[])
    }

    pub fn build_update_user(&self, id: Uuid, input: &UpdateUser) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, &["v1", "users", &id.to_string()], input)
    }

    pub fn build_delete_user(&self, id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Delete, &["v1", "users", &id.to_string()], &[])
    }

    pub async fn create_user(
        &self,
        scope: &CancellationToken,
        input: &CreateUser,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<User>, ApiError> {
        self.call(scope, self.build_create_user(input)?, editors, CREATED).await
    }

    pub async fn get_user(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<User>, ApiError> {
        self.call(scope, self.build_get_user(id)?, editors, OK).await
    }

    pub async fn update_user(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        input: &UpdateUser,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<User>, ApiError> {
        self.call(scope, self.build_update_user(id, input)?, editors, OK).await
    }

    pub async fn delete_user(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        self.call(scope, self.build_delete_user(id)?, editors, DELETED).await
    }
}
