use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{CREATED, DELETED, OK};
use crate::client::ArchestraClient;
use crate::editor::RequestEditor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::ApiResponse;
use crate::types::{CreateTrustedDataPolicy, TrustedDataPolicy, UpdateTrustedDataPolicy};

const PATH: &str = "trusted-data-policies";

impl ArchestraClient {
    pub fn build_create_trusted_data_policy(&self, input: &CreateTrustedDataPolicy) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, &["api", PATH], input)
    }

    pub fn build_get_trusted_data_policy(&self, id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Get, &["api", PATH, &id.to_string()], &[])
    }

    pub fn build_update_trusted_data_policy(
        &self,
        id: Uuid,
        input: &UpdateTrustedDataPolicy,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &["api", PATH, &id.to_string()], input)
    }

    pub fn build_delete_trusted_data_policy(&self, id: Uuid) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Delete, &["api", PATH, &id.to_string()], &[])
    }

    pub async fn create_trusted_data_policy(
        &self,
        scope: &CancellationToken,
        input: &CreateTrustedDataPolicy,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<TrustedDataPolicy>, ApiError> {
        let request = self.build_create_trusted_data_policy(input)?;
        self.call(scope, request, editors, CREATED).await
    }

    pub async fn get_trusted_data_policy(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<TrustedDataPolicy>, ApiError> {
        self.call(scope, self.build_get_trusted_data_policy(id)?, editors, OK).await
    }

    pub async fn update_trusted_data_policy(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        input: &UpdateTrustedDataPolicy,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<TrustedDataPolicy>, ApiError> {
        let request = self.build_update_trusted_data_policy(id, input)?;
        self.call(scope, request, editors, OK).await
    }

    pub async fn delete_trusted_data_policy(
        &self,
        scope: &CancellationToken,
        id: Uuid,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let request = self.build_delete_trusted_data_policy(id)?;
        self.call(scope, request, editors, DELETED).await
    }
}
