use tokio_util::sync::CancellationToken;

use super::OK;
use crate::client::ArchestraClient;
use crate::editor::RequestEditor;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::ApiResponse;
use crate::types::{ListEnvelope, Tool};

impl ArchestraClient {
    pub fn build_list_tools(&self) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Get, &["api", "tools"], &[])
    }

    pub async fn list_tools(
        &self,
        scope: &CancellationToken,
        editors: &[&dyn RequestEditor],
    ) -> Result<ApiResponse<ListEnvelope<Tool>>, ApiError> {
        self.call(scope, self.build_list_tools()?, editors, OK).await
    }
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use crate::client::tests::recorder;
    use crate::client::ArchestraClient;

    #[tokio::test]
    async fn list_tools_decodes_bare_array() {
        let transport = recorder(
            200,
            r#"[{"id":"33333333-3333-3333-3333-333333333333","name":"read_file","mcpServer":{"id":"srv"}},
                {"id":"44444444-4444-4444-4444-444444444444","name":"builtin","mcpServer":null}]"#,
        );
        let client = ArchestraClient::new("http://localhost:9000", transport).unwrap();
        let tools = client
            .list_tools(&CancellationToken::new(), &[])
            .await
            .unwrap()
            .into_success()
            .unwrap()
            .into_vec();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].mcp_server.as_ref().map(|s| s.id.as_str()), Some("srv"));
        assert!(tools[1].mcp_server.is_none());
    }
}
