//! The provider: configuration plus the registry of resources and data
//! sources the host can drive.

use std::collections::BTreeMap;
use std::sync::Arc;

use archestra_client::{ArchestraClient, ReqwestTransport, Transport};
use serde_json::Value as Json;
use tokio_util::sync::CancellationToken;

use crate::config::ProviderConfig;
use crate::data_sources::agent_tool::AgentToolDataSource;
use crate::data_sources::mcp_server_tool::McpServerToolDataSource;
use crate::data_sources::team::TeamDataSource;
use crate::diag::{Diagnostic, Diagnostics};
use crate::framework::{
    DataSourceHandler, ErasedDataSource, ErasedResource, OperationContext, ResourceHandler, StateResult,
};
use crate::resources::agent_tool::AgentToolResource;
use crate::resources::mcp_server_team_access::McpServerTeamAccessResource;
use crate::resources::role::RoleResource;
use crate::resources::team::TeamResource;
use crate::resources::trusted_data_policy::TrustedDataPolicyResource;
use crate::resources::user::UserResource;
use crate::resources::user_role_assignment::UserRoleAssignmentResource;
use crate::schema::{Attribute, PlannedChange, Schema};

pub struct ArchestraProvider {
    transport: Arc<dyn Transport>,
    client: Option<ArchestraClient>,
    resources: BTreeMap<&'static str, Box<dyn ResourceHandler>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSourceHandler>>,
}

impl std::fmt::Debug for ArchestraProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchestraProvider")
            .field("client", &self.client)
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for ArchestraProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchestraProvider {
    /// A provider that talks HTTP through [`ReqwestTransport`].
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        let mut provider = Self {
            transport,
            client: None,
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        };
        provider.register_resource(ErasedResource(UserResource));
        provider.register_resource(ErasedResource(RoleResource));
        provider.register_resource(ErasedResource(UserRoleAssignmentResource));
        provider.register_resource(ErasedResource(TeamResource));
        provider.register_resource(ErasedResource(AgentToolResource));
        provider.register_resource(ErasedResource(TrustedDataPolicyResource));
        provider.register_resource(ErasedResource(McpServerTeamAccessResource));
        provider.register_data_source(ErasedDataSource(AgentToolDataSource));
        provider.register_data_source(ErasedDataSource(McpServerToolDataSource));
        provider.register_data_source(ErasedDataSource(TeamDataSource));
        provider
    }

    fn register_resource(&mut self, handler: impl ResourceHandler + 'static) {
        self.resources.insert(handler.type_name(), Box::new(handler));
    }

    fn register_data_source(&mut self, handler: impl DataSourceHandler + 'static) {
        self.data_sources.insert(handler.type_name(), Box::new(handler));
    }

    pub fn schema() -> Schema {
        Schema::new(
            "Manages Archestra users, roles, teams, agent tools and policies.",
            vec![
                Attribute::string("base_url")
                    .required()
                    .describe("Base URL of the Archestra API, e.g. http://localhost:9000"),
                Attribute::string("api_key")
                    .optional()
                    .sensitive()
                    .describe("API key sent in the Authorization header"),
                Attribute::string("user_agent")
                    .optional()
                    .describe("Overrides the User-Agent header"),
            ],
        )
    }

    /// Validate `config` and build the client. On error the provider keeps
    /// its previous configuration.
    pub fn configure(&mut self, config: Json) -> Diagnostics {
        let mut diags = Self::schema().validate_config(&config);
        if diags.has_errors() {
            return diags;
        }
        match ProviderConfig::from_json(config).and_then(|c| c.client(Arc::clone(&self.transport))) {
            Ok(client) => {
                tracing::info!(base_url = %client.base_url(), "provider configured");
                self.client = Some(client);
            }
            Err(e) => diags.push(Diagnostic::error("Invalid Provider Configuration", e.to_string())),
        }
        diags
    }

    pub fn client(&self) -> Option<&ArchestraClient> {
        self.client.as_ref()
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    pub fn resource(&self, type_name: &str) -> Option<&dyn ResourceHandler> {
        self.resources.get(type_name).map(|h| h.as_ref())
    }

    pub fn data_source(&self, type_name: &str) -> Option<&dyn DataSourceHandler> {
        self.data_sources.get(type_name).map(|h| h.as_ref())
    }

    fn lookup(&self, type_name: &str) -> Result<&dyn ResourceHandler, Diagnostic> {
        self.resource(type_name).ok_or_else(|| {
            Diagnostic::error("Unknown Resource Type", format!("No resource named \"{type_name}\" is registered"))
        })
    }

    fn context<'a>(&'a self, scope: &'a CancellationToken) -> Result<OperationContext<'a>, Diagnostic> {
        let client = self.client.as_ref().ok_or_else(|| {
            Diagnostic::error(
                "Provider Not Configured",
                "The provider must be configured before resources can be managed.",
            )
        })?;
        Ok(OperationContext { client, scope })
    }

    fn prepare<'a>(
        &'a self,
        type_name: &str,
        scope: &'a CancellationToken,
    ) -> Result<(&'a dyn ResourceHandler, OperationContext<'a>), Diagnostic> {
        Ok((self.lookup(type_name)?, self.context(scope)?))
    }

    pub fn plan(&self, type_name: &str, prior: Option<&Json>, config: &Json) -> (Option<PlannedChange>, Diagnostics) {
        match self.lookup(type_name) {
            Ok(handler) => {
                let (change, diags) = handler.plan(prior, config);
                (Some(change), diags)
            }
            Err(d) => (None, d.into()),
        }
    }

    pub async fn create(&self, scope: &CancellationToken, type_name: &str, plan: Json) -> StateResult {
        match self.prepare(type_name, scope) {
            Ok((handler, ctx)) => handler.create(ctx, plan).await,
            Err(d) => failed(d),
        }
    }

    pub async fn read(&self, scope: &CancellationToken, type_name: &str, state: Json) -> StateResult {
        match self.prepare(type_name, scope) {
            Ok((handler, ctx)) => handler.read(ctx, state).await,
            Err(d) => StateResult::kept(state, d.into()),
        }
    }

    pub async fn update(&self, scope: &CancellationToken, type_name: &str, plan: Json, state: Json) -> StateResult {
        match self.prepare(type_name, scope) {
            Ok((handler, ctx)) => handler.update(ctx, plan, state).await,
            Err(d) => failed(d),
        }
    }

    pub async fn delete(&self, scope: &CancellationToken, type_name: &str, state: Json) -> Diagnostics {
        match self.prepare(type_name, scope) {
            Ok((handler, ctx)) => handler.delete(ctx, state).await,
            Err(d) => d.into(),
        }
    }

    /// Seed state from an import id. Needs no client.
    pub fn import(&self, type_name: &str, id: &str) -> StateResult {
        match self.lookup(type_name) {
            Ok(handler) => handler.import(id),
            Err(d) => failed(d),
        }
    }

    pub async fn read_data_source(&self, scope: &CancellationToken, type_name: &str, config: Json) -> StateResult {
        let Some(handler) = self.data_source(type_name) else {
            return failed(Diagnostic::error(
                "Unknown Data Source Type",
                format!("No data source named \"{type_name}\" is registered"),
            ));
        };
        match self.context(scope) {
            Ok(ctx) => handler.read(ctx, config).await,
            Err(d) => failed(d),
        }
    }
}

fn failed(diagnostic: Diagnostic) -> StateResult {
    StateResult {
        state: None,
        diagnostics: diagnostic.into(),
    }
}
