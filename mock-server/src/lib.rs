//! In-memory implementation of the Archestra REST API.
//!
//! Serves users, custom roles, role assignments, teams with members, agent
//! tools, the tool catalogue, trusted-data policies, and team access grants
//! for MCP servers. One agent, one MCP server, and three tools are seeded so
//! agent-tool flows work without an admin surface for agents.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

mod error;
mod handlers;
pub mod model;

pub use error::{ApiFailure, ApiResult};
use model::{Agent, AgentTool, Assignment, Member, Policy, Role, ServerRef, Team, Tool, User};

pub const DEMO_AGENT_ID: Uuid = Uuid::from_u128(0xa9e7_0000_0000_4000_8000_0000_0000_0001);
pub const DEMO_MCP_SERVER_ID: Uuid = Uuid::from_u128(0x5e7e_0000_0000_4000_8000_0000_0000_0001);
pub const READ_FILE_TOOL_ID: Uuid = Uuid::from_u128(0x7001_0000_0000_4000_8000_0000_0000_0001);
pub const WRITE_FILE_TOOL_ID: Uuid = Uuid::from_u128(0x7001_0000_0000_4000_8000_0000_0000_0002);
pub const WEB_SEARCH_TOOL_ID: Uuid = Uuid::from_u128(0x7001_0000_0000_4000_8000_0000_0000_0003);

pub const ORGANIZATION_ID: &str = "org-mock";
pub const CREATED_BY: &str = "mock-admin";

#[derive(Debug)]
pub struct Store {
    pub users: HashMap<Uuid, User>,
    pub roles: HashMap<Uuid, Role>,
    pub assignments: HashMap<Uuid, Assignment>,
    pub teams: HashMap<String, Team>,
    /// Members per team id, in insertion order.
    pub members: HashMap<String, Vec<Member>>,
    pub agents: Vec<Agent>,
    pub tools: Vec<Tool>,
    pub agent_tools: Vec<AgentTool>,
    pub policies: HashMap<Uuid, Policy>,
    pub grants: HashSet<(Uuid, String)>,
}

impl Store {
    pub fn seeded() -> Self {
        let server = ServerRef {
            id: DEMO_MCP_SERVER_ID,
            name: "filesystem".to_string(),
        };
        let tool = |id, name: &str, description: &str, server: Option<ServerRef>| Tool {
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
            mcp_server: server,
        };
        Self {
            users: HashMap::new(),
            roles: HashMap::new(),
            assignments: HashMap::new(),
            teams: HashMap::new(),
            members: HashMap::new(),
            agents: vec![Agent {
                id: DEMO_AGENT_ID,
                name: "demo-agent".to_string(),
            }],
            tools: vec![
                tool(READ_FILE_TOOL_ID, "read_file", "Read a file", Some(server.clone())),
                tool(WRITE_FILE_TOOL_ID, "write_file", "Write a file", Some(server)),
                tool(WEB_SEARCH_TOOL_ID, "web_search", "Search the web", None),
            ],
            agent_tools: Vec::new(),
            policies: HashMap::new(),
            grants: HashSet::new(),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    router(Arc::new(RwLock::new(Store::seeded())))
}

pub fn router(db: Db) -> Router {
    use handlers::*;

    Router::new()
        .route("/v1/users", post(create_user))
        .route("/v1/users/{id}", get(get_user).patch(update_user).delete(delete_user))
        .route("/v1/roles", post(create_role))
        .route("/v1/roles/{id}", get(get_role).patch(update_role).delete(delete_role))
        .route("/v1/user-role-assignments", post(create_assignment))
        .route(
            "/v1/user-role-assignments/{id}",
            get(get_assignment).delete(delete_assignment),
        )
        .route("/api/teams", post(create_team))
        .route("/api/teams/{id}", get(get_team).put(update_team).delete(delete_team))
        .route("/api/teams/{id}/members", get(list_members).post(add_member))
        .route("/api/teams/{id}/members/{user_id}", axum::routing::delete(remove_member))
        .route("/api/tools", get(list_tools))
        .route("/api/agent-tools", get(list_agent_tools))
        .route("/api/agent-tools/{id}", axum::routing::patch(update_agent_tool))
        .route(
            "/api/agents/{agent_id}/tools/{tool_id}",
            post(assign_tool).delete(unassign_tool),
        )
        .route("/api/trusted-data-policies", post(create_policy))
        .route(
            "/api/trusted-data-policies/{id}",
            get(get_policy).put(update_policy).delete(delete_policy),
        )
        .route(
            "/api/v1/mcp-servers/{server_id}/teams/{team_id}",
            post(grant_team_access).delete(revoke_team_access),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock Archestra API listening");
    }
    axum::serve(listener, app()).await
}

/// JSON logs filtered by `RUST_LOG`, `info` when unset.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .init();
}
