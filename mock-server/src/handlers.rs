use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ApiFailure, ApiResult};
use crate::model::*;
use crate::{Db, CREATED_BY, ORGANIZATION_ID};

const TREATMENTS: &[&str] = &["trusted", "untrusted"];
const OPERATORS: &[&str] = &["equal", "notEqual", "contains", "notContains", "startsWith", "endsWith", "regex"];
const ACTIONS: &[&str] = &["mark_as_trusted", "block_always", "sanitize_with_dual_llm"];

fn timestamp() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    millis.to_string()
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> ApiResult<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ApiFailure::BadRequest(format!("invalid {field} '{value}'")))
    }
}

// --- users ---

pub async fn create_user(State(db): State<Db>, Json(input): Json<CreateUser>) -> ApiResult<(StatusCode, Json<User>)> {
    let mut store = db.write().await;
    if store.users.values().any(|u| u.email == input.email) {
        return Err(ApiFailure::Conflict(format!("email {} already in use", input.email)));
    }
    let user = User {
        id: Uuid::new_v4(),
        email: input.email,
        name: input.name,
        email_verified: input.email_verified,
        image: input.image,
        role: input.role,
        banned: input.banned,
        ban_reason: input.ban_reason,
    };
    tracing::info!(id = %user.id, "user created");
    store.users.insert(user.id, user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<User>> {
    let store = db.read().await;
    store.users.get(&id).cloned().map(Json).ok_or(ApiFailure::NotFound("User"))
}

pub async fn update_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUser>,
) -> ApiResult<Json<User>> {
    let mut store = db.write().await;
    let user = store.users.get_mut(&id).ok_or(ApiFailure::NotFound("User"))?;
    if let Some(email) = input.email {
        user.email = email;
    }
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(verified) = input.email_verified {
        user.email_verified = verified;
    }
    if let Some(banned) = input.banned {
        user.banned = banned;
    }
    if input.image.is_some() {
        user.image = input.image;
    }
    if input.role.is_some() {
        user.role = input.role;
    }
    if input.ban_reason.is_some() {
        user.ban_reason = input.ban_reason;
    }
    Ok(Json(user.clone()))
}

pub async fn delete_user(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    store.users.remove(&id).ok_or(ApiFailure::NotFound("User"))?;
    store.assignments.retain(|_, a| a.user_id != id);
    tracing::info!(%id, "user deleted");
    Ok(Json(json!({ "success": true })))
}

// --- roles ---

pub async fn create_role(State(db): State<Db>, Json(input): Json<CreateRole>) -> ApiResult<(StatusCode, Json<Role>)> {
    if input.permission.values().all(Vec::is_empty) {
        return Err(ApiFailure::BadRequest("permission must grant at least one action".to_string()));
    }
    let mut store = db.write().await;
    if store.roles.values().any(|r| r.name == input.name) {
        return Err(ApiFailure::Conflict(format!("role {} already exists", input.name)));
    }
    let now = timestamp();
    let role = Role {
        id: Uuid::new_v4(),
        name: input.name,
        description: input.description,
        permission: input.permission,
        created_at: now.clone(),
        updated_at: now,
    };
    tracing::info!(id = %role.id, "role created");
    store.roles.insert(role.id, role.clone());
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn get_role(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<Role>> {
    let store = db.read().await;
    store.roles.get(&id).cloned().map(Json).ok_or(ApiFailure::NotFound("Role"))
}

pub async fn update_role(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRole>,
) -> ApiResult<Json<Role>> {
    let mut store = db.write().await;
    let role = store.roles.get_mut(&id).ok_or(ApiFailure::NotFound("Role"))?;
    if let Some(name) = input.name {
        role.name = name;
    }
    if input.description.is_some() {
        role.description = input.description;
    }
    if let Some(permission) = input.permission {
        role.permission = permission;
    }
    role.updated_at = timestamp();
    Ok(Json(role.clone()))
}

pub async fn delete_role(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    store.roles.remove(&id).ok_or(ApiFailure::NotFound("Role"))?;
    store.assignments.retain(|_, a| a.role_id != id);
    Ok(StatusCode::NO_CONTENT)
}

// --- user role assignments ---

pub async fn create_assignment(
    State(db): State<Db>,
    Json(input): Json<CreateAssignment>,
) -> ApiResult<(StatusCode, Json<Assignment>)> {
    let mut store = db.write().await;
    if !store.users.contains_key(&input.user_id) {
        return Err(ApiFailure::NotFound("User"));
    }
    if !store.roles.contains_key(&input.role_id) {
        return Err(ApiFailure::NotFound("Role"));
    }
    let assignment = Assignment {
        id: Uuid::new_v4(),
        user_id: input.user_id,
        role_id: input.role_id,
    };
    store.assignments.insert(assignment.id, assignment.clone());
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn get_assignment(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<Assignment>> {
    let store = db.read().await;
    store
        .assignments
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(ApiFailure::NotFound("Assignment"))
}

pub async fn delete_assignment(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    store
        .assignments
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(ApiFailure::NotFound("Assignment"))
}

// --- teams ---

pub async fn create_team(State(db): State<Db>, Json(input): Json<CreateTeam>) -> ApiResult<Json<Team>> {
    let mut store = db.write().await;
    let team = Team {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        description: input.description,
        organization_id: ORGANIZATION_ID.to_string(),
        created_by: CREATED_BY.to_string(),
    };
    tracing::info!(id = %team.id, "team created");
    store.members.insert(team.id.clone(), Vec::new());
    store.teams.insert(team.id.clone(), team.clone());
    Ok(Json(team))
}

pub async fn get_team(State(db): State<Db>, Path(id): Path<String>) -> ApiResult<Json<Team>> {
    let store = db.read().await;
    store.teams.get(&id).cloned().map(Json).ok_or(ApiFailure::NotFound("Team"))
}

pub async fn update_team(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTeam>,
) -> ApiResult<Json<Team>> {
    let mut store = db.write().await;
    let team = store.teams.get_mut(&id).ok_or(ApiFailure::NotFound("Team"))?;
    if let Some(name) = input.name {
        team.name = name;
    }
    if input.description.is_some() {
        team.description = input.description;
    }
    Ok(Json(team.clone()))
}

pub async fn delete_team(State(db): State<Db>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    store.teams.remove(&id).ok_or(ApiFailure::NotFound("Team"))?;
    store.members.remove(&id);
    store.grants.retain(|(_, team)| *team != id);
    tracing::info!(%id, "team deleted");
    Ok(Json(json!({ "success": true })))
}

pub async fn list_members(State(db): State<Db>, Path(id): Path<String>) -> ApiResult<Json<Vec<Member>>> {
    let store = db.read().await;
    store.members.get(&id).cloned().map(Json).ok_or(ApiFailure::NotFound("Team"))
}

pub async fn add_member(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<AddMember>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    let mut store = db.write().await;
    let members = store.members.get_mut(&id).ok_or(ApiFailure::NotFound("Team"))?;
    if members.iter().any(|m| m.user_id == input.user_id) {
        return Err(ApiFailure::Conflict(format!("{} is already a member", input.user_id)));
    }
    let member = Member {
        user_id: input.user_id,
        role: input.role.unwrap_or_else(|| "member".to_string()),
    };
    members.push(member.clone());
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_member(
    State(db): State<Db>,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let members = store.members.get_mut(&id).ok_or(ApiFailure::NotFound("Team"))?;
    let before = members.len();
    members.retain(|m| m.user_id != user_id);
    if members.len() == before {
        return Err(ApiFailure::NotFound("Member"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- tools and agent tools ---

pub async fn list_tools(State(db): State<Db>) -> Json<Vec<Tool>> {
    Json(db.read().await.tools.clone())
}

pub async fn list_agent_tools(
    State(db): State<Db>,
    Query(query): Query<AgentToolQuery>,
) -> Json<Page<AgentTool>> {
    let store = db.read().await;
    let matching: Vec<AgentTool> = store
        .agent_tools
        .iter()
        .filter(|at| query.agent_id.map_or(true, |agent| at.agent.id == agent))
        .cloned()
        .collect();
    let total = matching.len();
    let limit = query.limit.unwrap_or(20);
    Json(Page {
        data: matching.into_iter().take(limit).collect(),
        pagination: Pagination { total, limit },
    })
}

pub async fn assign_tool(
    State(db): State<Db>,
    Path((agent_id, tool_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let agent = store
        .agents
        .iter()
        .find(|a| a.id == agent_id)
        .cloned()
        .ok_or(ApiFailure::NotFound("Agent"))?;
    let tool = store
        .tools
        .iter()
        .find(|t| t.id == tool_id)
        .map(|t| ToolRef {
            id: t.id,
            name: t.name.clone(),
        })
        .ok_or(ApiFailure::NotFound("Tool"))?;
    if store.agent_tools.iter().any(|at| at.agent.id == agent_id && at.tool.id == tool_id) {
        return Err(ApiFailure::Conflict("tool already assigned to agent".to_string()));
    }
    store.agent_tools.push(AgentTool {
        id: Uuid::new_v4(),
        agent,
        tool,
        allow_usage_when_untrusted_data_is_present: false,
        tool_result_treatment: "untrusted".to_string(),
        response_modifier_template: None,
    });
    Ok(Json(json!({ "success": true })))
}

pub async fn unassign_tool(
    State(db): State<Db>,
    Path((agent_id, tool_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let position = store
        .agent_tools
        .iter()
        .position(|at| at.agent.id == agent_id && at.tool.id == tool_id)
        .ok_or(ApiFailure::NotFound("Agent tool"))?;
    let removed = store.agent_tools.remove(position);
    store.policies.retain(|_, p| p.agent_tool_id != removed.id);
    Ok(Json(json!({ "success": true })))
}

pub async fn update_agent_tool(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateAgentTool>,
) -> ApiResult<Json<AgentTool>> {
    if let Some(treatment) = &input.tool_result_treatment {
        one_of("toolResultTreatment", treatment, TREATMENTS)?;
    }
    let mut store = db.write().await;
    let at = store
        .agent_tools
        .iter_mut()
        .find(|at| at.id == id)
        .ok_or(ApiFailure::NotFound("Agent tool"))?;
    if let Some(allow) = input.allow_usage_when_untrusted_data_is_present {
        at.allow_usage_when_untrusted_data_is_present = allow;
    }
    if let Some(treatment) = input.tool_result_treatment {
        at.tool_result_treatment = treatment;
    }
    if input.response_modifier_template.is_some() {
        at.response_modifier_template = input.response_modifier_template;
    }
    Ok(Json(at.clone()))
}

// --- trusted data policies ---

pub async fn create_policy(State(db): State<Db>, Json(input): Json<CreatePolicy>) -> ApiResult<Json<Policy>> {
    let action = input.action.unwrap_or_else(|| "mark_as_trusted".to_string());
    one_of("operator", &input.operator, OPERATORS)?;
    one_of("action", &action, ACTIONS)?;
    let mut store = db.write().await;
    if !store.agent_tools.iter().any(|at| at.id == input.agent_tool_id) {
        return Err(ApiFailure::BadRequest(format!("agent tool {} does not exist", input.agent_tool_id)));
    }
    let policy = Policy {
        id: Uuid::new_v4(),
        agent_tool_id: input.agent_tool_id,
        description: input.description,
        attribute_path: input.attribute_path,
        operator: input.operator,
        value: input.value,
        action,
    };
    store.policies.insert(policy.id, policy.clone());
    Ok(Json(policy))
}

pub async fn get_policy(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<Policy>> {
    let store = db.read().await;
    store.policies.get(&id).cloned().map(Json).ok_or(ApiFailure::NotFound("Policy"))
}

pub async fn update_policy(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdatePolicy>,
) -> ApiResult<Json<Policy>> {
    if let Some(operator) = &input.operator {
        one_of("operator", operator, OPERATORS)?;
    }
    if let Some(action) = &input.action {
        one_of("action", action, ACTIONS)?;
    }
    let mut store = db.write().await;
    let policy = store.policies.get_mut(&id).ok_or(ApiFailure::NotFound("Policy"))?;
    if let Some(agent_tool_id) = input.agent_tool_id {
        policy.agent_tool_id = agent_tool_id;
    }
    if let Some(description) = input.description {
        policy.description = description;
    }
    if let Some(path) = input.attribute_path {
        policy.attribute_path = path;
    }
    if let Some(operator) = input.operator {
        policy.operator = operator;
    }
    if let Some(value) = input.value {
        policy.value = value;
    }
    if let Some(action) = input.action {
        policy.action = action;
    }
    Ok(Json(policy.clone()))
}

pub async fn delete_policy(State(db): State<Db>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    store.policies.remove(&id).ok_or(ApiFailure::NotFound("Policy"))?;
    Ok(Json(json!({ "success": true })))
}

// --- MCP server team access ---

pub async fn grant_team_access(
    State(db): State<Db>,
    Path((server_id, team_id)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let known_server = store
        .tools
        .iter()
        .any(|t| t.mcp_server.as_ref().is_some_and(|s| s.id == server_id));
    if !known_server {
        return Err(ApiFailure::NotFound("MCP server"));
    }
    if !store.teams.contains_key(&team_id) {
        return Err(ApiFailure::NotFound("Team"));
    }
    store.grants.insert((server_id, team_id));
    Ok(StatusCode::CREATED)
}

pub async fn revoke_team_access(
    State(db): State<Db>,
    Path((server_id, team_id)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    if store.grants.remove(&(server_id, team_id)) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiFailure::NotFound("Grant"))
    }
}
