use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::model::{AgentTool, Member, Policy, Role, Team, Tool, User};
use mock_server::{app, DEMO_AGENT_ID, DEMO_MCP_SERVER_ID, READ_FILE_TOOL_ID};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder().method(method).uri(uri).body(String::new()).unwrap()
}

async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn create_team(app: &Router, name: &str) -> Team {
    let resp = send(app, json_request("POST", "/api/teams", &format!(r#"{{"name":"{name}"}}"#))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- users ---

#[tokio::test]
async fn create_user_returns_201_without_absent_fields() {
    let app = app();
    let resp = send(
        &app,
        json_request(
            "POST",
            "/v1/users",
            r#"{"email":"a@b","name":"A","emailVerified":true,"banned":false}"#,
        ),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let json: Value = body_json(resp).await;
    assert_eq!(json["email"], "a@b");
    assert!(json.get("image").is_none());
    assert!(json.get("banReason").is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = app();
    let body = r#"{"email":"dup@b","name":"A"}"#;
    assert_eq!(send(&app, json_request("POST", "/v1/users", body)).await.status(), StatusCode::CREATED);
    let resp = send(&app, json_request("POST", "/v1/users", body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let json: Value = body_json(resp).await;
    assert!(json["error"]["message"].as_str().unwrap().contains("dup@b"));
}

#[tokio::test]
async fn patch_user_keeps_fields_not_sent() {
    let app = app();
    let resp = send(
        &app,
        json_request("POST", "/v1/users", r#"{"email":"p@b","name":"P","image":"http://img"}"#),
    )
    .await;
    let user: User = body_json(resp).await;

    let resp = send(&app, json_request("PATCH", &format!("/v1/users/{}", user.id), r#"{"name":"Q"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: User = body_json(resp).await;
    assert_eq!(updated.name, "Q");
    assert_eq!(updated.image.as_deref(), Some("http://img"));
}

#[tokio::test]
async fn get_user_not_found_carries_error_body() {
    let app = app();
    let resp = send(&app, empty_request("GET", "/v1/users/00000000-0000-0000-0000-000000000000")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: Value = body_json(resp).await;
    assert_eq!(json["error"]["message"], "User not found");
}

#[tokio::test]
async fn get_user_bad_uuid_returns_400() {
    let app = app();
    let resp = send(&app, empty_request("GET", "/v1/users/not-a-uuid")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- roles and assignments ---

#[tokio::test]
async fn role_delete_is_204_then_404() {
    let app = app();
    let resp = send(
        &app,
        json_request("POST", "/v1/roles", r#"{"name":"auditor","permission":{"agent":["read"]}}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let role: Role = body_json(resp).await;
    assert!(!role.created_at.is_empty());

    let uri = format!("/v1/roles/{}", role.id);
    let resp = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(send(&app, empty_request("DELETE", &uri)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_without_permissions_is_rejected() {
    let app = app();
    let resp = send(&app, json_request("POST", "/v1/roles", r#"{"name":"empty","permission":{}}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assignment_requires_existing_user_and_role() {
    let app = app();
    let resp = send(
        &app,
        json_request(
            "POST",
            "/v1/user-role-assignments",
            r#"{"userId":"00000000-0000-0000-0000-000000000001","roleId":"00000000-0000-0000-0000-000000000002"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- teams ---

#[tokio::test]
async fn team_members_default_to_member_role() {
    let app = app();
    let team = create_team(&app, "platform").await;
    assert_eq!(team.organization_id, mock_server::ORGANIZATION_ID);

    let members_uri = format!("/api/teams/{}/members", team.id);
    let resp = send(&app, json_request("POST", &members_uri, r#"{"userId":"u1"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    send(&app, json_request("POST", &members_uri, r#"{"userId":"u2","role":"owner"}"#)).await;

    let members: Vec<Member> = body_json(send(&app, empty_request("GET", &members_uri)).await).await;
    let roles: Vec<(&str, &str)> = members.iter().map(|m| (m.user_id.as_str(), m.role.as_str())).collect();
    assert_eq!(roles, vec![("u1", "member"), ("u2", "owner")]);

    let resp = send(&app, empty_request("DELETE", &format!("{members_uri}/u1"))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&app, empty_request("DELETE", &format!("{members_uri}/u1"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn team_put_updates_name() {
    let app = app();
    let team = create_team(&app, "old").await;
    let resp = send(&app, json_request("PUT", &format!("/api/teams/{}", team.id), r#"{"name":"new"}"#)).await;
    let updated: Team = body_json(resp).await;
    assert_eq!(updated.name, "new");
}

// --- tools and agent tools ---

#[tokio::test]
async fn tools_are_a_bare_array_with_seeded_entries() {
    let app = app();
    let tools: Vec<Tool> = body_json(send(&app, empty_request("GET", "/api/tools")).await).await;
    assert_eq!(tools.len(), 3);
    assert!(tools.iter().any(|t| t.mcp_server.is_none()));
}

#[tokio::test]
async fn agent_tool_assign_list_patch_unassign() {
    let app = app();
    let assign_uri = format!("/api/agents/{DEMO_AGENT_ID}/tools/{READ_FILE_TOOL_ID}");
    assert_eq!(send(&app, empty_request("POST", &assign_uri)).await.status(), StatusCode::OK);
    assert_eq!(send(&app, empty_request("POST", &assign_uri)).await.status(), StatusCode::CONFLICT);

    let page: Value = body_json(
        send(&app, empty_request("GET", &format!("/api/agent-tools?agentId={DEMO_AGENT_ID}&limit=10"))).await,
    )
    .await;
    assert_eq!(page["pagination"]["total"], 1);
    let row: AgentTool = serde_json::from_value(page["data"][0].clone()).unwrap();
    assert_eq!(row.tool.name, "read_file");
    assert_eq!(row.tool_result_treatment, "untrusted");

    let resp = send(
        &app,
        json_request("PATCH", &format!("/api/agent-tools/{}", row.id), r#"{"toolResultTreatment":"trusted"}"#),
    )
    .await;
    let patched: AgentTool = body_json(resp).await;
    assert_eq!(patched.tool_result_treatment, "trusted");

    let resp = send(
        &app,
        json_request("PATCH", &format!("/api/agent-tools/{}", row.id), r#"{"toolResultTreatment":"maybe"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(send(&app, empty_request("DELETE", &assign_uri)).await.status(), StatusCode::OK);
    assert_eq!(send(&app, empty_request("DELETE", &assign_uri)).await.status(), StatusCode::NOT_FOUND);
}

// --- policies ---

#[tokio::test]
async fn policy_defaults_action_and_validates_operator() {
    let app = app();
    send(&app, empty_request("POST", &format!("/api/agents/{DEMO_AGENT_ID}/tools/{READ_FILE_TOOL_ID}"))).await;
    let page: Value = body_json(send(&app, empty_request("GET", "/api/agent-tools")).await).await;
    let agent_tool_id = page["data"][0]["id"].as_str().unwrap().to_string();

    let body = format!(
        r#"{{"agentToolId":"{agent_tool_id}","description":"d","attributePath":"path","operator":"startsWith","value":"/tmp"}}"#
    );
    let resp = send(&app, json_request("POST", "/api/trusted-data-policies", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let policy: Policy = body_json(resp).await;
    assert_eq!(policy.action, "mark_as_trusted");

    let bad = body.replace("startsWith", "like");
    let resp = send(&app, json_request("POST", "/api/trusted-data-policies", &bad)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- grants ---

#[tokio::test]
async fn grant_then_revoke_team_access() {
    let app = app();
    let team = create_team(&app, "grantees").await;
    let uri = format!("/api/v1/mcp-servers/{DEMO_MCP_SERVER_ID}/teams/{}", team.id);

    assert_eq!(send(&app, empty_request("POST", &uri)).await.status(), StatusCode::CREATED);
    assert_eq!(send(&app, empty_request("DELETE", &uri)).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(send(&app, empty_request("DELETE", &uri)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn grant_for_unknown_team_is_404() {
    let app = app();
    let uri = format!("/api/v1/mcp-servers/{DEMO_MCP_SERVER_ID}/teams/nope");
    assert_eq!(send(&app, empty_request("POST", &uri)).await.status(), StatusCode::NOT_FOUND);
}
