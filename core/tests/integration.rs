//! Full lifecycle tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises the client over
//! real HTTP through `ReqwestTransport`. Validates that request building,
//! transport, and response dispatch agree with an actual server.

use std::sync::Arc;

use archestra_client::{
    AddTeamMember, ApiKeyAuth, ArchestraClient, CancellationToken, CreateRole, CreateTeam,
    CreateTrustedDataPolicy, CreateUser, CreateUserRoleAssignment, ListAgentToolsParams, Outcome,
    PolicyAction, PolicyOperator, ReqwestTransport, ToolResultTreatment, UpdateAgentTool, UpdateRole,
    UpdateUser,
};
use mock_server::{DEMO_AGENT_ID, DEMO_MCP_SERVER_ID, READ_FILE_TOOL_ID};

async fn start() -> ArchestraClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    ArchestraClient::new(&format!("http://{addr}"), Arc::new(ReqwestTransport::new()))
        .unwrap()
        .with_editor(ApiKeyAuth::new("test-key"))
}

#[tokio::test(flavor = "multi_thread")]
async fn user_crud_lifecycle() {
    let client = start().await;
    let scope = CancellationToken::new();

    let input = CreateUser {
        email: "a@b".to_string(),
        name: "A".to_string(),
        email_verified: true,
        image: None,
        role: None,
        banned: false,
        ban_reason: None,
    };
    let created = client.create_user(&scope, &input, &[]).await.unwrap();
    assert_eq!(created.status(), 201);
    let user = created.into_success().unwrap();
    assert_eq!(user.email, "a@b");
    assert!(user.image.is_none());

    let fetched = client.get_user(&scope, user.id, &[]).await.unwrap().into_success().unwrap();
    assert_eq!(fetched, user);

    let patch = UpdateUser {
        banned: Some(true),
        ban_reason: Some("spam".to_string()),
        ..UpdateUser::default()
    };
    let updated = client.update_user(&scope, user.id, &patch, &[]).await.unwrap().into_success().unwrap();
    assert!(updated.banned);
    assert_eq!(updated.ban_reason.as_deref(), Some("spam"));

    let deleted = client.delete_user(&scope, user.id, &[]).await.unwrap();
    assert!(deleted.is_declared_success());

    let gone = client.get_user(&scope, user.id, &[]).await.unwrap();
    assert!(gone.is_not_found());
    assert_eq!(gone.body_excerpt(), "User not found");

    let again = client.delete_user(&scope, user.id, &[]).await.unwrap();
    assert!(again.is_not_found());
}

#[tokio::test(flavor = "multi_thread")]
async fn role_and_assignment_lifecycle() {
    let client = start().await;
    let scope = CancellationToken::new();

    let role = client
        .create_role(
            &scope,
            &CreateRole {
                name: "auditor".to_string(),
                description: None,
                permission: [("agent".to_string(), vec!["read".to_string()])].into(),
            },
            &[],
        )
        .await
        .unwrap()
        .into_success()
        .unwrap();
    assert!(role.created_at.is_some());

    let patch = UpdateRole {
        permission: Some([("agent".to_string(), vec!["read".to_string(), "update".to_string()])].into()),
        ..UpdateRole::default()
    };
    let updated = client.update_role(&scope, role.id, &patch, &[]).await.unwrap().into_success().unwrap();
    assert_eq!(updated.permission["agent"], vec!["read", "update"]);
    assert_eq!(updated.name, "auditor");

    let user = client
        .create_user(
            &scope,
            &CreateUser {
                email: "r@b".to_string(),
                name: "R".to_string(),
                email_verified: false,
                image: None,
                role: None,
                banned: false,
                ban_reason: None,
            },
            &[],
        )
        .await
        .unwrap()
        .into_success()
        .unwrap();

    let assignment = client
        .create_user_role_assignment(
            &scope,
            &CreateUserRoleAssignment {
                user_id: user.id,
                role_id: role.id,
            },
            &[],
        )
        .await
        .unwrap()
        .into_success()
        .unwrap();
    let fetched = client
        .get_user_role_assignment(&scope, assignment.id, &[])
        .await
        .unwrap()
        .into_success()
        .unwrap();
    assert_eq!(fetched, assignment);

    let removed = client.delete_user_role_assignment(&scope, assignment.id, &[]).await.unwrap();
    assert!(matches!(removed.outcome, Outcome::Empty { status: 204 }));

    let deleted = client.delete_role(&scope, role.id, &[]).await.unwrap();
    assert!(matches!(deleted.outcome, Outcome::Empty { status: 204 }));
}

#[tokio::test(flavor = "multi_thread")]
async fn team_members_and_grant() {
    let client = start().await;
    let scope = CancellationToken::new();

    let team = client
        .create_team(
            &scope,
            &CreateTeam {
                name: "platform".to_string(),
                description: Some("infra".to_string()),
            },
            &[],
        )
        .await
        .unwrap()
        .into_success()
        .unwrap();

    for (user_id, role) in [("u1", None), ("u2", Some("owner"))] {
        let input = AddTeamMember {
            user_id: user_id.to_string(),
            role: role.map(str::to_string),
        };
        let added = client.add_team_member(&scope, &team.id, &input, &[]).await.unwrap();
        assert!(added.is_declared_success());
    }
    let members = client
        .list_team_members(&scope, &team.id, &[])
        .await
        .unwrap()
        .into_success()
        .unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].role, "member");

    let granted = client
        .grant_team_mcp_server_access(&scope, DEMO_MCP_SERVER_ID, &team.id, &[])
        .await
        .unwrap();
    assert_eq!(granted.status(), 201);
    let revoked = client
        .revoke_team_mcp_server_access(&scope, DEMO_MCP_SERVER_ID, &team.id, &[])
        .await
        .unwrap();
    assert!(revoked.is_declared_success());

    let deleted = client.delete_team(&scope, &team.id, &[]).await.unwrap();
    assert!(deleted.is_declared_success());
    assert!(client.get_team(&scope, &team.id, &[]).await.unwrap().is_not_found());
}

#[tokio::test(flavor = "multi_thread")]
async fn agent_tool_and_policy_lifecycle() {
    let client = start().await;
    let scope = CancellationToken::new();

    let tools = client.list_tools(&scope, &[]).await.unwrap().into_success().unwrap().into_vec();
    assert!(tools.iter().any(|t| t.id == READ_FILE_TOOL_ID));

    let assigned = client
        .assign_tool_to_agent(&scope, DEMO_AGENT_ID, READ_FILE_TOOL_ID, &[])
        .await
        .unwrap();
    assert!(assigned.is_declared_success());

    let params = ListAgentToolsParams {
        agent_id: Some(DEMO_AGENT_ID),
        limit: Some(100),
    };
    let rows = client
        .list_agent_tools(&scope, &params, &[])
        .await
        .unwrap()
        .into_success()
        .unwrap()
        .into_vec();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];

    let patch = UpdateAgentTool {
        tool_result_treatment: Some(ToolResultTreatment::Trusted),
        ..UpdateAgentTool::default()
    };
    let patched = client.update_agent_tool(&scope, row.id, &patch, &[]).await.unwrap().into_success().unwrap();
    assert_eq!(patched.tool_result_treatment, "trusted");

    let policy = client
        .create_trusted_data_policy(
            &scope,
            &CreateTrustedDataPolicy {
                agent_tool_id: row.id,
                description: "tmp files".to_string(),
                attribute_path: "path".to_string(),
                operator: PolicyOperator::StartsWith,
                value: "/tmp".to_string(),
                action: PolicyAction::BlockAlways,
            },
            &[],
        )
        .await
        .unwrap()
        .into_success()
        .unwrap();
    assert_eq!(policy.action, "block_always");

    let deleted = client.delete_trusted_data_policy(&scope, policy.id, &[]).await.unwrap();
    assert!(deleted.is_declared_success());

    let unassigned = client
        .unassign_tool_from_agent(&scope, DEMO_AGENT_ID, READ_FILE_TOOL_ID, &[])
        .await
        .unwrap();
    assert!(unassigned.is_declared_success());
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ArchestraClient::new(&format!("http://{addr}"), Arc::new(ReqwestTransport::new())).unwrap();
    let err = client.list_tools(&CancellationToken::new(), &[]).await.unwrap_err();
    assert!(matches!(err, archestra_client::ApiError::Transport(_)));
}
