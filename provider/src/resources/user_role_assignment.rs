//! `archestra_user_role_assignment`: binds a custom role to a user.
//!
//! The assignment row is the identity, so both references force
//! replacement and an in-place update is refused.

use archestra_client::{CreateUserRoleAssignment, UserRoleAssignment};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check, expect_body, expect_deleted, fetch, Fetched};
use crate::diag::{Diagnostic, Diagnostics};
use crate::framework::{OperationContext, Resource};
use crate::schema::{Attribute, Schema};
use crate::value::{parse_uuid, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRoleAssignmentModel {
    pub id: Value<String>,
    pub user_id: Value<String>,
    pub role_id: Value<String>,
}

impl From<UserRoleAssignment> for UserRoleAssignmentModel {
    fn from(assignment: UserRoleAssignment) -> Self {
        Self {
            id: Value::Known(assignment.id.to_string()),
            user_id: Value::Known(assignment.user_id.to_string()),
            role_id: Value::Known(assignment.role_id.to_string()),
        }
    }
}

pub struct UserRoleAssignmentResource;

#[async_trait]
impl Resource for UserRoleAssignmentResource {
    type Model = UserRoleAssignmentModel;

    fn type_name(&self) -> &'static str {
        "archestra_user_role_assignment"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Assigns a custom role to a user.",
            vec![
                Attribute::string("id")
                    .computed()
                    .use_state_for_unknown()
                    .describe("Assignment identifier"),
                Attribute::string("user_id").required().requires_replace().describe("User to assign"),
                Attribute::string("role_id").required().requires_replace().describe("Custom role to assign"),
            ],
        )
    }

    async fn create(
        &self,
        ctx: OperationContext<'_>,
        plan: UserRoleAssignmentModel,
        diags: &mut Diagnostics,
    ) -> Option<UserRoleAssignmentModel> {
        let user_id = check(parse_uuid(&plan.user_id, "user_id", "User"), diags);
        let role_id = check(parse_uuid(&plan.role_id, "role_id", "Role"), diags);
        let body = CreateUserRoleAssignment {
            user_id: user_id?,
            role_id: role_id?,
        };
        let result = ctx.client.create_user_role_assignment(ctx.scope, &body, &[]).await;
        let assignment = expect_body("create user role assignment", result, diags)?;
        tracing::info!(id = %assignment.id, "assigned role to user");
        Some(assignment.into())
    }

    async fn read(
        &self,
        ctx: OperationContext<'_>,
        state: UserRoleAssignmentModel,
        diags: &mut Diagnostics,
    ) -> Option<UserRoleAssignmentModel> {
        let Some(id) = check(parse_uuid(&state.id, "id", "Assignment"), diags) else {
            return Some(state);
        };
        let result = ctx.client.get_user_role_assignment(ctx.scope, id, &[]).await;
        match fetch("read user role assignment", result, diags) {
            Fetched::Found(assignment) => Some(assignment.into()),
            Fetched::Missing => None,
            Fetched::Failed => Some(state),
        }
    }

    async fn update(
        &self,
        _ctx: OperationContext<'_>,
        _plan: UserRoleAssignmentModel,
        _state: UserRoleAssignmentModel,
        diags: &mut Diagnostics,
    ) -> Option<UserRoleAssignmentModel> {
        diags.push(Diagnostic::error(
            "Update Not Supported",
            "User role assignments cannot be changed in place; changing user_id or role_id replaces the assignment.",
        ));
        None
    }

    async fn delete(&self, ctx: OperationContext<'_>, state: UserRoleAssignmentModel, diags: &mut Diagnostics) {
        let Some(id) = check(parse_uuid(&state.id, "id", "Assignment"), diags) else {
            return;
        };
        let result = ctx.client.delete_user_role_assignment(ctx.scope, id, &[]).await;
        expect_deleted("delete user role assignment", result, diags);
    }
}
