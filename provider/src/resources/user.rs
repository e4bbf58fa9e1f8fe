//! `archestra_user`.
//!
//! `image`, `role`, and `ban_reason` are sent only when set. The PATCH body
//! therefore cannot clear them: removing one from the config leaves the
//! server value in place and the next read brings it back.

use archestra_client::{CreateUser, UpdateUser, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check, echoed, expect_body, expect_deleted, fetch, Fetched};
use crate::diag::{Diagnostic, Diagnostics};
use crate::framework::{OperationContext, Resource};
use crate::schema::{Attribute, Schema};
use crate::value::{parse_uuid, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserModel {
    pub id: Value<String>,
    pub name: Value<String>,
    pub email: Value<String>,
    pub email_verified: Value<bool>,
    pub image: Value<String>,
    pub role: Value<String>,
    pub banned: Value<bool>,
    pub ban_reason: Value<String>,
}

impl UserModel {
    /// State as read from the server: absent optionals become null.
    fn from_server(user: User) -> Self {
        Self {
            id: Value::Known(user.id.to_string()),
            name: Value::Known(user.name),
            email: Value::Known(user.email),
            email_verified: Value::Known(user.email_verified),
            image: Value::from_option(user.image),
            role: Value::from_option(user.role),
            banned: Value::Known(user.banned),
            ban_reason: Value::from_option(user.ban_reason),
        }
    }

    /// State after a write: optionals the server left out keep the plan.
    fn from_write(user: User, plan: UserModel) -> Self {
        Self {
            image: echoed(user.image.clone(), plan.image),
            role: echoed(user.role.clone(), plan.role),
            ban_reason: echoed(user.ban_reason.clone(), plan.ban_reason),
            ..Self::from_server(user)
        }
    }
}

fn create_body(plan: &UserModel) -> Result<CreateUser, Diagnostic> {
    Ok(CreateUser {
        email: plan.email.required("email")?,
        name: plan.name.required("name")?,
        email_verified: plan.email_verified.for_request("email_verified")?.unwrap_or(false),
        image: plan.image.for_request("image")?,
        role: plan.role.for_request("role")?,
        banned: plan.banned.for_request("banned")?.unwrap_or(false),
        ban_reason: plan.ban_reason.for_request("ban_reason")?,
    })
}

fn update_body(plan: &UserModel) -> Result<UpdateUser, Diagnostic> {
    Ok(UpdateUser {
        email: Some(plan.email.required("email")?),
        name: Some(plan.name.required("name")?),
        email_verified: plan.email_verified.for_request("email_verified")?,
        image: plan.image.for_request("image")?,
        role: plan.role.for_request("role")?,
        banned: plan.banned.for_request("banned")?,
        ban_reason: plan.ban_reason.for_request("ban_reason")?,
    })
}

pub struct UserResource;

#[async_trait]
impl Resource for UserResource {
    type Model = UserModel;

    fn type_name(&self) -> &'static str {
        "archestra_user"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Manages an Archestra user.",
            vec![
                Attribute::string("id")
                    .computed()
                    .use_state_for_unknown()
                    .describe("User identifier"),
                Attribute::string("name").required().describe("The name of the user"),
                Attribute::string("email").required().describe("The email address of the user"),
                Attribute::bool("email_verified")
                    .default_value(false)
                    .describe("Whether the email is verified"),
                Attribute::string("image").optional().describe("Profile image URL"),
                Attribute::string("role").optional().describe("User role"),
                Attribute::bool("banned").default_value(false).describe("Whether the user is banned"),
                Attribute::string("ban_reason").optional().describe("Reason for ban (if banned)"),
            ],
        )
    }

    async fn create(&self, ctx: OperationContext<'_>, plan: UserModel, diags: &mut Diagnostics) -> Option<UserModel> {
        let body = check(create_body(&plan), diags)?;
        let result = ctx.client.create_user(ctx.scope, &body, &[]).await;
        let user = expect_body("create user", result, diags)?;
        tracing::info!(id = %user.id, "created user");
        Some(UserModel::from_write(user, plan))
    }

    async fn read(&self, ctx: OperationContext<'_>, state: UserModel, diags: &mut Diagnostics) -> Option<UserModel> {
        let Some(id) = check(parse_uuid(&state.id, "id", "User"), diags) else {
            return Some(state);
        };
        match fetch("read user", ctx.client.get_user(ctx.scope, id, &[]).await, diags) {
            Fetched::Found(user) => Some(UserModel::from_server(user)),
            Fetched::Missing => {
                tracing::warn!(%id, "user no longer exists, removing from state");
                None
            }
            Fetched::Failed => Some(state),
        }
    }

    async fn update(
        &self,
        ctx: OperationContext<'_>,
        plan: UserModel,
        state: UserModel,
        diags: &mut Diagnostics,
    ) -> Option<UserModel> {
        let id = check(parse_uuid(&state.id, "id", "User"), diags)?;
        let body = check(update_body(&plan), diags)?;
        let result = ctx.client.update_user(ctx.scope, id, &body, &[]).await;
        let user = expect_body("update user", result, diags)?;
        Some(UserModel::from_write(user, plan))
    }

    async fn delete(&self, ctx: OperationContext<'_>, state: UserModel, diags: &mut Diagnostics) {
        let Some(id) = check(parse_uuid(&state.id, "id", "User"), diags) else {
            return;
        };
        expect_deleted("delete user", ctx.client.delete_user(ctx.scope, id, &[]).await, diags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_omits_null_optionals() {
        let plan = UserModel {
            email: "a@b".to_string().into(),
            name: "A".to_string().into(),
            email_verified: true.into(),
            banned: false.into(),
            ..UserModel::default()
        };
        let body = serde_json::to_value(create_body(&plan).unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"email": "a@b", "name": "A", "emailVerified": true, "banned": false})
        );
    }

    #[test]
    fn unknown_optional_blocks_the_write() {
        let plan = UserModel {
            email: "a@b".to_string().into(),
            name: "A".to_string().into(),
            role: Value::Unknown,
            ..UserModel::default()
        };
        let diag = create_body(&plan).unwrap_err();
        assert_eq!(diag.summary, "Unknown Value During Apply");
    }

    #[test]
    fn write_back_keeps_planned_optional_the_server_omitted() {
        let user: User = serde_json::from_str(
            r#"{"id":"11111111-1111-1111-1111-111111111111","email":"a@b","name":"A","emailVerified":false,"banned":false}"#,
        )
        .unwrap();
        let plan = UserModel {
            image: "http://img".to_string().into(),
            ..UserModel::default()
        };
        let state = UserModel::from_write(user.clone(), plan);
        assert_eq!(state.image, Value::Known("http://img".to_string()));
        assert_eq!(state.role, Value::Null);

        let read = UserModel::from_server(user);
        assert_eq!(read.image, Value::Null);
    }
}
