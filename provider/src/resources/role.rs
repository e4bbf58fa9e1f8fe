//! `archestra_role`: custom roles.
//!
//! Permissions are `resource:action` strings in state and a map of resource
//! to actions on the wire. Duplicate inputs collapse, and state lists
//! permissions grouped by resource in sorted order.

use archestra_client::{CreateRole, PermissionMap, Role, UpdateRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check, echoed, expect_body, expect_deleted, fetch, Fetched};
use crate::diag::{AttributePath, Diagnostic, Diagnostics};
use crate::framework::{OperationContext, Resource};
use crate::schema::{Attribute, Schema};
use crate::value::{parse_uuid, Value};

pub const ALLOWED_ACTIONS: &[&str] = &["create", "read", "update", "delete", "admin", "cancel"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleModel {
    pub id: Value<String>,
    pub name: Value<String>,
    pub description: Value<String>,
    pub permissions: Value<Vec<String>>,
    pub created_at: Value<String>,
    pub updated_at: Value<String>,
}

impl RoleModel {
    fn from_server(role: Role) -> Self {
        Self {
            id: Value::Known(role.id.to_string()),
            name: Value::Known(role.name),
            description: Value::from_option(role.description),
            permissions: Value::Known(permission_list(&role.permission)),
            created_at: Value::from_option(role.created_at),
            updated_at: Value::from_option(role.updated_at),
        }
    }

    fn from_write(role: Role, plan: RoleModel) -> Self {
        Self {
            description: echoed(role.description.clone(), plan.description),
            ..Self::from_server(role)
        }
    }
}

/// Validate `resource:action` strings and group them by resource.
pub fn permission_map(permissions: &[String], diags: &mut Diagnostics) -> Option<PermissionMap> {
    let mut map = PermissionMap::new();
    let mut valid = true;
    for (i, permission) in permissions.iter().enumerate() {
        let path = AttributePath::root("permissions").index(i);
        let Some((resource, action)) = permission.split_once(':').filter(|(r, a)| !r.is_empty() && !a.is_empty())
        else {
            diags.push(
                Diagnostic::error(
                    "Invalid permission format",
                    format!("Permission \"{permission}\" must be in the form resource:action"),
                )
                .at(path),
            );
            valid = false;
            continue;
        };
        let action = action.to_lowercase();
        if !ALLOWED_ACTIONS.contains(&action.as_str()) {
            diags.push(
                Diagnostic::error(
                    "Invalid permission action",
                    format!(
                        "Action \"{action}\" is not allowed; valid actions are {}",
                        ALLOWED_ACTIONS.join(", ")
                    ),
                )
                .at(path),
            );
            valid = false;
            continue;
        }
        let actions = map.entry(resource.to_string()).or_default();
        if !actions.contains(&action) {
            actions.push(action);
        }
    }
    if valid && map.is_empty() {
        diags.push(
            Diagnostic::error("No valid permissions", "At least one valid resource:action permission is required")
                .at(AttributePath::root("permissions")),
        );
        return None;
    }
    valid.then_some(map)
}

pub fn permission_list(map: &PermissionMap) -> Vec<String> {
    map.iter()
        .flat_map(|(resource, actions)| actions.iter().map(move |action| format!("{resource}:{action}")))
        .collect()
}

pub struct RoleResource;

#[async_trait]
impl Resource for RoleResource {
    type Model = RoleModel;

    fn type_name(&self) -> &'static str {
        "archestra_role"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Manages a custom role with a set of permissions.",
            vec![
                Attribute::string("id")
                    .computed()
                    .use_state_for_unknown()
                    .describe("Role identifier"),
                Attribute::string("name").required().describe("Role name"),
                Attribute::string("description").optional().describe("Role description"),
                Attribute::string_list("permissions")
                    .required()
                    .describe("Permissions granted by this role, each in the form resource:action"),
                Attribute::string("created_at").computed().use_state_for_unknown(),
                Attribute::string("updated_at").computed(),
            ],
        )
    }

    async fn create(&self, ctx: OperationContext<'_>, plan: RoleModel, diags: &mut Diagnostics) -> Option<RoleModel> {
        let name = check(plan.name.required("name"), diags)?;
        let description = check(plan.description.for_request("description"), diags)?;
        let permissions = check(plan.permissions.required("permissions"), diags)?;
        let permission = permission_map(&permissions, diags)?;

        let body = CreateRole {
            name,
            description,
            permission,
        };
        let role = expect_body("create role", ctx.client.create_role(ctx.scope, &body, &[]).await, diags)?;
        tracing::info!(id = %role.id, "created role");
        Some(RoleModel::from_write(role, plan))
    }

    async fn read(&self, ctx: OperationContext<'_>, state: RoleModel, diags: &mut Diagnostics) -> Option<RoleModel> {
        let Some(id) = check(parse_uuid(&state.id, "id", "Role"), diags) else {
            return Some(state);
        };
        match fetch("read role", ctx.client.get_role(ctx.scope, id, &[]).await, diags) {
            Fetched::Found(role) => Some(RoleModel::from_server(role)),
            Fetched::Missing => {
                tracing::warn!(%id, "role no longer exists, removing from state");
                None
            }
            Fetched::Failed => Some(state),
        }
    }

    async fn update(
        &self,
        ctx: OperationContext<'_>,
        plan: RoleModel,
        state: RoleModel,
        diags: &mut Diagnostics,
    ) -> Option<RoleModel> {
        let id = check(parse_uuid(&state.id, "id", "Role"), diags)?;
        let name = check(plan.name.required("name"), diags)?;
        let description = check(plan.description.for_request("description"), diags)?;
        let permissions = check(plan.permissions.required("permissions"), diags)?;
        let permission = permission_map(&permissions, diags)?;

        let body = UpdateRole {
            name: Some(name),
            description,
            permission: Some(permission),
        };
        let role = expect_body("update role", ctx.client.update_role(ctx.scope, id, &body, &[]).await, diags)?;
        Some(RoleModel::from_write(role, plan))
    }

    async fn delete(&self, ctx: OperationContext<'_>, state: RoleModel, diags: &mut Diagnostics) {
        let Some(id) = check(parse_uuid(&state.id, "id", "Role"), diags) else {
            return;
        };
        expect_deleted("delete role", ctx.client.delete_role(ctx.scope, id, &[]).await, diags);
    }
}
