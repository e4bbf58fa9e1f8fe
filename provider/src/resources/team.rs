//! `archestra_team`: a team plus its embedded member list.
//!
//! # Design
//! Members are reconciled by user id, never by position:
//! - create adds each declared member in input order after the team exists;
//! - update lists the server members, removes the ones no longer declared,
//!   then adds the newly declared ones;
//! - a member present on both sides keeps its server role even when the
//!   declared role differs (role changes are not reconciled).
//!
//! A failed member call leaves the team and any members already applied in
//! place. There is no rollback.

use std::collections::HashSet;

use archestra_client::{AddTeamMember, CreateTeam, Team, TeamMember, UpdateTeam};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check, echoed, expect_body, expect_deleted, expect_success, fetch, Fetched};
use crate::diag::{AttributePath, Diagnostics};
use crate::framework::{OperationContext, Resource};
use crate::schema::{Attribute, Schema};
use crate::value::Value;

pub const DEFAULT_MEMBER_ROLE: &str = "member";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamModel {
    pub id: Value<String>,
    pub name: Value<String>,
    pub description: Value<String>,
    pub organization_id: Value<String>,
    pub created_by: Value<String>,
    pub members: Value<Vec<TeamMemberModel>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMemberModel {
    pub user_id: String,
    pub role: Value<String>,
}

impl From<TeamMember> for TeamMemberModel {
    fn from(member: TeamMember) -> Self {
        Self {
            user_id: member.user_id,
            role: Value::Known(member.role),
        }
    }
}

impl TeamModel {
    fn with_team(team: Team, members: Value<Vec<TeamMemberModel>>) -> Self {
        Self {
            id: Value::Known(team.id),
            name: Value::Known(team.name),
            description: Value::from_option(team.description),
            organization_id: Value::Known(team.organization_id),
            created_by: Value::Known(team.created_by),
            members,
        }
    }
}

/// Member calls needed to move from `current` to `desired`.
#[derive(Debug, PartialEq)]
pub(crate) struct MemberChanges<'a> {
    /// Server-only user ids, in server order.
    pub remove: Vec<&'a str>,
    /// Desired-only members, in declaration order.
    pub add: Vec<&'a TeamMemberModel>,
}

pub(crate) fn member_changes<'a>(current: &'a [TeamMember], desired: &'a [TeamMemberModel]) -> MemberChanges<'a> {
    let wanted: HashSet<&str> = desired.iter().map(|m| m.user_id.as_str()).collect();
    let existing: HashSet<&str> = current.iter().map(|m| m.user_id.as_str()).collect();

    let remove = current
        .iter()
        .map(|m| m.user_id.as_str())
        .filter(|id| !wanted.contains(id))
        .collect();

    let mut seen = HashSet::new();
    let mut add = Vec::new();
    for member in desired {
        let id = member.user_id.as_str();
        if !existing.contains(id) && seen.insert(id) {
            add.push(member);
        }
    }

    MemberChanges { remove, add }
}

async fn add_member(
    ctx: OperationContext<'_>,
    team_id: &str,
    member: &TeamMemberModel,
    diags: &mut Diagnostics,
) -> bool {
    let input = AddTeamMember {
        user_id: member.user_id.clone(),
        role: member.role.as_known().cloned(),
    };
    let result = ctx.client.add_team_member(ctx.scope, team_id, &input, &[]).await;
    expect_success("add team member", result, diags)
}

/// Declared members with the role default applied. A role that is still
/// unknown at apply time is an error, not a default.
fn planned_members(plan: &Value<Vec<TeamMemberModel>>, diags: &mut Diagnostics) -> Option<Vec<TeamMemberModel>> {
    let Some(members) = plan.as_known() else {
        return Some(Vec::new());
    };
    let mut planned = Vec::with_capacity(members.len());
    let mut complete = true;
    for (i, member) in members.iter().enumerate() {
        match member.role.for_request("role") {
            Ok(role) => planned.push(TeamMemberModel {
                user_id: member.user_id.clone(),
                role: Value::Known(role.unwrap_or_else(|| DEFAULT_MEMBER_ROLE.to_string())),
            }),
            Err(diag) => {
                diags.push(diag.at(AttributePath::root("members").index(i).key("role")));
                complete = false;
            }
        }
    }
    complete.then_some(planned)
}

pub struct TeamResource;

#[async_trait]
impl Resource for TeamResource {
    type Model = TeamModel;

    fn type_name(&self) -> &'static str {
        "archestra_team"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Manages a team and its members.",
            vec![
                Attribute::string("id")
                    .computed()
                    .use_state_for_unknown()
                    .describe("Team identifier"),
                Attribute::string("name").required().describe("Team name"),
                Attribute::string("description").optional().describe("Team description"),
                Attribute::string("organization_id")
                    .computed()
                    .use_state_for_unknown()
                    .describe("The organization ID this team belongs to"),
                Attribute::string("created_by")
                    .computed()
                    .use_state_for_unknown()
                    .describe("User ID of the team creator"),
                Attribute::object_list(
                    "members",
                    vec![
                        Attribute::string("user_id").required().describe("User ID of the team member"),
                        Attribute::string("role")
                            .default_value(DEFAULT_MEMBER_ROLE)
                            .describe("Role of the team member (default: member)"),
                    ],
                )
                .optional()
                .describe("Team members"),
            ],
        )
    }

    async fn create(&self, ctx: OperationContext<'_>, plan: TeamModel, diags: &mut Diagnostics) -> Option<TeamModel> {
        let body = CreateTeam {
            name: check(plan.name.required("name"), diags)?,
            description: check(plan.description.for_request("description"), diags)?,
        };
        if plan.members.is_unknown() {
            check(plan.members.for_request("members"), diags)?;
        }
        let members = planned_members(&plan.members, diags)?;
        let team = expect_body("create team", ctx.client.create_team(ctx.scope, &body, &[]).await, diags)?;
        tracing::info!(id = %team.id, "created team");

        for member in &members {
            if !add_member(ctx, &team.id, member, diags).await {
                return None;
            }
        }

        let description = echoed(team.description.clone(), plan.description);
        let members = if plan.members.is_null() {
            Value::Null
        } else {
            Value::Known(members)
        };
        Some(TeamModel {
            description,
            ..TeamModel::with_team(team, members)
        })
    }

    async fn read(&self, ctx: OperationContext<'_>, state: TeamModel, diags: &mut Diagnostics) -> Option<TeamModel> {
        let Some(id) = check(state.id.required("id"), diags) else {
            return Some(state);
        };
        let team = match fetch("read team", ctx.client.get_team(ctx.scope, &id, &[]).await, diags) {
            Fetched::Found(team) => team,
            Fetched::Missing => {
                tracing::warn!(%id, "team no longer exists, removing from state");
                return None;
            }
            Fetched::Failed => return Some(state),
        };
        let members = match fetch(
            "read team members",
            ctx.client.list_team_members(ctx.scope, &id, &[]).await,
            diags,
        ) {
            Fetched::Found(members) => members,
            Fetched::Missing => return None,
            Fetched::Failed => return Some(state),
        };

        let members = if members.is_empty() && state.members.is_null() {
            Value::Null
        } else {
            Value::Known(members.into_iter().map(TeamMemberModel::from).collect())
        };
        Some(TeamModel::with_team(team, members))
    }

    async fn update(
        &self,
        ctx: OperationContext<'_>,
        plan: TeamModel,
        state: TeamModel,
        diags: &mut Diagnostics,
    ) -> Option<TeamModel> {
        let id = check(state.id.required("id"), diags)?;
        let body = UpdateTeam {
            name: Some(check(plan.name.required("name"), diags)?),
            description: check(plan.description.for_request("description"), diags)?,
        };
        if plan.members.is_unknown() {
            check(plan.members.for_request("members"), diags)?;
        }
        let desired = planned_members(&plan.members, diags)?;
        let team = expect_body("update team", ctx.client.update_team(ctx.scope, &id, &body, &[]).await, diags)?;

        let current = expect_body(
            "read current team members",
            ctx.client.list_team_members(ctx.scope, &id, &[]).await,
            diags,
        )?;
        let changes = member_changes(&current, &desired);
        tracing::debug!(team = %id, remove = changes.remove.len(), add = changes.add.len(), "reconciling members");

        for user_id in &changes.remove {
            let result = ctx.client.remove_team_member(ctx.scope, &id, user_id, &[]).await;
            expect_deleted("remove team member", result, diags);
            if diags.has_errors() {
                return None;
            }
        }
        for member in &changes.add {
            if !add_member(ctx, &id, member, diags).await {
                return None;
            }
        }

        let members: Vec<TeamMemberModel> = desired
            .iter()
            .map(|m| match current.iter().find(|c| c.user_id == m.user_id) {
                Some(kept) => TeamMemberModel::from(kept.clone()),
                None => m.clone(),
            })
            .collect();
        let members = if plan.members.is_null() {
            Value::Null
        } else {
            Value::Known(members)
        };
        let description = echoed(team.description.clone(), plan.description);
        Some(TeamModel {
            description,
            ..TeamModel::with_team(team, members)
        })
    }

    async fn delete(&self, ctx: OperationContext<'_>, state: TeamModel, diags: &mut Diagnostics) {
        let Some(id) = check(state.id.required("id"), diags) else {
            return;
        };
        expect_deleted("delete team", ctx.client.delete_team(ctx.scope, &id, &[]).await, diags);
    }
}
