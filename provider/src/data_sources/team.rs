//! `archestra_team` data source: a team and its members by id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::diag::{Diagnostic, Diagnostics};
use crate::framework::{DataSource, OperationContext};
use crate::resources::team::TeamMemberModel;
use crate::resources::{check, expect_body, fetch, Fetched};
use crate::schema::{Attribute, Schema};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamLookup {
    pub id: Value<String>,
    pub name: Value<String>,
    pub description: Value<String>,
    pub organization_id: Value<String>,
    pub created_by: Value<String>,
    pub members: Value<Vec<TeamMemberModel>>,
}

pub struct TeamDataSource;

#[async_trait]
impl DataSource for TeamDataSource {
    type Model = TeamLookup;

    fn type_name(&self) -> &'static str {
        "archestra_team"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Fetches a team and its members by id.",
            vec![
                Attribute::string("id").required().describe("Team identifier"),
                Attribute::string("name").computed(),
                Attribute::string("description").computed(),
                Attribute::string("organization_id").computed(),
                Attribute::string("created_by").computed(),
                Attribute::object_list(
                    "members",
                    vec![
                        Attribute::string("user_id").computed(),
                        Attribute::string("role").computed(),
                    ],
                )
                .computed(),
            ],
        )
    }

    async fn read(&self, ctx: OperationContext<'_>, config: TeamLookup, diags: &mut Diagnostics) -> Option<TeamLookup> {
        let id = check(config.id.required("id"), diags)?;
        let team = match fetch("read team", ctx.client.get_team(ctx.scope, &id, &[]).await, diags) {
            Fetched::Found(team) => team,
            Fetched::Missing => {
                diags.push(Diagnostic::error("Not Found", format!("Team with ID {id} not found")));
                return None;
            }
            Fetched::Failed => return None,
        };
        let members = expect_body(
            "read team members",
            ctx.client.list_team_members(ctx.scope, &id, &[]).await,
            diags,
        )?;
        Some(TeamLookup {
            id: Value::Known(team.id),
            name: Value::Known(team.name),
            description: Value::from_option(team.description),
            organization_id: Value::Known(team.organization_id),
            created_by: Value::Known(team.created_by),
            members: Value::Known(members.into_iter().map(TeamMemberModel::from).collect()),
        })
    }
}
