//! `archestra_trusted_data_policy`: rules that decide how tool output is
//! trusted, blocked, or sanitized.

use std::str::FromStr;

use archestra_client::{
    CreateTrustedDataPolicy, PolicyAction, PolicyOperator, TrustedDataPolicy, UpdateTrustedDataPolicy,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{check, expect_body, expect_deleted, fetch, Fetched};
use crate::diag::{AttributePath, Diagnostic, Diagnostics};
use crate::framework::{OperationContext, Resource};
use crate::schema::{Attribute, Schema};
use crate::value::{parse_uuid, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustedDataPolicyModel {
    pub id: Value<String>,
    pub agent_tool_id: Value<String>,
    pub description: Value<String>,
    pub attribute_path: Value<String>,
    pub operator: Value<String>,
    pub value: Value<String>,
    pub action: Value<String>,
}

impl From<TrustedDataPolicy> for TrustedDataPolicyModel {
    fn from(policy: TrustedDataPolicy) -> Self {
        Self {
            id: Value::Known(policy.id.to_string()),
            agent_tool_id: Value::Known(policy.agent_tool_id.to_string()),
            description: Value::Known(policy.description),
            attribute_path: Value::Known(policy.attribute_path),
            operator: Value::Known(policy.operator),
            value: Value::Known(policy.value),
            action: Value::Known(policy.action),
        }
    }
}

fn parse_enum<T>(value: &Value<String>, attribute: &str, summary: &str) -> Result<T, Diagnostic>
where
    T: FromStr<Err = archestra_client::ParseEnumError>,
{
    let raw = value.required(attribute)?;
    T::from_str(&raw).map_err(|e| Diagnostic::error(summary, e.to_string()).at(AttributePath::root(attribute)))
}

/// Every field of a policy, validated. Used for both create and the full PUT.
fn policy_body(plan: &TrustedDataPolicyModel, diags: &mut Diagnostics) -> Option<CreateTrustedDataPolicy> {
    let agent_tool_id = check(parse_uuid(&plan.agent_tool_id, "agent_tool_id", "Agent Tool"), diags);
    let description = check(plan.description.required("description"), diags);
    let attribute_path = check(plan.attribute_path.required("attribute_path"), diags);
    let operator = check(parse_enum::<PolicyOperator>(&plan.operator, "operator", "Invalid Operator"), diags);
    let value = check(plan.value.required("value"), diags);
    let action = if plan.action.is_null() {
        Some(PolicyAction::default())
    } else {
        check(parse_enum::<PolicyAction>(&plan.action, "action", "Invalid Action"), diags)
    };
    Some(CreateTrustedDataPolicy {
        agent_tool_id: agent_tool_id?,
        description: description?,
        attribute_path: attribute_path?,
        operator: operator?,
        value: value?,
        action: action?,
    })
}

fn policy_id(state: &TrustedDataPolicyModel) -> Result<Uuid, Diagnostic> {
    parse_uuid(&state.id, "id", "Trusted Data Policy")
}

pub struct TrustedDataPolicyResource;

#[async_trait]
impl Resource for TrustedDataPolicyResource {
    type Model = TrustedDataPolicyModel;

    fn type_name(&self) -> &'static str {
        "archestra_trusted_data_policy"
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Manages a trusted data policy attached to an agent tool.",
            vec![
                Attribute::string("id")
                    .computed()
                    .use_state_for_unknown()
                    .describe("Policy identifier"),
                Attribute::string("agent_tool_id")
                    .required()
                    .describe("The agent tool this policy applies to"),
                Attribute::string("description").required().describe("Human-readable description"),
                Attribute::string("attribute_path")
                    .required()
                    .describe("Path of the attribute in the tool output to evaluate"),
                Attribute::string("operator").required().describe(
                    "Comparison operator: equal, notEqual, contains, notContains, startsWith, endsWith, regex",
                ),
                Attribute::string("value").required().describe("Value compared against the attribute"),
                Attribute::string("action")
                    .default_value(PolicyAction::default().as_str())
                    .describe("Action when the policy matches: mark_as_trusted, block_always, sanitize_with_dual_llm"),
            ],
        )
    }

    async fn create(
        &self,
        ctx: OperationContext<'_>,
        plan: TrustedDataPolicyModel,
        diags: &mut Diagnostics,
    ) -> Option<TrustedDataPolicyModel> {
        let body = policy_body(&plan, diags)?;
        let policy = expect_body(
            "create trusted data policy",
            ctx.client.create_trusted_data_policy(ctx.scope, &body, &[]).await,
            diags,
        )?;
        tracing::info!(id = %policy.id, "created trusted data policy");
        Some(policy.into())
    }

    async fn read(
        &self,
        ctx: OperationContext<'_>,
        state: TrustedDataPolicyModel,
        diags: &mut Diagnostics,
    ) -> Option<TrustedDataPolicyModel> {
        let Some(id) = check(policy_id(&state), diags) else {
            return Some(state);
        };
        match fetch(
            "read trusted data policy",
            ctx.client.get_trusted_data_policy(ctx.scope, id, &[]).await,
            diags,
        ) {
            Fetched::Found(policy) => Some(policy.into()),
            Fetched::Missing => {
                tracing::warn!(%id, "trusted data policy no longer exists, removing from state");
                None
            }
            Fetched::Failed => Some(state),
        }
    }

    async fn update(
        &self,
        ctx: OperationContext<'_>,
        plan: TrustedDataPolicyModel,
        state: TrustedDataPolicyModel,
        diags: &mut Diagnostics,
    ) -> Option<TrustedDataPolicyModel> {
        let id = check(policy_id(&state), diags);
        let body = policy_body(&plan, diags);
        let (id, body) = (id?, body?);
        let body = UpdateTrustedDataPolicy {
            agent_tool_id: Some(body.agent_tool_id),
            description: Some(body.description),
            attribute_path: Some(body.attribute_path),
            operator: Some(body.operator),
            value: Some(body.value),
            action: Some(body.action),
        };
        let policy = expect_body(
            "update trusted data policy",
            ctx.client.update_trusted_data_policy(ctx.scope, id, &body, &[]).await,
            diags,
        )?;
        Some(policy.into())
    }

    async fn delete(&self, ctx: OperationContext<'_>, state: TrustedDataPolicyModel, diags: &mut Diagnostics) {
        let Some(id) = check(policy_id(&state), diags) else {
            return;
        };
        let result = ctx.client.delete_trusted_data_policy(ctx.scope, id, &[]).await;
        expect_deleted("delete trusted data policy", result, diags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> TrustedDataPolicyModel {
        TrustedDataPolicyModel {
            agent_tool_id: Value::Known("00000000-0000-0000-0000-000000000001".into()),
            description: Value::Known("trust docs".into()),
            attribute_path: Value::Known("$.path".into()),
            operator: Value::Known("startsWith".into()),
            value: Value::Known("/docs".into()),
            ..TrustedDataPolicyModel::default()
        }
    }

    #[test]
    fn action_defaults_to_mark_as_trusted() {
        let mut diags = Diagnostics::new();
        let body = policy_body(&plan(), &mut diags).unwrap();
        assert_eq!(body.action, PolicyAction::MarkAsTrusted);
        assert_eq!(body.operator, PolicyOperator::StartsWith);
    }

    #[test]
    fn reports_every_invalid_field() {
        let bad = TrustedDataPolicyModel {
            agent_tool_id: Value::Known("not-a-uuid".into()),
            operator: Value::Known("equals".into()),
            action: Value::Known("allow".into()),
            ..plan()
        };
        let mut diags = Diagnostics::new();
        assert!(policy_body(&bad, &mut diags).is_none());
        let summaries: Vec<&str> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Invalid Agent Tool ID", "Invalid Operator", "Invalid Action"]);
    }
}
