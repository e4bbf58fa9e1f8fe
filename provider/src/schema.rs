//! Attribute schemas and the plan step the host runs against them.
//!
//! # Design
//! Schemas are plain data. [`Schema::plan`] applies what the markers mean
//! (config value wins, then the default, computed attributes become unknown
//! unless `UseStateForUnknown` keeps the prior value) and reports which
//! `RequiresReplace` attributes changed.

use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::diag::{AttributePath, Diagnostic, Diagnostics};
use crate::value::{is_unknown_marker, unknown_marker};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Bool,
    StringList,
    ObjectList(Vec<Attribute>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    UseStateForUnknown,
    RequiresReplace,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub presence: Presence,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Json>,
    pub plan_modifiers: Vec<PlanModifier>,
    pub description: &'static str,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            presence: Presence::Optional,
            sensitive: false,
            default: None,
            plan_modifiers: Vec::new(),
            description: "",
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttributeKind::String)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Bool)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::new(name, AttributeKind::StringList)
    }

    pub fn object_list(name: &'static str, attributes: Vec<Attribute>) -> Self {
        Self::new(name, AttributeKind::ObjectList(attributes))
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    #[must_use]
    pub fn computed(mut self) -> Self {
        self.presence = Presence::Computed;
        self
    }

    #[must_use]
    pub fn optional_computed(mut self) -> Self {
        self.presence = Presence::OptionalComputed;
        self
    }

    /// Default used when the config leaves the attribute null. Implies
    /// optional + computed.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Json>) -> Self {
        self.presence = Presence::OptionalComputed;
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    #[must_use]
    pub fn use_state_for_unknown(mut self) -> Self {
        self.plan_modifiers.push(PlanModifier::UseStateForUnknown);
        self
    }

    #[must_use]
    pub fn requires_replace(mut self) -> Self {
        self.plan_modifiers.push(PlanModifier::RequiresReplace);
        self
    }

    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn has(&self, modifier: PlanModifier) -> bool {
        self.plan_modifiers.contains(&modifier)
    }

    fn is_computed(&self) -> bool {
        matches!(self.presence, Presence::Computed | Presence::OptionalComputed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

/// Result of planning one resource instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub planned: Json,
    /// Attributes whose change forces destroy-then-create.
    pub requires_replace: Vec<&'static str>,
}

impl PlannedChange {
    pub fn replaces(&self) -> bool {
        !self.requires_replace.is_empty()
    }
}

impl Schema {
    pub fn new(description: &'static str, attributes: Vec<Attribute>) -> Self {
        Self { description, attributes }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check a config object against the presence markers.
    pub fn validate_config(&self, config: &Json) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let empty = Map::new();
        let object = config.as_object().unwrap_or(&empty);
        for attribute in &self.attributes {
            let set = object.get(attribute.name).is_some_and(|v| !v.is_null());
            let path = AttributePath::root(attribute.name);
            match attribute.presence {
                Presence::Required if !set => diags.push(
                    Diagnostic::error(
                        "Missing Required Attribute",
                        format!("The attribute \"{}\" is required.", attribute.name),
                    )
                    .at(path),
                ),
                Presence::Computed if set => diags.push(
                    Diagnostic::error(
                        "Invalid Configuration",
                        format!("The attribute \"{}\" is computed and cannot be set.", attribute.name),
                    )
                    .at(path),
                ),
                _ => {}
            }
        }
        for key in object.keys() {
            if self.attribute(key).is_none() {
                diags.push(
                    Diagnostic::error("Unsupported Attribute", format!("The attribute \"{key}\" is not expected here."))
                        .at(AttributePath::root(key)),
                );
            }
        }
        diags
    }

    /// Compute the planned state for `config` given the prior state, if any.
    pub fn plan(&self, prior: Option<&Json>, config: &Json) -> PlannedChange {
        let mut planned = Map::new();
        let mut requires_replace = Vec::new();

        for attribute in &self.attributes {
            let configured = config.get(attribute.name).filter(|v| !v.is_null()).cloned();
            let prior_value = prior
                .and_then(|p| p.get(attribute.name))
                .filter(|v| !v.is_null() && !is_unknown_marker(v));

            let value = if let Some(value) = configured {
                value
            } else if let Some(default) = &attribute.default {
                default.clone()
            } else if attribute.is_computed() {
                match prior_value {
                    Some(prior) if attribute.has(PlanModifier::UseStateForUnknown) => prior.clone(),
                    _ => unknown_marker(),
                }
            } else {
                Json::Null
            };
            let value = apply_nested_defaults(attribute, value);

            if let Some(prior) = prior {
                let before = prior.get(attribute.name).unwrap_or(&Json::Null);
                if attribute.has(PlanModifier::RequiresReplace) && !is_unknown_marker(&value) && *before != value {
                    requires_replace.push(attribute.name);
                }
            }
            planned.insert(attribute.name.to_string(), value);
        }

        PlannedChange {
            planned: Json::Object(planned),
            requires_replace,
        }
    }
}

fn apply_nested_defaults(attribute: &Attribute, value: Json) -> Json {
    let AttributeKind::ObjectList(children) = &attribute.kind else {
        return value;
    };
    let Json::Array(items) = value else {
        return value;
    };
    let items = items
        .into_iter()
        .map(|mut item| {
            if let Some(object) = item.as_object_mut() {
                for child in children {
                    let unset = object.get(child.name).map_or(true, Json::is_null);
                    if let (true, Some(default)) = (unset, &child.default) {
                        object.insert(child.name.to_string(), default.clone());
                    }
                }
            }
            item
        })
        .collect();
    Json::Array(items)
}
