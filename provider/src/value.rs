//! Tri-state host values and the bridge to API optionals.
//!
//! The host distinguishes a known value, an explicit null, and a value that
//! is not computed yet. On the wire to the host these are a JSON value,
//! `null` (or an absent key), and the marker object `{"$unknown": true}`.
//!
//! Writing to the API: null omits the field, known includes it, unknown is
//! rejected. Reading from the API: absent becomes null, present becomes
//! known. Empty strings stay empty strings.

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::diag::{AttributePath, Diagnostic};

pub const UNKNOWN_MARKER: &str = "$unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<T> {
    Known(T),
    Null,
    Unknown,
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Null
    }
}

impl<T> From<T> for Value<T> {
    fn from(value: T) -> Self {
        Value::Known(value)
    }
}

impl<T> Value<T> {
    /// Read path: an absent API field becomes null.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Value::Null, Value::Known)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Value::Known(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn as_known(&self) -> Option<&T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Known value, or `default` when null or unknown.
    pub fn known_or(&self, default: T) -> T
    where
        T: Clone,
    {
        self.as_known().cloned().unwrap_or(default)
    }

    /// Write path for an optional field: null omits it.
    pub fn for_request(&self, attribute: &str) -> Result<Option<T>, Diagnostic>
    where
        T: Clone,
    {
        match self {
            Value::Known(v) => Ok(Some(v.clone())),
            Value::Null => Ok(None),
            Value::Unknown => Err(unknown_at_apply(attribute)),
        }
    }

    /// Write path for a required field.
    pub fn required(&self, attribute: &str) -> Result<T, Diagnostic>
    where
        T: Clone,
    {
        match self {
            Value::Known(v) => Ok(v.clone()),
            Value::Null => Err(Diagnostic::error(
                "Missing Required Attribute",
                format!("The attribute \"{attribute}\" must be set."),
            )
            .at(AttributePath::root(attribute))),
            Value::Unknown => Err(unknown_at_apply(attribute)),
        }
    }
}

impl Value<String> {
    pub fn as_str(&self) -> Option<&str> {
        self.as_known().map(String::as_str)
    }
}

fn unknown_at_apply(attribute: &str) -> Diagnostic {
    Diagnostic::error(
        "Unknown Value During Apply",
        format!("The attribute \"{attribute}\" is still unknown; plans must not be applied with unknown values."),
    )
    .at(AttributePath::root(attribute))
}

/// Parse a canonical 36-character UUID held in a host string.
///
/// `label` names the id in the diagnostic, e.g. `"User"` yields
/// "Invalid User ID".
pub fn parse_uuid(value: &Value<String>, attribute: &str, label: &str) -> Result<Uuid, Diagnostic> {
    let raw = value.required(attribute)?;
    parse_uuid_str(&raw, label).map_err(|d| d.at(AttributePath::root(attribute)))
}

pub fn parse_uuid_str(raw: &str, label: &str) -> Result<Uuid, Diagnostic> {
    let invalid = |reason: String| {
        Diagnostic::error(
            format!("Invalid {label} ID"),
            format!("Unable to parse {label} ID '{raw}': {reason}"),
        )
    };
    if raw.len() != 36 {
        return Err(invalid("expected the 36-character hyphenated form".to_string()));
    }
    Uuid::try_parse(raw).map_err(|e| invalid(e.to_string()))
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Known(v) => v.serialize(serializer),
            Value::Null => serializer.serialize_none(),
            Value::Unknown => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(UNKNOWN_MARKER, &true)?;
                map.end()
            }
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        if is_unknown_marker(&raw) {
            return Ok(Value::Unknown);
        }
        T::deserialize(raw).map(Value::Known).map_err(serde::de::Error::custom)
    }
}

pub fn is_unknown_marker(raw: &serde_json::Value) -> bool {
    raw.as_object()
        .is_some_and(|o| o.len() == 1 && o.get(UNKNOWN_MARKER) == Some(&serde_json::Value::Bool(true)))
}

pub fn unknown_marker() -> serde_json::Value {
    let mut marker = serde_json::Map::new();
    marker.insert(UNKNOWN_MARKER.to_string(), serde_json::Value::Bool(true));
    serde_json::Value::Object(marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Model {
        name: Value<String>,
        image: Value<String>,
        id: Value<String>,
    }

    #[test]
    fn three_states_round_trip_through_json() {
        let model: Model = serde_json::from_str(r#"{"name":"","id":{"$unknown":true}}"#).unwrap();
        assert_eq!(model.name, Value::Known(String::new()));
        assert_eq!(model.image, Value::Null);
        assert_eq!(model.id, Value::Unknown);

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json, serde_json::json!({"name": "", "image": null, "id": {"$unknown": true}}));
    }

    #[test]
    fn object_with_extra_keys_is_not_the_marker() {
        let raw = serde_json::json!({"$unknown": true, "other": 1});
        assert!(!is_unknown_marker(&raw));
    }

    #[test]
    fn null_is_omitted_on_write_and_unknown_is_rejected() {
        assert_eq!(Value::<String>::Null.for_request("image").unwrap(), None);
        assert_eq!(Value::Known("x".to_string()).for_request("image").unwrap(), Some("x".to_string()));
        let diag = Value::<String>::Unknown.for_request("image").unwrap_err();
        assert_eq!(diag.attribute.unwrap().to_string(), "image");
    }

    #[test]
    fn absent_api_field_reads_as_null() {
        assert_eq!(Value::<String>::from_option(None), Value::Null);
        assert_eq!(Value::from_option(Some(String::new())), Value::Known(String::new()));
    }

    #[test]
    fn uuid_must_be_canonical() {
        let ok = Value::Known("11111111-1111-1111-1111-111111111111".to_string());
        assert!(parse_uuid(&ok, "id", "User").is_ok());

        let simple = Value::Known("11111111111111111111111111111111".to_string());
        let diag = parse_uuid(&simple, "id", "User").unwrap_err();
        assert_eq!(diag.summary, "Invalid User ID");

        let garbage = Value::Known("zzzzzzzz-1111-1111-1111-111111111111".to_string());
        assert!(parse_uuid(&garbage, "role_id", "Role").is_err());
    }

    #[test]
    fn missing_required_value_names_the_attribute() {
        let diag = Value::<String>::Null.required("email").unwrap_err();
        assert_eq!(diag.summary, "Missing Required Attribute");
        assert!(diag.detail.contains("email"));
    }
}
