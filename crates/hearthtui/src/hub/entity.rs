use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// A single hub entity as reported by `/api/states`.
///
/// The entity id is fixed at construction; the domain is always derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    entity_id: String,

    /// Free-form state string ("on", "off", "21.5", "unavailable", ...)
    pub state: String,

    /// Display label, falls back to the entity id
    pub friendly_name: String,

    /// Extra metadata, passed through untouched
    pub attributes: Map<String, Value>,

    /// ISO-8601 timestamp of the last state change, or empty
    pub last_changed: String,
}

impl Entity {
    /// Build an entity from a raw state object.
    ///
    /// Every field is optional; missing values fall back to defaults rather
    /// than failing, so a single odd record never breaks a whole refresh.
    pub fn from_api(data: &Value) -> Self {
        let entity_id = data
            .get("entity_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let attributes = data
            .get("attributes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let friendly_name = attributes
            .get("friendly_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| entity_id.clone());

        let state = match data.get("state") {
            None | Some(Value::Null) => "unknown".to_string(),
            Some(Value::String(state)) => state.clone(),
            Some(other) => other.to_string(),
        };

        let last_changed = data
            .get("last_changed")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            entity_id,
            state,
            friendly_name,
            attributes,
            last_changed,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Entity category, the part of the id before the first `.`
    pub fn domain(&self) -> &str {
        entity_domain(&self.entity_id)
    }
}

/// Domain of an entity id, or "" when the id has no `.`
pub fn entity_domain(entity_id: &str) -> &str {
    entity_id
        .split_once('.')
        .map(|(domain, _)| domain)
        .unwrap_or_default()
}

/// Domain used to address services for an entity.
///
/// Unlike [`entity_domain`], an id without a `.` is used whole.
pub fn service_domain(entity_id: &str) -> &str {
    entity_id.split('.').next().unwrap_or(entity_id)
}
