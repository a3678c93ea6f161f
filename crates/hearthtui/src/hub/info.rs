use serde_json::Map;
use serde_json::Value;

/// Display metadata taken from the hub's `/api/config`
#[derive(Debug, Clone, PartialEq)]
pub struct HubInfo {
    pub version: String,
    pub location_name: String,
    pub raw: Map<String, Value>,
}

impl HubInfo {
    pub fn from_config(config: Map<String, Value>) -> Self {
        let field = |key: &str, default: &str| {
            config
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };

        Self {
            version: field("version", "unknown"),
            location_name: field("location_name", "Home"),
            raw: config,
        }
    }

    /// Temperature unit from `unit_system`, e.g. "°C"
    pub fn temperature_unit(&self) -> Option<&str> {
        self.raw
            .get("unit_system")
            .and_then(|units| units.get("temperature"))
            .and_then(Value::as_str)
    }
}
