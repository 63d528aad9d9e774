//! Storage abstraction: the key-value operation surface shared by the local,
//! remote and hybrid stores, the strategy selection, and the versioned value
//! envelope used for forward migration.

use serde_json::Value;

/// Current schema version written into value envelopes.
pub const SCHEMA_VERSION: u32 = 1;

/// Uniform key-value operations over an entity-collection store. Values are
/// JSON documents; keys are the named collections (`customers`,
/// `bankPFRecords`, ...).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, String>;
    fn set(&self, key: &str, value: &Value) -> Result<(), String>;
    fn remove(&self, key: &str) -> Result<(), String>;
    fn clear(&self) -> Result<(), String>;
    fn keys(&self) -> Result<Vec<String>, String>;
    fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, String>;
    fn is_healthy(&self) -> bool;
}

/// Which backend(s) the hybrid store routes operations to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    LocalOnly,
    RemoteOnly,
    /// Read local first, fall through to remote; write local synchronously,
    /// mirror to remote in the background.
    LocalFirst,
    /// Read remote first, fall back to local; write remote synchronously,
    /// cache to local in the background.
    RemoteFirst,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::LocalOnly => "local_only",
            Strategy::RemoteOnly => "remote_only",
            Strategy::LocalFirst => "local_first",
            Strategy::RemoteFirst => "remote_first",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local_only" | "local" => Some(Strategy::LocalOnly),
            "remote_only" | "remote" => Some(Strategy::RemoteOnly),
            "local_first" | "local_primary" => Some(Strategy::LocalFirst),
            "remote_first" | "remote_primary" => Some(Strategy::RemoteFirst),
            _ => None,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wrap a value in the `{ version, timestamp, data }` envelope.
pub fn wrap(data: Value) -> Value {
    serde_json::json!({
        "version": SCHEMA_VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "data": data,
    })
}

/// Unwrap an envelope, tolerating raw un-enveloped values: anything that is
/// not an object carrying both `version` and `data` is returned as-is.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("version") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Envelope version of a stored value, if it carries one.
pub fn envelope_version(value: &Value) -> Option<u32> {
    match value {
        Value::Object(map) if map.contains_key("data") => {
            map.get("version").and_then(|v| v.as_u64()).map(|v| v as u32)
        }
        _ => None,
    }
}
