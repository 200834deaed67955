//! Persisted update state and its payload schema migrations

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::update::error::StateError;
use crate::update::scheme::VersionType;

/// Current layout version of the persisted [`UpdateState`] payload
pub const STATE_SCHEMA_VERSION: i64 = 1;

/// Payload migrations. Entry `i` upgrades a payload from version `i` to `i + 1`.
const STATE_MIGRATIONS: &[fn(&mut Value)] = &[
    // v1: absent remote version is null instead of ""
    null_empty_remote_version,
];

fn null_empty_remote_version(payload: &mut Value) {
    if let Some(obj) = payload.as_object_mut()
        && obj.get("remoteVersion").and_then(Value::as_str) == Some("")
    {
        obj.insert("remoteVersion".to_string(), Value::Null);
    }
}

/// Durable record of version and usage checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateState {
    pub version_type: VersionType,
    /// Last time a version check attempt ran (epoch ms)
    pub last_update: i64,
    /// The running build's version in the active scheme's raw format
    pub version: String,
    /// Most recently resolved remote identifier
    pub remote_version: Option<String>,
    pub used: f64,
    pub subscription: f64,
    /// Last time a usage check attempt ran (epoch ms)
    pub last_update_usage: i64,
}

impl Default for UpdateState {
    fn default() -> Self {
        Self {
            version_type: VersionType::Tag,
            last_update: 0,
            version: "unknown".to_string(),
            remote_version: None,
            used: 0.0,
            subscription: 0.0,
            last_update_usage: 0,
        }
    }
}

impl UpdateState {
    /// Decode a payload stored at `schema_version`, migrating it forward.
    pub fn from_payload(schema_version: i64, payload: &str) -> Result<Self, StateError> {
        if !(0..=STATE_SCHEMA_VERSION).contains(&schema_version) {
            return Err(StateError::UnsupportedSchema {
                found: schema_version,
                supported: STATE_SCHEMA_VERSION,
            });
        }

        let mut value: Value = serde_json::from_str(payload)?;
        for migrate in &STATE_MIGRATIONS[schema_version as usize..] {
            migrate(&mut value);
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Encode the state at [`STATE_SCHEMA_VERSION`]
    pub fn to_payload(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string(self)?)
    }
}
