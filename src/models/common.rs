use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a form schema on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FormId(pub u64);

/// Identifier of a submission entry on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl EntryId {
    /// Parse one token of a nested-form value. Blank or non-numeric tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        token.parse::<u64>().ok().map(EntryId)
    }
}

// The platform emits ids both as JSON numbers and as numeric strings
pub(crate) fn id_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid identifier: {}", value)))
}

impl<'de> Deserialize<'de> for FormId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_id(deserializer).map(FormId)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_id(deserializer).map(EntryId)
    }
}

// Request body for the entry-finalized and webhook-payload hooks
#[derive(Debug, Deserialize, Serialize)]
pub struct EntryHookRequest {
    pub entry_id: EntryId,
}

// Query string of an edit page visit
#[derive(Debug, Deserialize)]
pub struct EditPageParams {
    pub gform_update: Option<String>,
    pub token: Option<String>,
}

// Query string carrying the shared hook secret
#[derive(Debug, Deserialize)]
pub struct HookAuthParams {
    pub auth: Option<String>,
}

// Generic hook response, mirrors what the platform's feed add-on logs
#[derive(Debug, Serialize, Deserialize)]
pub struct HookResponse {
    pub success: bool,
    pub message: String,
}

// Notification object composed by the platform; fields other than the message pass through
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Notification {
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra_fields: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct NotificationHookRequest {
    pub entry_id: EntryId,
    pub notification: Notification,
}
