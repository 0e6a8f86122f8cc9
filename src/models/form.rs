use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::models::common::{id_from_value, EntryId, FormId};

/// Key into an entry's value mapping: a field id (`"3"`) or an input id (`"2.3"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKey(String);

impl FieldKey {
    pub fn new(key: impl Into<String>) -> Self {
        FieldKey(key.into())
    }

    pub fn field(id: u32) -> Self {
        FieldKey(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldKey {
    fn from(key: &str) -> Self {
        FieldKey::new(key)
    }
}

/// One sub-input of a multi-input field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDescriptor {
    pub id: FieldKey,
    pub label: Option<String>,
    pub name: Option<String>,
}

impl InputDescriptor {
    pub fn new(id: impl Into<String>, label: &str) -> Self {
        Self {
            id: FieldKey::new(id),
            label: Some(label.to_string()).filter(|l| !l.is_empty()),
            name: None,
        }
    }
}

/// Field types the payload engine distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Single-value field stored under its own id.
    Generic { field_type: String },
    /// Multi-part name, composed from its inputs.
    Name { inputs: Vec<InputDescriptor> },
    /// References child entries of another form as a comma separated id list.
    NestedForm,
    /// Any other multi-input field. Only the value under the field's own id is used.
    Composite {
        field_type: String,
        inputs: Vec<InputDescriptor>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawField")]
pub struct FieldDescriptor {
    pub id: u32,
    pub label: String,
    pub kind: FieldKind,
    pub input_name: Option<String>,
}

impl FieldDescriptor {
    pub fn generic(id: u32, label: &str) -> Self {
        Self::with_kind(
            id,
            label,
            FieldKind::Generic {
                field_type: "text".to_string(),
            },
        )
    }

    pub fn name(id: u32, label: &str, inputs: Vec<InputDescriptor>) -> Self {
        Self::with_kind(id, label, FieldKind::Name { inputs })
    }

    pub fn nested_form(id: u32, label: &str) -> Self {
        Self::with_kind(id, label, FieldKind::NestedForm)
    }

    pub fn with_kind(id: u32, label: &str, kind: FieldKind) -> Self {
        Self {
            id,
            label: label.to_string(),
            kind,
            input_name: None,
        }
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::field(self.id)
    }

    /// Platform type tag of the field.
    pub fn field_type(&self) -> &str {
        match &self.kind {
            FieldKind::Generic { field_type } | FieldKind::Composite { field_type, .. } => {
                field_type
            }
            FieldKind::Name { .. } => "name",
            FieldKind::NestedForm => "form",
        }
    }

    pub fn inputs(&self) -> &[InputDescriptor] {
        match &self.kind {
            FieldKind::Name { inputs } | FieldKind::Composite { inputs, .. } => inputs,
            FieldKind::Generic { .. } | FieldKind::NestedForm => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormSchema {
    pub id: FormId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    pub fn new(id: u64, title: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            id: FormId(id),
            title: title.to_string(),
            description: String::new(),
            fields,
        }
    }
}

// Field object as the platform serves it
#[derive(Debug, Deserialize)]
struct RawField {
    #[serde(deserialize_with = "deserialize_field_id")]
    id: u32,
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "type", default)]
    field_type: Option<String>,
    #[serde(default)]
    inputs: Option<Vec<RawInput>>,
    #[serde(rename = "inputName", default)]
    input_name: Option<String>,
}

// Field ids come as numbers or numeric strings, like form and entry ids
fn deserialize_field_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value)
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid field id: {}", value)))
}

#[derive(Debug, Deserialize)]
struct RawInput {
    id: Value,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<RawInput> for InputDescriptor {
    fn from(raw: RawInput) -> Self {
        let id = match raw.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            id: FieldKey::new(id),
            label: raw.label.filter(|l| !l.is_empty()),
            name: raw.name.filter(|n| !n.is_empty()),
        }
    }
}

impl From<RawField> for FieldDescriptor {
    fn from(raw: RawField) -> Self {
        let field_type = raw.field_type.unwrap_or_default();
        let inputs: Option<Vec<InputDescriptor>> = raw
            .inputs
            .map(|inputs| inputs.into_iter().map(InputDescriptor::from).collect());

        let kind = match (field_type.as_str(), inputs) {
            ("name", inputs) => FieldKind::Name {
                inputs: inputs.unwrap_or_default(),
            },
            ("form", _) => FieldKind::NestedForm,
            (_, Some(inputs)) => FieldKind::Composite { field_type, inputs },
            (_, None) => FieldKind::Generic { field_type },
        };

        Self {
            id: raw.id,
            label: raw.label.unwrap_or_default(),
            kind,
            input_name: raw.input_name.filter(|n| !n.is_empty()),
        }
    }
}

/// A stored submission, with field/input values split from the entry properties.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct SubmissionEntry {
    pub id: EntryId,
    pub form_id: FormId,
    pub date_created: String,
    pub created_by: Option<u64>,
    pub values: HashMap<FieldKey, String>,
    /// Remaining non-empty entry properties (`ip`, `source_url`, `created_by`, ...).
    pub properties: HashMap<String, String>,
}

impl SubmissionEntry {
    pub fn new(id: u64, form_id: u64, date_created: &str) -> Self {
        Self {
            id: EntryId(id),
            form_id: FormId(form_id),
            date_created: date_created.to_string(),
            created_by: None,
            values: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(FieldKey::new(key), value.to_string());
        self
    }

    /// Raw stored value under `key`, if any.
    pub fn value(&self, key: &FieldKey) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Stored value under `key`, treating the empty string as absent.
    pub fn non_empty_value(&self, key: &FieldKey) -> Option<&str> {
        self.value(key).filter(|v| !v.is_empty())
    }
}

fn is_field_key(key: &str) -> bool {
    key.chars().next().map_or(false, |c| c.is_ascii_digit())
}

// Properties already carried by dedicated struct members
const IDENTITY_PROPERTIES: [&str; 4] = ["id", "form_id", "date_created", "date_updated"];

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(String::from(if *b { "1" } else { "" })),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

impl TryFrom<Map<String, Value>> for SubmissionEntry {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = map
            .get("id")
            .and_then(id_from_value)
            .ok_or_else(|| "entry is missing a valid id".to_string())?;
        let form_id = map
            .get("form_id")
            .and_then(id_from_value)
            .ok_or_else(|| format!("entry {} is missing a valid form_id", id))?;
        let date_created = map
            .get("date_created")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let created_by = map
            .get("created_by")
            .and_then(id_from_value)
            .filter(|user| *user > 0);

        let mut values = HashMap::new();
        let mut properties = HashMap::new();
        for (key, value) in &map {
            let Some(text) = value_text(value) else {
                continue;
            };
            if is_field_key(key) {
                values.insert(FieldKey::new(key.as_str()), text);
            } else if !IDENTITY_PROPERTIES.contains(&key.as_str()) && !text.is_empty() && text != "0" {
                properties.insert(key.clone(), text);
            }
        }

        Ok(Self {
            id: EntryId(id),
            form_id: FormId(form_id),
            date_created,
            created_by,
            values,
            properties,
        })
    }
}
