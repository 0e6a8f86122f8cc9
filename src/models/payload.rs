use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::common::{EntryId, FormId};

/// Value assembled for one slugified field key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Scalar or composed string. `None` when nothing is stored for the field.
    Scalar(Option<String>),
    /// One mapping per resolved child entry of a nested form, in reference order.
    Entries(Vec<SubmissionData>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Scalar(Some(value.into()))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(value) => value.as_deref(),
            FieldValue::Entries(_) => None,
        }
    }

    pub fn as_entries(&self) -> Option<&[SubmissionData]> {
        match self {
            FieldValue::Entries(entries) => Some(entries),
            FieldValue::Scalar(_) => None,
        }
    }
}

/// Ordered slug -> value mapping for one entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubmissionData(IndexMap<String, FieldValue>);

impl SubmissionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. A repeated slug replaces the earlier value and keeps its position.
    pub fn insert(&mut self, slug: String, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(slug, value)
    }

    pub fn get(&self, slug: &str) -> Option<&FieldValue> {
        self.0.get(slug)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Stored edit token together with the link built from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditLink {
    #[serde(rename = "edit_token")]
    pub token: String,
    #[serde(rename = "edit_url")]
    pub url: String,
    pub entry_id: EntryId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormInfo {
    pub form_id: FormId,
    pub form_title: String,
    pub form_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionTime {
    pub timestamp: String,
    pub formatted: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: u64,
    pub user_email: String,
    pub user_name: String,
}

/// Form, timing and submitter blocks added by the legacy webhook customisation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyPayloadFields {
    pub form_info: FormInfo,
    pub submission_time: SubmissionTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

/// Body delivered to the webhook receiver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    #[serde(flatten)]
    pub edit: Option<EditLink>,
    pub submission_data: SubmissionData,
    #[serde(flatten)]
    pub legacy: Option<LegacyPayloadFields>,
}
