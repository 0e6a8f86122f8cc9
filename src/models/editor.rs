use indexmap::IndexMap;
use serde::Serialize;

use crate::models::common::{EntryId, FormId};

/// What the host should render for an edit page visit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EditPage {
    /// Not an authorised edit request: render the page's normal content.
    Content,
    /// Token verified but the entry or its form could not be loaded.
    Error { message: String },
    /// Render the platform's entry editor bound to the entry.
    Editor {
        entry_id: EntryId,
        form_id: FormId,
        shortcode: String,
        field_values: IndexMap<String, String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        debug: Option<EntryDebugView>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledValue {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedEntryView {
    pub entry_id: EntryId,
    pub values: Vec<LabeledValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedFieldView {
    pub field_id: u32,
    pub label: String,
    pub entries: Vec<NestedEntryView>,
}

/// Troubleshooting view of an entry shown alongside the editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDebugView {
    pub entry_id: EntryId,
    pub form_id: FormId,
    pub date_created: String,
    pub token_prefix: String,
    pub values: Vec<LabeledValue>,
    pub nested: Vec<NestedFieldView>,
}
