use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::EditTokenAuth;
use crate::models::common::EntryId;
use crate::models::editor::{EditPage, EntryDebugView, LabeledValue, NestedEntryView, NestedFieldView};
use crate::models::form::{FieldKind, FormSchema, SubmissionEntry};
use crate::services::resolver::parse_child_ids;
use crate::services::slug::sanitize_title;
use crate::services::store::{EntryStore, FormStore};
use crate::services::tokens::TokenService;

// Field types whose stored value is handed to the editor as is
const DIRECT_VALUE_TYPES: [&str; 5] = ["fileupload", "radio", "nestedform", "form", "multi_choice"];

/// Platform shortcode that renders the entry editor.
pub fn editor_shortcode(form: &FormSchema, entry_id: EntryId) -> String {
    format!(
        "[gravityform id=\"{}\" entry=\"{}\" mode=\"edit\"]",
        form.id, entry_id
    )
}

/// Values the entry editor is pre-populated with, keyed by field or input id.
pub fn prefill_values(form: &FormSchema, entry: &SubmissionEntry) -> IndexMap<String, String> {
    let mut values = IndexMap::new();

    for field in &form.fields {
        let field_type = field.field_type();

        if DIRECT_VALUE_TYPES.contains(&field_type) {
            if let Some(value) = entry.non_empty_value(&field.key()) {
                debug!("Prefill {} field {} from stored value", field_type, field.id);
                values.insert(field.key().to_string(), value.to_string());
            }
        } else if !field.inputs().is_empty() {
            // A field bound to one named input only prefills that input
            for input in field.inputs() {
                let Some(value) = entry.value(&input.id) else {
                    continue;
                };
                match field.input_name.as_deref() {
                    Some(name) if input.name.as_deref() != Some(name) => continue,
                    Some(_) => {
                        values.insert(input.id.to_string(), value.to_string());
                        break;
                    }
                    None => {
                        values.insert(input.id.to_string(), value.to_string());
                    }
                }
            }
        } else if let Some(value) = entry.value(&field.key()) {
            values.insert(field.key().to_string(), value.to_string());
        }
    }

    values
}

/// Readable label for every field and input id of a form.
///
/// Fields map to their sanitized label, inputs to `"field - input"`. Input
/// entries are written after their field and win when the ids coincide.
pub fn field_label_map(form: &FormSchema) -> HashMap<String, String> {
    let mut labels = HashMap::new();

    for field in &form.fields {
        let field_label = sanitize_title(&field.label);
        if !field.label.is_empty() {
            labels.insert(field.key().to_string(), field_label.clone());
        }
        for input in field.inputs() {
            if let Some(input_label) = &input.label {
                labels.insert(
                    input.id.to_string(),
                    format!("{} - {}", field_label, sanitize_title(input_label)),
                );
            }
        }
    }

    labels
}

// Numeric ordering of "3", "2.3", "2.10"
fn key_order(key: &str) -> Vec<u64> {
    key.split('.')
        .map(|part| part.parse::<u64>().unwrap_or(u64::MAX))
        .collect()
}

fn labeled_values(entry: &SubmissionEntry, labels: &HashMap<String, String>) -> Vec<LabeledValue> {
    let mut values: Vec<LabeledValue> = entry
        .values
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| LabeledValue {
            key: key.to_string(),
            label: labels.get(key.as_str()).cloned().unwrap_or_default(),
            value: value.clone(),
        })
        .collect();
    values.sort_by(|a, b| key_order(&a.key).cmp(&key_order(&b.key)));

    let mut properties: Vec<LabeledValue> = entry
        .properties
        .iter()
        .map(|(key, value)| LabeledValue {
            key: key.clone(),
            label: String::new(),
            value: value.clone(),
        })
        .collect();
    properties.sort_by(|a, b| a.key.cmp(&b.key));

    values.extend(properties);
    values
}

/// Gates edit page visits and prepares the entry editor.
pub struct EditorService {
    forms: Arc<dyn FormStore>,
    entries: Arc<dyn EntryStore>,
    tokens: Arc<TokenService>,
    debug_view: bool,
}

impl EditorService {
    pub fn new(
        forms: Arc<dyn FormStore>,
        entries: Arc<dyn EntryStore>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            forms,
            entries,
            tokens,
            debug_view: false,
        }
    }

    /// Attach the troubleshooting view to editor pages.
    pub fn with_debug_view(mut self, enabled: bool) -> Self {
        self.debug_view = enabled;
        self
    }

    /// Decide what an edit page visit renders.
    ///
    /// Anything short of a verified token renders the normal page content,
    /// with no hint as to why.
    pub async fn render(&self, entry_id: EntryId, token: &str) -> EditPage {
        if !self.tokens.verify(entry_id, token) {
            return EditPage::Content;
        }

        let entry = match self.entries.get_entry(entry_id).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Edit page for entry {}: entry unavailable ({})", entry_id, e);
                return EditPage::Error {
                    message: "Entry not found.".to_string(),
                };
            }
        };

        let form = match self.forms.get_form(entry.form_id).await {
            Ok(form) => form,
            Err(e) => {
                warn!("Edit page for entry {}: form unavailable ({})", entry_id, e);
                return EditPage::Error {
                    message: "Form not found.".to_string(),
                };
            }
        };

        info!("Using entry editor for entry {}", entry_id);

        let debug = if self.debug_view {
            Some(self.build_debug_view(&form, &entry, token).await)
        } else {
            None
        };

        EditPage::Editor {
            entry_id,
            form_id: form.id,
            shortcode: editor_shortcode(&form, entry_id),
            field_values: prefill_values(&form, &entry),
            debug,
        }
    }

    /// Entry values with readable labels, including every nested-form child.
    pub async fn build_debug_view(
        &self,
        form: &FormSchema,
        entry: &SubmissionEntry,
        token: &str,
    ) -> EntryDebugView {
        let labels = field_label_map(form);
        let mut nested = Vec::new();

        for field in &form.fields {
            if field.kind != FieldKind::NestedForm {
                continue;
            }
            let Some(raw) = entry.non_empty_value(&field.key()) else {
                continue;
            };

            let mut entries = Vec::new();
            for child_id in parse_child_ids(raw) {
                let child = match self.entries.get_entry(child_id).await {
                    Ok(child) => child,
                    Err(_) => continue,
                };
                let child_labels = match self.forms.get_form(child.form_id).await {
                    Ok(child_form) => field_label_map(&child_form),
                    Err(_) => HashMap::new(),
                };
                entries.push(NestedEntryView {
                    entry_id: child.id,
                    values: labeled_values(&child, &child_labels),
                });
            }

            nested.push(NestedFieldView {
                field_id: field.id,
                label: labels.get(field.key().as_str()).cloned().unwrap_or_default(),
                entries,
            });
        }

        EntryDebugView {
            entry_id: entry.id,
            form_id: entry.form_id,
            date_created: entry.date_created.clone(),
            token_prefix: EditTokenAuth::token_prefix(token),
            values: labeled_values(entry, &labels),
            nested,
        }
    }
}
