//! Field value resolution for submission payloads.
//!
//! Walks a form's fields in declared order and turns an entry's raw values
//! into a [`SubmissionData`] keyed by slugified labels. Nested-form fields are
//! resolved recursively into one mapping per child entry.

use futures::future::{join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::common::EntryId;
use crate::models::form::{FieldDescriptor, FieldKind, FormSchema, InputDescriptor, SubmissionEntry};
use crate::models::payload::{FieldValue, SubmissionData};
use crate::services::slug::slugify;
use crate::services::store::{EntryStore, FormStore};

pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Policy applied to child entries that cannot be resolved.
///
/// The child is left out of the nested sequence and nothing is reported to the
/// caller; the failure is only logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipOnResolutionFailure;

impl SkipOnResolutionFailure {
    fn skip<T>(&self, entry_id: EntryId, what: &str, err: &StoreError) -> Option<T> {
        warn!(
            "Skipping nested entry {}: {} could not be loaded ({})",
            entry_id, what, err
        );
        None
    }
}

/// Compose a full name from a name field's inputs: non-empty parts in input
/// order, joined by a single space.
pub fn compose_name(inputs: &[InputDescriptor], entry: &SubmissionEntry) -> String {
    inputs
        .iter()
        .filter_map(|input| entry.value(&input.id))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Child entry ids listed in a nested-form value, in order. Blank and
/// non-numeric tokens are dropped.
pub fn parse_child_ids(raw: &str) -> Vec<EntryId> {
    raw.split(',').filter_map(EntryId::parse).collect()
}

pub struct SubmissionResolver {
    forms: Arc<dyn FormStore>,
    entries: Arc<dyn EntryStore>,
    policy: SkipOnResolutionFailure,
    max_depth: usize,
}

impl SubmissionResolver {
    pub fn new(forms: Arc<dyn FormStore>, entries: Arc<dyn EntryStore>) -> Self {
        Self {
            forms,
            entries,
            policy: SkipOnResolutionFailure,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how many nested-form levels below the top-level entry are followed.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build the slug -> value mapping for one entry of `form`.
    pub async fn resolve_fields(&self, form: &FormSchema, entry: &SubmissionEntry) -> SubmissionData {
        self.resolve_fields_at(form, entry, 0).await
    }

    /// Value for a single field of `entry`.
    pub async fn resolve_value(&self, field: &FieldDescriptor, entry: &SubmissionEntry) -> FieldValue {
        self.resolve_value_at(field, entry, 0).await
    }

    /// Resolve the child entries referenced by a nested-form value.
    pub async fn resolve_nested(&self, raw: &str) -> Vec<SubmissionData> {
        self.resolve_nested_at(raw, 1).await
    }

    fn resolve_fields_at<'a>(
        &'a self,
        form: &'a FormSchema,
        entry: &'a SubmissionEntry,
        depth: usize,
    ) -> BoxFuture<'a, SubmissionData> {
        async move {
            let mut data = SubmissionData::new();

            for field in &form.fields {
                let slug = slugify(&field.label);
                if slug.is_empty() {
                    if !field.label.trim().is_empty() {
                        warn!(
                            "Field {} of form {} has label {:?} with no usable key; dropped",
                            field.id, form.id, field.label
                        );
                    }
                    continue;
                }

                let value = self.resolve_value_at(field, entry, depth).await;
                if data.insert(slug.clone(), value).is_some() {
                    debug!(
                        "Field {} of form {} reuses key {}; later value kept",
                        field.id, form.id, slug
                    );
                }
            }

            data
        }
        .boxed()
    }

    async fn resolve_value_at(
        &self,
        field: &FieldDescriptor,
        entry: &SubmissionEntry,
        depth: usize,
    ) -> FieldValue {
        match &field.kind {
            FieldKind::Name { inputs } => FieldValue::text(compose_name(inputs, entry)),
            FieldKind::NestedForm => {
                let raw = entry.value(&field.key()).unwrap_or_default();
                FieldValue::Entries(self.resolve_nested_at(raw, depth + 1).await)
            }
            FieldKind::Generic { .. } | FieldKind::Composite { .. } => {
                FieldValue::Scalar(entry.value(&field.key()).map(str::to_string))
            }
        }
    }

    async fn resolve_nested_at(&self, raw: &str, depth: usize) -> Vec<SubmissionData> {
        let ids = parse_child_ids(raw);
        if ids.is_empty() {
            return Vec::new();
        }

        if depth > self.max_depth {
            warn!(
                "Nested form depth {} exceeds limit {}; skipping entries {:?}",
                depth, self.max_depth, ids
            );
            return Vec::new();
        }

        debug!("Resolving {} nested entries at depth {}", ids.len(), depth);

        // Fetches run concurrently; join_all keeps the input order
        let children = join_all(ids.into_iter().map(|id| self.resolve_child(id, depth))).await;

        children.into_iter().flatten().collect()
    }

    async fn resolve_child(&self, entry_id: EntryId, depth: usize) -> Option<SubmissionData> {
        let entry = match self.entries.get_entry(entry_id).await {
            Ok(entry) => entry,
            Err(err) => return self.policy.skip(entry_id, "entry", &err),
        };

        let form = match self.forms.get_form(entry.form_id).await {
            Ok(form) => form,
            Err(err) => return self.policy.skip(entry_id, "form", &err),
        };

        Some(self.resolve_fields_at(&form, &entry, depth).await)
    }
}
