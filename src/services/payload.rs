use chrono::{DateTime, NaiveDateTime};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::models::common::EntryId;
use crate::models::form::{FormSchema, SubmissionEntry};
use crate::models::payload::{
    EditLink, FormInfo, LegacyPayloadFields, SubmissionPayload, SubmissionTime, UserInfo,
};
use crate::services::resolver::SubmissionResolver;
use crate::services::store::{EntryStore, FormStore, UserDirectory};
use crate::services::tokens::TokenService;

const SUBMISSION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Re-render an entry timestamp as `YYYY-MM-DD HH:MM:SS`, if it parses.
pub fn format_submission_time(date_created: &str) -> Option<String> {
    let trimmed = date_created.trim();
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, SUBMISSION_TIME_FORMAT) {
        return Some(parsed.format(SUBMISSION_TIME_FORMAT).to_string());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|parsed| parsed.naive_utc().format(SUBMISSION_TIME_FORMAT).to_string())
}

/// Builds webhook payloads for submissions.
pub struct PayloadAssembler {
    forms: Arc<dyn FormStore>,
    entries: Arc<dyn EntryStore>,
    resolver: SubmissionResolver,
    tokens: Arc<TokenService>,
    users: Option<Arc<dyn UserDirectory>>,
}

impl PayloadAssembler {
    pub fn new(
        forms: Arc<dyn FormStore>,
        entries: Arc<dyn EntryStore>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            resolver: SubmissionResolver::new(Arc::clone(&forms), Arc::clone(&entries)),
            forms,
            entries,
            tokens,
            users: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.resolver = self.resolver.with_max_depth(max_depth);
        self
    }

    /// Add the form, submission time and submitter blocks to every payload.
    pub fn with_legacy_fields(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = Some(users);
        self
    }

    /// Transform `entry` of `form` into the webhook payload.
    ///
    /// Fields are visited in declared order; unlabeled fields are dropped and a
    /// repeated label keeps the last field's value. The edit-link block is only
    /// emitted when `edit` is present.
    pub async fn assemble(
        &self,
        form: &FormSchema,
        entry: &SubmissionEntry,
        edit: Option<EditLink>,
    ) -> SubmissionPayload {
        let submission_data = self.resolver.resolve_fields(form, entry).await;

        SubmissionPayload {
            edit,
            submission_data,
            legacy: None,
        }
    }

    /// Form, timing and submitter details for the legacy payload blocks.
    pub async fn legacy_fields(
        &self,
        form: &FormSchema,
        entry: &SubmissionEntry,
        users: &dyn UserDirectory,
    ) -> LegacyPayloadFields {
        let user_info = match entry.created_by {
            Some(user_id) => self.lookup_user(users, user_id).await,
            None => None,
        };

        LegacyPayloadFields {
            form_info: FormInfo {
                form_id: form.id,
                form_title: form.title.clone(),
                form_description: form.description.clone(),
            },
            submission_time: SubmissionTime {
                timestamp: entry.date_created.clone(),
                formatted: format_submission_time(&entry.date_created),
            },
            user_info,
        }
    }

    async fn lookup_user(&self, users: &dyn UserDirectory, user_id: u64) -> Option<UserInfo> {
        match users.get_user(user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Failed to look up submitting user {}: {}", user_id, e);
                None
            }
        }
    }

    /// Load an entry with its form and stored token and build its payload.
    pub async fn build_for_entry(&self, entry_id: EntryId) -> Result<SubmissionPayload, ServiceError> {
        let entry = self
            .entries
            .get_entry(entry_id)
            .await
            .map_err(|e| ServiceError::for_entry(entry_id, e))?;

        let form = self
            .forms
            .get_form(entry.form_id)
            .await
            .map_err(|e| ServiceError::for_form(entry.form_id, e))?;

        let edit = self.tokens.edit_link_or_none(entry_id);
        if edit.is_some() {
            info!("Added edit token to webhook for entry {}", entry_id);
        }

        let mut payload = self.assemble(&form, &entry, edit).await;

        if let Some(users) = &self.users {
            payload.legacy = Some(self.legacy_fields(&form, &entry, users.as_ref()).await);
        }

        info!(
            "Built webhook payload for entry {} with {} fields",
            entry_id,
            payload.submission_data.len()
        );

        Ok(payload)
    }
}
