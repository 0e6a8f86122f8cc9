use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::EditTokenAuth;
use crate::error::StoreError;
use crate::models::common::EntryId;
use crate::models::form::SubmissionEntry;
use crate::models::payload::EditLink;
use crate::services::store::MetadataStore;

/// Metadata key the edit token is stored under
pub const EDIT_TOKEN_META_KEY: &str = "edit_token";

/// Builds absolute edit page URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct EditLinkBuilder {
    site_url: String,
    edit_path: String,
}

impl EditLinkBuilder {
    pub fn new(site_url: &str, edit_path: &str) -> Self {
        let edit_path = if edit_path.starts_with('/') {
            edit_path.to_string()
        } else {
            format!("/{}", edit_path)
        };

        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
            edit_path,
        }
    }

    /// `{site}{path}?gform_update={entry}&token={token}`
    pub fn url(&self, entry_id: EntryId, token: &str) -> String {
        format!(
            "{}{}?gform_update={}&token={}",
            self.site_url, self.edit_path, entry_id, token
        )
    }
}

/// Issues and verifies edit tokens stored as entry metadata.
pub struct TokenService {
    secret: String,
    metadata: Arc<dyn MetadataStore>,
    links: EditLinkBuilder,
}

impl TokenService {
    pub fn new(secret: String, metadata: Arc<dyn MetadataStore>, links: EditLinkBuilder) -> Self {
        Self {
            secret,
            metadata,
            links,
        }
    }

    /// Derive the token for a finalized entry and store it, replacing any earlier value.
    pub fn issue(&self, entry: &SubmissionEntry) -> Result<String, StoreError> {
        let token = EditTokenAuth::generate_token(&self.secret, entry.id, &entry.date_created);
        self.metadata
            .set_entry_meta(entry.id, EDIT_TOKEN_META_KEY, &token)?;

        info!(
            "Generated edit token for entry {}: {}",
            entry.id,
            EditTokenAuth::token_prefix(&token)
        );

        Ok(token)
    }

    /// Token stored for an entry. Empty stored values count as absent.
    pub fn stored_token(&self, entry_id: EntryId) -> Result<Option<String>, StoreError> {
        Ok(self
            .metadata
            .get_entry_meta(entry_id, EDIT_TOKEN_META_KEY)?
            .filter(|token| !token.is_empty()))
    }

    /// Check a presented token against the stored one. Never fails: a missing
    /// token, a mismatch or a store error all give `false`.
    pub fn verify(&self, entry_id: EntryId, presented: &str) -> bool {
        let stored = match self.stored_token(entry_id) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                warn!("No edit token stored for entry {}", entry_id);
                return false;
            }
            Err(e) => {
                error!("Failed to load edit token for entry {}: {}", entry_id, e);
                return false;
            }
        };

        let valid = EditTokenAuth::tokens_match(&stored, presented);
        if !valid {
            warn!("Edit token mismatch for entry {}", entry_id);
        }
        valid
    }

    /// Stored token and its edit URL, if the entry has one.
    pub fn edit_link(&self, entry_id: EntryId) -> Result<Option<EditLink>, StoreError> {
        Ok(self.stored_token(entry_id)?.map(|token| EditLink {
            url: self.links.url(entry_id, &token),
            token,
            entry_id,
        }))
    }

    /// Like [`TokenService::edit_link`], logging store failures and treating them as no token.
    pub fn edit_link_or_none(&self, entry_id: EntryId) -> Option<EditLink> {
        self.edit_link(entry_id).unwrap_or_else(|e| {
            error!("Failed to load edit token for entry {}: {}", entry_id, e);
            None
        })
    }
}
