//! Capabilities this service consumes from its host environment.
//!
//! The form platform owns forms, entries and users; the metadata store holds
//! per-entry key/value data such as the edit token. Every component receives
//! these as trait objects at construction time.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::common::{EntryId, FormId};
use crate::models::form::{FormSchema, SubmissionEntry};
use crate::models::payload::UserInfo;

#[async_trait]
pub trait FormStore: Send + Sync {
    async fn get_form(&self, form_id: FormId) -> Result<FormSchema, StoreError>;
}

#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn get_entry(&self, entry_id: EntryId) -> Result<SubmissionEntry, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` when no such user exists.
    async fn get_user(&self, user_id: u64) -> Result<Option<UserInfo>, StoreError>;
}

/// Single-key reads and writes of entry metadata.
pub trait MetadataStore: Send + Sync {
    fn get_entry_meta(&self, entry_id: EntryId, key: &str) -> Result<Option<String>, StoreError>;

    /// Create or replace the value stored under `key`.
    fn set_entry_meta(&self, entry_id: EntryId, key: &str, value: &str) -> Result<(), StoreError>;
}
