use thiserror::Error;

use crate::models::common::{EntryId, FormId};

/// Failures reported by the external collaborators (form platform, metadata store).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    #[error("form platform request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("form platform returned status {0}")]
    Status(u16),

    #[error("unexpected response from form platform: {0}")]
    Decode(String),

    #[error("metadata database error: {0}")]
    Csv(#[from] csv::Error),

    #[error("metadata database io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to acquire metadata database lock")]
    Lock,
}

impl StoreError {
    pub fn entry_not_found(id: EntryId) -> Self {
        StoreError::NotFound {
            kind: "entry",
            id: id.0,
        }
    }

    pub fn form_not_found(id: FormId) -> Self {
        StoreError::NotFound {
            kind: "form",
            id: id.0,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Errors surfaced by trigger entry points to the host wiring layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("entry {0} not found")]
    EntryNotFound(EntryId),

    #[error("form {0} not found")]
    FormNotFound(FormId),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub(crate) fn for_entry(id: EntryId, err: StoreError) -> Self {
        if err.is_not_found() {
            ServiceError::EntryNotFound(id)
        } else {
            ServiceError::Store(err)
        }
    }

    pub(crate) fn for_form(id: FormId, err: StoreError) -> Self {
        if err.is_not_found() {
            ServiceError::FormNotFound(id)
        } else {
            ServiceError::Store(err)
        }
    }
}
