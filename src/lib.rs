//! Form Edit Link Service
//!
//! Companion service for a form-management platform. It issues secure,
//! capability-bearing edit links for submissions, turns raw entries (nested
//! form children included) into clean label-keyed webhook payloads, and
//! appends the edit link to outbound notifications.
//!
//! # Modules
//!
//! - `services::resolver`: field value resolution, name composition, nested entries
//! - `services::payload`: webhook payload assembly
//! - `services::tokens` / `auth`: edit token issue and verification
//! - `client`: REST client for the form platform
//! - `handlers` / `routes`: hook endpoints the platform calls
//!
//! # Edit tokens
//!
//! Tokens are HMAC-SHA256 digests over the entry id and creation time, keyed
//! by a server secret, and stored as entry metadata. Verification is a
//! constant-time comparison against the stored value.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod client_mock;

// Re-export the main API types for ease of use
pub use auth::EditTokenAuth;
pub use client::FormsApiClient;
pub use config::ServiceConfig;
pub use error::{ConfigError, ServiceError, StoreError};
pub use handlers::api::AppState;
pub use models::payload::{FieldValue, SubmissionData, SubmissionPayload};
pub use routes::create_router;
pub use services::payload::PayloadAssembler;
pub use services::resolver::{SkipOnResolutionFailure, SubmissionResolver};
pub use services::slug::slugify;
pub use services::tokens::TokenService;
