use dotenv::dotenv;
use reqwest::Url;
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::auth::EditTokenAuth;
use crate::error::ConfigError;
use crate::services::resolver::DEFAULT_MAX_DEPTH;

pub const DEFAULT_EDIT_PAGE_PATH: &str = "/form-test-edit/";
pub const DEFAULT_METADATA_DATABASE_PATH: &str = "/app/data/entry_meta.csv";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Service settings read from the environment
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub site_url: String,
    pub edit_page_path: String,
    pub edit_token_secret: String,
    pub forms_api_endpoint: String,
    pub forms_api_key: Option<String>,
    pub forms_api_secret: Option<String>,
    pub metadata_database_path: PathBuf,
    pub legacy_webhook_fields: bool,
    pub edit_debug_view: bool,
    pub nested_form_max_depth: usize,
    pub hook_auth_token: Option<String>,
    pub is_production: bool,
    pub bind_addr: SocketAddr,
}

fn flag(value: Option<&String>) -> bool {
    value.map(|val| val.to_lowercase() == "true").unwrap_or(false)
}

impl ServiceConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_vars(&env::vars().collect())
    }

    /// Build the configuration from a variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).filter(|v| !v.trim().is_empty()).cloned();

        let is_production = vars
            .get("ENVIRONMENT")
            .map(|val| val.to_lowercase() == "production")
            .unwrap_or(false);

        let site_url = get("SITE_URL").ok_or(ConfigError::Missing("SITE_URL"))?;
        Url::parse(&site_url).map_err(|e| ConfigError::Invalid {
            name: "SITE_URL",
            reason: e.to_string(),
        })?;

        let forms_api_endpoint = get("FORMS_API_ENDPOINT").unwrap_or_else(|| site_url.clone());
        Url::parse(&forms_api_endpoint).map_err(|e| ConfigError::Invalid {
            name: "FORMS_API_ENDPOINT",
            reason: e.to_string(),
        })?;

        let edit_token_secret = match get("EDIT_TOKEN_SECRET") {
            Some(secret) => secret,
            None if is_production => return Err(ConfigError::Missing("EDIT_TOKEN_SECRET")),
            None => {
                warn!("EDIT_TOKEN_SECRET not set; using a random secret for this process");
                EditTokenAuth::generate_secret()
            }
        };

        let nested_form_max_depth = match get("NESTED_FORM_MAX_DEPTH") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                name: "NESTED_FORM_MAX_DEPTH",
                reason: e.to_string(),
            })?,
            None => DEFAULT_MAX_DEPTH,
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let config = Self {
            site_url,
            edit_page_path: get("EDIT_PAGE_PATH")
                .unwrap_or_else(|| DEFAULT_EDIT_PAGE_PATH.to_string()),
            edit_token_secret,
            forms_api_endpoint,
            forms_api_key: get("FORMS_API_KEY"),
            forms_api_secret: get("FORMS_API_SECRET"),
            metadata_database_path: get("METADATA_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_METADATA_DATABASE_PATH)),
            legacy_webhook_fields: flag(vars.get("LEGACY_WEBHOOK_FIELDS")),
            edit_debug_view: flag(vars.get("EDIT_DEBUG_VIEW")) && !is_production,
            nested_form_max_depth,
            hook_auth_token: get("HOOK_AUTH_TOKEN"),
            is_production,
            bind_addr,
        };

        Ok(config)
    }

    /// Log the effective settings without secrets
    pub fn log_summary(&self) {
        info!("Site URL: {}", self.site_url);
        info!("Form platform API: {}", self.forms_api_endpoint);
        info!(
            "Entry metadata database: {}",
            self.metadata_database_path.display()
        );
        info!("Nested form depth limit: {}", self.nested_form_max_depth);

        if self.hook_auth_token.is_some() {
            info!("Hook authentication enabled with provided token");
        } else {
            info!("No hook authentication token provided - authentication disabled");
        }
        if self.legacy_webhook_fields {
            info!("Legacy webhook fields (form_info, submission_time, user_info) enabled");
        }
        if self.edit_debug_view {
            info!("Edit page debug view enabled");
        }
        if self.is_production {
            info!("Running in PRODUCTION mode");
        } else {
            info!("Running in DEVELOPMENT mode");
        }
    }
}
