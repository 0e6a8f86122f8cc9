use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::common::{EntryId, FormId};
use crate::models::form::{FormSchema, SubmissionEntry};
use crate::models::payload::UserInfo;
use crate::services::store::{EntryStore, FormStore, UserDirectory};

// User object as served by the site's REST API with context=edit
#[derive(Debug, Deserialize)]
struct SiteUser {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

/// Client for the form platform's REST API
pub struct FormsApiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    api_secret: Option<String>,
}

impl FormsApiClient {
    pub fn new(endpoint: &str, api_key: Option<String>, api_secret: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GET a JSON resource; `Ok(None)` when the platform answers 404
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!("API URL: {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json");

        // Basic auth with the API consumer key pair when configured
        if let Some(key) = &self.api_key {
            request = request.basic_auth(key, self.api_secret.as_ref());
        }

        let res = request.send().await?;
        debug!("Response received with status: {}", res.status());

        match res.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = res.json::<T>().await.map_err(|e| {
                    StoreError::Decode(format!("failed to decode {}: {}", path, e))
                })?;
                Ok(Some(body))
            }
            status => Err(StoreError::Status(status.as_u16())),
        }
    }
}

#[async_trait]
impl FormStore for FormsApiClient {
    async fn get_form(&self, form_id: FormId) -> Result<FormSchema, StoreError> {
        info!("Fetching form {}", form_id);
        self.get_json(&format!("/wp-json/gf/v2/forms/{}", form_id))
            .await?
            .ok_or_else(|| StoreError::form_not_found(form_id))
    }
}

#[async_trait]
impl EntryStore for FormsApiClient {
    async fn get_entry(&self, entry_id: EntryId) -> Result<SubmissionEntry, StoreError> {
        info!("Fetching entry {}", entry_id);
        self.get_json(&format!("/wp-json/gf/v2/entries/{}", entry_id))
            .await?
            .ok_or_else(|| StoreError::entry_not_found(entry_id))
    }
}

#[async_trait]
impl UserDirectory for FormsApiClient {
    async fn get_user(&self, user_id: u64) -> Result<Option<UserInfo>, StoreError> {
        let user: Option<SiteUser> = self
            .get_json(&format!("/wp-json/wp/v2/users/{}?context=edit", user_id))
            .await?;

        Ok(user.map(|user| UserInfo {
            user_id: user.id,
            user_email: user.email,
            user_name: user.name,
        }))
    }
}
