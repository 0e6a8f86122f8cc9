use axum::{
    extract::{Json as ExtractJson, Query, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::EditTokenAuth;
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::models::common::{
    EditPageParams, EntryHookRequest, EntryId, HookAuthParams, HookResponse, Notification,
    NotificationHookRequest,
};
use crate::models::editor::EditPage;
use crate::models::payload::SubmissionPayload;
use crate::services::editor::EditorService;
use crate::services::notification::NotificationService;
use crate::services::payload::PayloadAssembler;
use crate::services::store::{EntryStore, FormStore, MetadataStore, UserDirectory};
use crate::services::tokens::{EditLinkBuilder, TokenService};

// AppState struct containing shared resources
pub struct AppState {
    pub entries: Arc<dyn EntryStore>,
    pub tokens: Arc<TokenService>,
    pub payloads: PayloadAssembler,
    pub notifications: NotificationService,
    pub editor: EditorService,
    pub hook_auth_token: Option<String>,
}

impl AppState {
    /// Wire every component to the host's capabilities
    pub fn new(
        config: &ServiceConfig,
        forms: Arc<dyn FormStore>,
        entries: Arc<dyn EntryStore>,
        users: Arc<dyn UserDirectory>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(
            config.edit_token_secret.clone(),
            metadata,
            EditLinkBuilder::new(&config.site_url, &config.edit_page_path),
        ));

        let mut payloads =
            PayloadAssembler::new(Arc::clone(&forms), Arc::clone(&entries), Arc::clone(&tokens))
                .with_max_depth(config.nested_form_max_depth);
        if config.legacy_webhook_fields {
            payloads = payloads.with_legacy_fields(users);
        }

        let editor = EditorService::new(forms, Arc::clone(&entries), Arc::clone(&tokens))
            .with_debug_view(config.edit_debug_view);

        Self {
            entries,
            notifications: NotificationService::new(Arc::clone(&tokens)),
            tokens,
            payloads,
            editor,
            hook_auth_token: config.hook_auth_token.clone(),
        }
    }
}

// Reject hook calls that do not carry the configured shared secret
fn check_hook_auth(state: &AppState, params: &HookAuthParams) -> Result<(), StatusCode> {
    let Some(expected) = &state.hook_auth_token else {
        return Ok(());
    };

    let presented = params.auth.as_deref().unwrap_or_default();
    if EditTokenAuth::tokens_match(expected, presented) {
        Ok(())
    } else {
        warn!("Rejected hook call with missing or invalid auth token");
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::EntryNotFound(_) | ServiceError::FormNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Store(_) => StatusCode::BAD_GATEWAY,
    }
}

// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

// Entry finalized hook: issue and store the edit token
pub async fn entry_finalized(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<HookAuthParams>,
    ExtractJson(request): ExtractJson<EntryHookRequest>,
) -> Result<Json<HookResponse>, StatusCode> {
    check_hook_auth(&state, &auth)?;
    info!("Received entry finalized event for entry {}", request.entry_id);

    let entry = state
        .entries
        .get_entry(request.entry_id)
        .await
        .map_err(|e| {
            let err = ServiceError::for_entry(request.entry_id, e);
            error!("Failed to load entry for token issue: {}", err);
            status_for(&err)
        })?;

    match state.tokens.issue(&entry) {
        Ok(_) => Ok(Json(HookResponse {
            success: true,
            message: format!("Edit token stored for entry {}", entry.id),
        })),
        Err(e) => {
            error!("Failed to store edit token for entry {}: {}", entry.id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Webhook payload hook: build the structured payload for delivery
pub async fn webhook_payload(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<HookAuthParams>,
    ExtractJson(request): ExtractJson<EntryHookRequest>,
) -> Result<Json<SubmissionPayload>, StatusCode> {
    check_hook_auth(&state, &auth)?;
    info!("Received webhook payload request for entry {}", request.entry_id);

    match state.payloads.build_for_entry(request.entry_id).await {
        Ok(payload) => Ok(Json(payload)),
        Err(err) => {
            error!("Failed to build webhook payload: {}", err);
            Err(status_for(&err))
        }
    }
}

// Notification hook: append the edit link to the outgoing message
pub async fn compose_notification(
    State(state): State<Arc<AppState>>,
    Query(auth): Query<HookAuthParams>,
    ExtractJson(request): ExtractJson<NotificationHookRequest>,
) -> Result<Json<Notification>, StatusCode> {
    check_hook_auth(&state, &auth)?;
    info!("Received notification for entry {}", request.entry_id);

    Ok(Json(
        state
            .notifications
            .compose(request.notification, request.entry_id),
    ))
}

// Edit page: verify the link and describe what to render
pub async fn edit_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EditPageParams>,
) -> Json<EditPage> {
    let (Some(raw_id), Some(token)) = (params.gform_update, params.token) else {
        return Json(EditPage::Content);
    };

    let Some(entry_id) = EntryId::parse(&raw_id) else {
        warn!("Edit page requested with malformed entry id");
        return Json(EditPage::Content);
    };

    Json(state.editor.render(entry_id, token.trim()).await)
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
