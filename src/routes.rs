use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::api::{
    compose_notification, edit_page, entry_finalized, health_check, webhook_payload, AppState,
};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let mut router = Router::new();

    // Health check is always available
    let health_route = Router::new().route("/health", get(health_check));
    router = router.merge(health_route);

    // Platform hooks
    let hook_routes = Router::new()
        .route("/hooks/entry-finalized", post(entry_finalized))
        .route("/hooks/webhook-payload", post(webhook_payload))
        .route("/hooks/notification", post(compose_notification));
    router = router.merge(hook_routes);

    // Edit link target
    let edit_route = Router::new().route("/edit", get(edit_page));
    router = router.merge(edit_route);

    if app_state.hook_auth_token.is_none() {
        info!("Hook routes are not protected by an auth token");
    }

    router.with_state(app_state)
}
