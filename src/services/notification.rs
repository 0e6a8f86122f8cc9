use std::sync::Arc;
use tracing::info;

use crate::models::common::{EntryId, Notification};
use crate::services::tokens::TokenService;

/// Append the edit-link footer to a notification message.
pub fn append_edit_link(message: &mut String, edit_url: &str) {
    message.push_str("\n\n---\n");
    message.push_str(&format!(
        "You can edit your submission by clicking this link: {}\n",
        edit_url
    ));
    message.push_str("This link is secure and will expire when you close your browser.\n");
}

pub struct NotificationService {
    tokens: Arc<TokenService>,
}

impl NotificationService {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Add the edit link for `entry_id` to an outgoing notification.
    /// Entries without a token get the notification back unchanged.
    pub fn compose(&self, mut notification: Notification, entry_id: EntryId) -> Notification {
        if let Some(link) = self.tokens.edit_link_or_none(entry_id) {
            append_edit_link(&mut notification.message, &link.url);
            info!("Added edit link to notification for entry {}", entry_id);
        }
        notification
    }
}
