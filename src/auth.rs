use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::models::common::EntryId;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Edit token primitives
pub struct EditTokenAuth;

impl EditTokenAuth {
    /// Generate a random secret for deployments that do not configure one
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Derive the edit token for an entry.
    ///
    /// The token is a hex HMAC-SHA256 keyed by the server secret over the entry
    /// id followed by its creation timestamp, so it changes with either input.
    pub fn generate_token(secret: &str, entry_id: EntryId, date_created: &str) -> String {
        let content = format!("{}{}", entry_id, date_created);

        debug!("Deriving edit token for entry {}", entry_id);

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(content.as_bytes());

        hex::encode(mac.finalize().into_bytes())
    }

    /// Timing-safe comparison of a stored token against a presented one.
    ///
    /// An empty value on either side never matches.
    pub fn tokens_match(stored: &str, presented: &str) -> bool {
        if stored.is_empty() || presented.is_empty() {
            return false;
        }
        bool::from(stored.as_bytes().ct_eq(presented.as_bytes()))
    }

    /// Short prefix of a token that is safe to log
    pub fn token_prefix(token: &str) -> String {
        let prefix: String = token.chars().take(8).collect();
        format!("{}...", prefix)
    }
}
