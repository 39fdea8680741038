//! Persisted account configuration.
//!
//! The host stores these values between runs. Passwords never end up here;
//! only the token pair obtained from a login does.

use serde::{Deserialize, Serialize};
use swipelist_core::config::DEFAULT_API_URL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    /// `swipelist_{user id}`, or the email when the service reports no id.
    pub unique_id: String,
    pub title: String,
    pub email: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl ConfigEntry {
    /// Copy of the entry carrying a new token pair.
    #[must_use]
    pub fn with_tokens(&self, token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            token,
            refresh_token,
            ..self.clone()
        }
    }
}
