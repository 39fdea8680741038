//! Login and re-authentication flows.
//!
//! Both flows exchange email and password for a token pair and return the
//! entry the host should persist. The password itself is dropped as soon as
//! the login call returns.

use swipelist_core::config::{ClientConfig, DEFAULT_API_URL, DOMAIN};
use swipelist_core::SwipeListClient;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entry::ConfigEntry;
use crate::error::FlowError;

/// What the user typed into the setup form.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub email: String,
    pub password: String,
    pub api_url: Option<String>,
}

/// Log in and build a new entry, refusing accounts that are already set up.
pub async fn login(input: &UserInput, existing: &[ConfigEntry]) -> Result<ConfigEntry, FlowError> {
    let api_url = input.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
    let client = SwipeListClient::new(&ClientConfig::new(api_url))?;

    let info = client.authenticate(&input.email, &input.password).await.map_err(|err| {
        warn!(error = %err, "login failed");
        FlowError::from(err)
    })?;

    let user_email = info.user_email().unwrap_or(&input.email).to_string();
    let unique_id = format!("{DOMAIN}_{}", info.user_id().unwrap_or_else(|| user_email.clone()));
    if existing.iter().any(|entry| entry.unique_id == unique_id) {
        return Err(FlowError::AlreadyConfigured(unique_id));
    }

    info!(%unique_id, "account configured");
    Ok(ConfigEntry {
        entry_id: Uuid::new_v4().to_string(),
        unique_id,
        title: format!("SwipeList ({user_email})"),
        email: input.email.clone(),
        api_url: client.base_url().to_string(),
        token: client.token(),
        refresh_token: client.refresh_token(),
    })
}

/// Log in again for an entry whose session could not be refreshed.
pub async fn reauth(entry: &ConfigEntry, email: &str, password: &str) -> Result<ConfigEntry, FlowError> {
    let client = SwipeListClient::new(&ClientConfig::new(&entry.api_url))?;
    client.authenticate(email, password).await?;

    info!(entry_id = %entry.entry_id, "re-authentication successful");
    Ok(ConfigEntry {
        email: email.to_string(),
        token: client.token(),
        refresh_token: client.refresh_token(),
        ..entry.clone()
    })
}
