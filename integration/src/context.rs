//! Per-process registry of configured accounts.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use swipelist_core::{ClientConfig, SwipeListClient};
use tracing::{debug, info};

use crate::coordinator::{DataSource, ListsCoordinator, ReauthTrigger};
use crate::entry::ConfigEntry;
use crate::error::SetupError;
use crate::todo::SwipeListTodoEntity;

/// Client and coordinator of one configured entry.
pub struct Account {
    pub entry: ConfigEntry,
    pub client: Arc<SwipeListClient>,
    pub coordinator: Arc<ListsCoordinator>,
}

/// Outcome of a successful setup.
#[derive(Debug)]
pub struct Setup {
    /// Set when the session was refreshed during the first poll; the host
    /// should persist it in place of the stored entry.
    pub updated_entry: Option<ConfigEntry>,
}

#[derive(Default)]
pub struct AppContext {
    accounts: RwLock<HashMap<String, Arc<Account>>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the client from the stored tokens, run the first poll and
    /// register the account. Fails if that first poll fails, or with
    /// `AlreadyConfigured` when a live account shares the entry id or the
    /// unique id.
    pub async fn setup_entry(
        &self,
        entry: ConfigEntry,
        reauth: Arc<dyn ReauthTrigger>,
    ) -> Result<Setup, SetupError> {
        self.ensure_unregistered(&entry)?;
        let client = SwipeListClient::new(&ClientConfig::new(&entry.api_url))
            .map_err(SetupError::Config)?
            .with_tokens(entry.token.clone(), entry.refresh_token.clone());
        let client = Arc::new(client);

        let source: Arc<dyn DataSource> = client.clone();
        let coordinator = Arc::new(ListsCoordinator::new(&entry.entry_id, source, reauth));
        coordinator.first_refresh().await?;

        let (token, refresh_token) = (client.token(), client.refresh_token());
        let updated_entry = (token != entry.token || refresh_token != entry.refresh_token)
            .then(|| entry.with_tokens(token, refresh_token));
        if updated_entry.is_some() {
            debug!(entry_id = %entry.entry_id, "session tokens rotated during setup");
        }

        let account = Arc::new(Account {
            entry: updated_entry.clone().unwrap_or(entry),
            client,
            coordinator,
        });
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        // Another setup of the same account may have finished while we polled.
        if let Some(id) = conflicting_id(&accounts, &account.entry) {
            return Err(SetupError::AlreadyConfigured(id));
        }
        info!(
            entry_id = %account.entry.entry_id,
            lists = account.coordinator.data().lists.len(),
            "account set up"
        );
        accounts.insert(account.entry.entry_id.clone(), account);

        Ok(Setup { updated_entry })
    }

    fn ensure_unregistered(&self, entry: &ConfigEntry) -> Result<(), SetupError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        match conflicting_id(&accounts, entry) {
            Some(id) => Err(SetupError::AlreadyConfigured(id)),
            None => Ok(()),
        }
    }

    /// Forget an account. Returns false if it was not registered.
    pub fn unload_entry(&self, entry_id: &str) -> bool {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entry_id)
            .is_some()
    }

    pub fn account(&self, entry_id: &str) -> Option<Arc<Account>> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entry_id)
            .cloned()
    }

    /// One entity per list in the account's latest snapshot.
    pub fn entities(&self, entry_id: &str) -> Vec<SwipeListTodoEntity> {
        self.new_entities(entry_id, &HashSet::new())
    }

    /// Entities for lists whose id is not in `known`, e.g. lists created
    /// since the platform last looked.
    pub fn new_entities(&self, entry_id: &str, known: &HashSet<String>) -> Vec<SwipeListTodoEntity> {
        let Some(account) = self.account(entry_id) else {
            return Vec::new();
        };
        account
            .coordinator
            .data()
            .lists
            .into_iter()
            .filter(|list| list.id_string().is_some_and(|id| !known.contains(&id)))
            .filter_map(|list| {
                SwipeListTodoEntity::new(account.client.clone(), account.coordinator.clone(), list)
            })
            .collect()
    }
}

/// The id under which `entry` clashes with a registered account, if any.
fn conflicting_id(accounts: &HashMap<String, Arc<Account>>, entry: &ConfigEntry) -> Option<String> {
    if accounts.contains_key(&entry.entry_id) {
        return Some(entry.entry_id.clone());
    }
    accounts
        .values()
        .any(|account| account.entry.unique_id == entry.unique_id)
        .then(|| entry.unique_id.clone())
}
