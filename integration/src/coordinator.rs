//! Polling coordinator for one account.
//!
//! # Design
//! The host owns the schedule and calls `refresh` on every tick. The
//! coordinator keeps the last successful snapshot so a transient outage, or
//! a session that needs re-authentication, does not make every list vanish:
//! as long as an earlier poll returned lists, failures hand back that data.
//! Only when there is nothing to fall back on does a poll fail.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use swipelist_core::{ApiResult, ShoppingList, SwipeListClient, Transport};
use tracing::{debug, info, warn};

use crate::error::UpdateFailed;

/// Result of one successful poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListsSnapshot {
    pub lists: Vec<ShoppingList>,
}

impl ListsSnapshot {
    pub fn list(&self, list_id: &str) -> Option<&ShoppingList> {
        self.lists
            .iter()
            .find(|list| list.id_string().as_deref() == Some(list_id))
    }
}

/// Anything that can produce a fresh snapshot.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> ApiResult<ListsSnapshot>;
}

#[async_trait]
impl<T: Transport + 'static> DataSource for SwipeListClient<T> {
    async fn fetch(&self) -> ApiResult<ListsSnapshot> {
        Ok(ListsSnapshot {
            lists: self.get_lists().await?,
        })
    }
}

/// Asks the host to run the re-authentication flow for an entry.
pub trait ReauthTrigger: Send + Sync {
    fn start_reauth(&self, entry_id: &str);
}

impl<F> ReauthTrigger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn start_reauth(&self, entry_id: &str) {
        self(entry_id)
    }
}

type Listener = Arc<dyn Fn(&ListsSnapshot) + Send + Sync>;

pub struct ListsCoordinator {
    entry_id: String,
    source: Arc<dyn DataSource>,
    reauth: Arc<dyn ReauthTrigger>,
    data: RwLock<ListsSnapshot>,
    listeners: RwLock<Vec<Listener>>,
}

impl ListsCoordinator {
    pub fn new(entry_id: &str, source: Arc<dyn DataSource>, reauth: Arc<dyn ReauthTrigger>) -> Self {
        Self {
            entry_id: entry_id.to_string(),
            source,
            reauth,
            data: RwLock::new(ListsSnapshot::default()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Latest snapshot handed out by `refresh`.
    pub fn data(&self) -> ListsSnapshot {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Called with the snapshot after every refresh that produced data.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&ListsSnapshot) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Initial poll during setup. Nothing is cached yet, so any failure fails.
    pub async fn first_refresh(&self) -> Result<ListsSnapshot, UpdateFailed> {
        self.refresh().await
    }

    /// Poll the source once.
    ///
    /// An auth failure additionally asks the host to start re-authentication.
    /// Either kind of failure falls back to the previous snapshot when it held
    /// at least one list.
    pub async fn refresh(&self) -> Result<ListsSnapshot, UpdateFailed> {
        let snapshot = match self.source.fetch().await {
            Ok(snapshot) => {
                debug!(entry_id = %self.entry_id, count = snapshot.lists.len(), "fetched lists");
                *self.data.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
                snapshot
            }
            Err(err) => {
                if err.is_auth() {
                    warn!(entry_id = %self.entry_id, error = %err, "authentication failed, triggering re-auth");
                    self.reauth.start_reauth(&self.entry_id);
                } else {
                    warn!(entry_id = %self.entry_id, error = %err, "API error");
                }
                let cached = self.data();
                if cached.lists.is_empty() {
                    return Err(UpdateFailed::from(err));
                }
                info!(entry_id = %self.entry_id, "returning cached data");
                cached
            }
        };
        self.notify(&snapshot);
        Ok(snapshot)
    }

    /// Refresh after a local change. Failures are logged, not returned; the
    /// change itself already succeeded.
    pub async fn request_refresh(&self) {
        if let Err(err) = self.refresh().await {
            warn!(entry_id = %self.entry_id, error = %err, "refresh after update failed");
        }
    }

    fn notify(&self, snapshot: &ListsSnapshot) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner).clone();
        for listener in listeners {
            listener(snapshot);
        }
    }
}
