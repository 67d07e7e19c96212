// Sync controller - optimistic local mutation with remote reconciliation
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::classify::{classify, Buckets};
use crate::gateway::{ChangeNotice, ListGateway, SubscriptionToken};
use crate::models::{normalize_name, Item, ItemChange, ListRef};
use crate::prefs::UiPrefs;
use crate::store::ItemStore;
use crate::suggest::{suggest, Suggestion};
use crate::{Error, Result};

/// Where the controller is in its binding lifecycle.
///
/// `Bound` is terminal: once a controller is bound to a list it stays
/// bound for the rest of its life. Mutations are no-ops in the other
/// two states.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BindState {
    Unbound,
    Binding,
    Bound(ListRef),
}

/// What happened to an `add` request.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The hub created the item and it is now in the store
    Added(Item),
    /// A case-insensitive name twin already exists; here is its id so
    /// the caller can open it for editing instead
    Existing(String),
    /// Blank input or controller not bound - nothing happened
    Ignored,
}

struct Inner {
    bind: BindState,
    store: ItemStore,
    rare_days: i64,
    subscription: Option<SubscriptionToken>,
    receiver: Option<mpsc::UnboundedReceiver<ChangeNotice>>,
}

/// Orchestrates the item store, the classifier, and the remote hub.
///
/// Mutations apply locally first and the remote call follows; a failed
/// remote call is logged but never rolls the local change back, so the
/// store can run ahead of the hub until the next successful refresh or
/// change notice. Everything is interleaved async continuations on one
/// logical thread; the inner lock is never held across a remote await,
/// so the store stays readable while a call is in flight.
pub struct SyncController {
    gateway: Arc<dyn ListGateway>,
    inner: Mutex<Inner>,
}

impl SyncController {
    pub fn new(gateway: Arc<dyn ListGateway>, prefs: &UiPrefs) -> Self {
        Self {
            gateway,
            inner: Mutex::new(Inner {
                bind: BindState::Unbound,
                store: ItemStore::new(),
                rare_days: prefs.initial_rare_days(),
                subscription: None,
                receiver: None,
            }),
        }
    }

    /// Bind to a list, subscribe to change notices, and pull the first
    /// snapshot.
    ///
    /// With no explicit scope the controller takes the first list the
    /// hub returns; an empty listing yields [`Error::NoListsAvailable`]
    /// and leaves the controller unbound (callers may try again, the
    /// controller itself never retries). A failed initial fetch still
    /// leaves the controller bound - `refresh` can be called again.
    pub async fn initialize(&self, scope: Option<&str>) -> Result<ListRef> {
        {
            let mut inner = self.inner.lock().await;
            if inner.bind != BindState::Unbound {
                return Err(Error::Config("sync controller already initialized".into()));
            }
            inner.bind = BindState::Binding;
        }

        let list = match scope {
            // An explicit scope is trusted as-is; no listing round trip
            Some(id) => ListRef {
                id: id.to_string(),
                name: id.to_string(),
            },
            None => match self.gateway.lists().await {
                Ok(mut lists) if !lists.is_empty() => lists.remove(0),
                Ok(_) => {
                    self.unbind().await;
                    info!("hub has no lists configured");
                    return Err(Error::NoListsAvailable);
                }
                Err(err) => {
                    self.unbind().await;
                    return Err(err);
                }
            },
        };

        let subscription = self.gateway.subscribe_changes();
        {
            let mut inner = self.inner.lock().await;
            inner.bind = BindState::Bound(list.clone());
            inner.subscription = Some(subscription.token);
            inner.receiver = Some(subscription.receiver);
        }
        info!("bound to list '{}' ({})", list.name, list.id);

        self.refresh().await?;
        Ok(list)
    }

    async fn unbind(&self) {
        self.inner.lock().await.bind = BindState::Unbound;
    }

    /// Pull a full snapshot and replace the store wholesale.
    ///
    /// Concurrent refreshes are not deduplicated; each one replaces the
    /// store in a single locked step, so the last response to complete
    /// wins and partial interleavings cannot happen.
    pub async fn refresh(&self) -> Result<()> {
        let list_id = match self.bound_list_id().await {
            Some(id) => id,
            None => {
                debug!("refresh before bind, skipping");
                return Ok(());
            }
        };

        let snapshot = self.gateway.items(&list_id).await?;

        let mut inner = self.inner.lock().await;
        let count = snapshot.items.len();
        inner.store.replace_all(snapshot.items);
        if let Some(days) = snapshot.rare_days {
            inner.rare_days = days;
        }
        debug!("refreshed {} items from list {}", count, list_id);
        Ok(())
    }

    /// Add an item by name.
    ///
    /// The name is normalized first; if a case-insensitive twin is
    /// already on the list the hub is not called at all and the twin's
    /// id comes back for editing. A genuinely new name goes to the hub
    /// and the item only appears in the store once the hub has assigned
    /// it an id - no optimistic placeholder row.
    pub async fn add(&self, raw_name: &str) -> Result<AddOutcome> {
        let name = normalize_name(raw_name);
        if name.is_empty() {
            debug!("ignoring blank add");
            return Ok(AddOutcome::Ignored);
        }

        let list_id = {
            let inner = self.inner.lock().await;
            let list = match &inner.bind {
                BindState::Bound(list) => list,
                _ => {
                    debug!("add before bind, ignoring");
                    return Ok(AddOutcome::Ignored);
                }
            };

            if let Some(existing) = inner.store.find_by_name(&name) {
                debug!("'{}' already on the list as {}", name, existing.id);
                return Ok(AddOutcome::Existing(existing.id.clone()));
            }

            list.id.clone()
        };

        let item = self.gateway.add_item(&list_id, &name).await?;
        info!("added '{}' as {}", item.name, item.id);

        let mut inner = self.inner.lock().await;
        inner.store.upsert(item.clone());
        Ok(AddOutcome::Added(item))
    }

    /// Flip an item's completion state, optimistically.
    ///
    /// On an incomplete→complete transition the purchase counter and
    /// timestamp are stamped locally before the hub call goes out; the
    /// hub may compute them differently and no read-back corrects the
    /// prediction - the next refresh does. Unchecking clears neither.
    pub async fn toggle_complete(&self, id: &str) {
        let (list_id, new_complete) = {
            let mut inner = self.inner.lock().await;
            let list_id = match &inner.bind {
                BindState::Bound(list) => list.id.clone(),
                _ => {
                    debug!("toggle before bind, ignoring");
                    return;
                }
            };

            let item = match inner.store.get_mut(id) {
                Some(item) => item,
                None => {
                    debug!("toggle on unknown item {}, ignoring", id);
                    return;
                }
            };

            item.complete = !item.complete;
            if item.complete {
                item.counter += 1;
                item.last_updated = Some(Utc::now());
            }
            (list_id, item.complete)
        };

        let change = ItemChange {
            name: None,
            complete: Some(new_complete),
        };
        if let Err(err) = self.gateway.update_item(&list_id, id, change).await {
            warn!("toggle for {} failed on the hub: {}", id, err);
        }
    }

    /// Rename and/or re-check an item, optimistically.
    ///
    /// Unlike `toggle_complete` this path does no counter bookkeeping;
    /// the hub owns the numbers for explicit edits.
    pub async fn edit(&self, id: &str, new_name: &str, complete: bool) {
        let name = normalize_name(new_name);
        if name.is_empty() {
            debug!("ignoring edit with blank name");
            return;
        }

        let list_id = {
            let mut inner = self.inner.lock().await;
            let list_id = match &inner.bind {
                BindState::Bound(list) => list.id.clone(),
                _ => {
                    debug!("edit before bind, ignoring");
                    return;
                }
            };

            let item = match inner.store.get_mut(id) {
                Some(item) => item,
                None => {
                    debug!("edit on unknown item {}, ignoring", id);
                    return;
                }
            };

            item.name = name.clone();
            item.complete = complete;
            list_id
        };

        let change = ItemChange {
            name: Some(name),
            complete: Some(complete),
        };
        if let Err(err) = self.gateway.update_item(&list_id, id, change).await {
            warn!("edit for {} failed on the hub: {}", id, err);
        }
    }

    /// Remove an item, optimistically.
    pub async fn remove(&self, id: &str) {
        let list_id = {
            let mut inner = self.inner.lock().await;
            let list_id = match &inner.bind {
                BindState::Bound(list) => list.id.clone(),
                _ => {
                    debug!("remove before bind, ignoring");
                    return;
                }
            };

            if inner.store.remove(id).is_none() {
                debug!("remove on unknown item {}, ignoring", id);
                return;
            }
            list_id
        };

        if let Err(err) = self.gateway.remove_item(&list_id, id).await {
            warn!("remove for {} failed on the hub: {}", id, err);
        }
    }

    /// Drop every completed item, optimistically.
    pub async fn clear_completed(&self) {
        let list_id = {
            let mut inner = self.inner.lock().await;
            let list_id = match &inner.bind {
                BindState::Bound(list) => list.id.clone(),
                _ => {
                    debug!("clear before bind, ignoring");
                    return;
                }
            };

            inner.store.retain(|item| !item.complete);
            list_id
        };

        if let Err(err) = self.gateway.clear_completed(&list_id).await {
            warn!("clear completed failed on the hub: {}", err);
        }
    }

    /// React to a change notice from another client.
    ///
    /// A notice for our list, or one with no list at all, means our
    /// snapshot may be stale - refetch. Notices for other lists are
    /// ignored.
    pub async fn on_remote_change(&self, notice: ChangeNotice) {
        let relevant = {
            let inner = self.inner.lock().await;
            match (&inner.bind, &notice.list_id) {
                (BindState::Bound(list), Some(changed)) => list.id == *changed,
                (BindState::Bound(_), None) => true,
                _ => false,
            }
        };

        if !relevant {
            debug!("change notice for {:?} is not ours, ignoring", notice.list_id);
            return;
        }

        debug!("change notice for bound list, refreshing");
        if let Err(err) = self.refresh().await {
            warn!("refresh after change notice failed: {}", err);
        }
    }

    /// Forward change notices into `on_remote_change` until the
    /// subscription closes. Runs forever unless `shutdown` is called;
    /// spawn it.
    pub async fn pump_changes(&self) {
        let mut receiver = {
            let mut inner = self.inner.lock().await;
            match inner.receiver.take() {
                Some(receiver) => receiver,
                None => {
                    debug!("no change subscription to pump");
                    return;
                }
            }
        };

        while let Some(notice) = receiver.recv().await {
            self.on_remote_change(notice).await;
        }
        debug!("change channel closed, pump stopping");
    }

    /// Tear down the change subscription. Closes the channel, which in
    /// turn stops a running `pump_changes`.
    pub async fn shutdown(&self) {
        let token = self.inner.lock().await.subscription.take();
        if let Some(token) = token {
            self.gateway.unsubscribe(token);
        }
    }

    /// Classify the current store into display buckets as of `now`.
    pub async fn buckets_at(&self, now: DateTime<Utc>) -> Buckets {
        let inner = self.inner.lock().await;
        classify(inner.store.items(), inner.rare_days, now)
    }

    pub async fn buckets(&self) -> Buckets {
        self.buckets_at(Utc::now()).await
    }

    /// Substring suggestions over the current store.
    pub async fn suggest(&self, query: &str) -> Vec<Suggestion> {
        let inner = self.inner.lock().await;
        suggest(inner.store.items(), query, inner.rare_days, Utc::now())
    }

    /// Snapshot of the store contents, in insertion order.
    pub async fn items(&self) -> Vec<Item> {
        self.inner.lock().await.store.items().to_vec()
    }

    /// The list this controller is bound to, once initialized.
    pub async fn scope(&self) -> Option<ListRef> {
        match &self.inner.lock().await.bind {
            BindState::Bound(list) => Some(list.clone()),
            _ => None,
        }
    }

    /// Threshold currently separating recent from rare.
    pub async fn rare_days(&self) -> i64 {
        self.inner.lock().await.rare_days
    }

    async fn bound_list_id(&self) -> Option<String> {
        match &self.inner.lock().await.bind {
            BindState::Bound(list) => Some(list.id.clone()),
            _ => None,
        }
    }
}
