// Hub provider implementation - bridges the HTTP client with the ListGateway trait
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::debug;

use restock_gateway::{
    run_event_poller, ChangeBus, ChangeSubscription, HubClient, HubError, SubscriptionToken,
    WireItem, WireItemPatch, WireList, WireListResponse,
};

use crate::{
    gateway::ListGateway,
    models::{Item, ItemChange, ItemsSnapshot, ListRef},
    Error, Result,
};

/// Wrapper around [`HubClient`] that implements [`ListGateway`].
///
/// Change notices come from a long-poll task feeding a fan-out bus;
/// the task starts on demand with [`start_event_pump`](Self::start_event_pump)
/// and is aborted when the gateway drops.
pub struct HubGateway {
    client: HubClient,
    bus: Arc<ChangeBus>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl HubGateway {
    pub fn new(client: HubClient) -> Self {
        Self {
            client,
            bus: Arc::new(ChangeBus::new()),
            poller: Mutex::new(None),
        }
    }

    /// Spawn the event long-poll task if it is not already running.
    ///
    /// Needs a tokio runtime, which is why it is not part of `new`.
    pub fn start_event_pump(&self) {
        let mut poller = self.poller.lock().expect("poller lock poisoned");
        if poller.is_some() {
            return;
        }

        debug!("starting hub event pump");
        *poller = Some(tokio::spawn(run_event_poller(
            self.client.clone(),
            Arc::clone(&self.bus),
        )));
    }
}

impl Drop for HubGateway {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.lock().expect("poller lock poisoned").take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl ListGateway for HubGateway {
    async fn lists(&self) -> Result<Vec<ListRef>> {
        let lists = self.client.lists().await.map_err(hub_err)?;
        Ok(lists.into_iter().map(wire_to_list).collect())
    }

    async fn items(&self, list_id: &str) -> Result<ItemsSnapshot> {
        let response = self.client.items(list_id).await.map_err(hub_err)?;
        Ok(wire_to_snapshot(response))
    }

    async fn add_item(&self, list_id: &str, name: &str) -> Result<Item> {
        let item = self.client.add_item(list_id, name).await.map_err(hub_err)?;
        Ok(wire_to_item(item))
    }

    async fn update_item(&self, list_id: &str, item_id: &str, change: ItemChange) -> Result<()> {
        let patch = WireItemPatch {
            name: change.name,
            complete: change.complete,
        };

        self.client
            .update_item(list_id, item_id, &patch)
            .await
            .map_err(hub_err)?;
        Ok(())
    }

    async fn remove_item(&self, list_id: &str, item_id: &str) -> Result<()> {
        self.client
            .remove_item(list_id, item_id)
            .await
            .map_err(hub_err)
    }

    async fn clear_completed(&self, list_id: &str) -> Result<()> {
        self.client.clear_completed(list_id).await.map_err(hub_err)
    }

    fn subscribe_changes(&self) -> ChangeSubscription {
        self.bus.subscribe()
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.bus.unsubscribe(token);
    }
}

fn hub_err(err: HubError) -> Error {
    Error::Gateway(err.to_string())
}

/// Convert a wire item to our internal model
fn wire_to_item(wire: WireItem) -> Item {
    Item {
        id: wire.id,
        name: wire.name,
        complete: wire.complete,
        counter: wire.counter,
        last_updated: wire.last_updated,
    }
}

fn wire_to_list(wire: WireList) -> ListRef {
    ListRef {
        id: wire.id,
        name: wire.name,
    }
}

fn wire_to_snapshot(response: WireListResponse) -> ItemsSnapshot {
    ItemsSnapshot {
        items: response.items.into_iter().map(wire_to_item).collect(),
        rare_days: response.settings.map(|s| s.rare_days),
    }
}
