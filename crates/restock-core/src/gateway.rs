use crate::models::{Item, ItemChange, ItemsSnapshot, ListRef};
use crate::Result;

pub use restock_gateway::{ChangeNotice, ChangeSubscription, SubscriptionToken};

/// Trait for the remote list hub - makes testing easier and keeps things flexible
///
/// The sync controller talks to the remote store exclusively through
/// this trait, so tests can swap in fakes and mocks without a hub
/// anywhere in sight.
///
/// Change notices use an explicit subscribe/unsubscribe token contract:
/// the controller registers one subscription at bind time and drops it
/// on teardown.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ListGateway: Send + Sync {
    /// All lists the hub knows about, in the hub's order
    async fn lists(&self) -> Result<Vec<ListRef>>;

    /// Full item snapshot for one list
    async fn items(&self, list_id: &str) -> Result<ItemsSnapshot>;

    /// Create an item; the hub assigns and returns the id
    async fn add_item(&self, list_id: &str, name: &str) -> Result<Item>;

    /// Apply a partial change to one item
    async fn update_item(&self, list_id: &str, item_id: &str, change: ItemChange) -> Result<()>;

    /// Delete one item
    async fn remove_item(&self, list_id: &str, item_id: &str) -> Result<()>;

    /// Drop all completed items from a list
    async fn clear_completed(&self, list_id: &str) -> Result<()>;

    /// Register for change notices from other clients
    fn subscribe_changes(&self) -> ChangeSubscription;

    /// Tear down a subscription created by [`subscribe_changes`](Self::subscribe_changes)
    fn unsubscribe(&self, token: SubscriptionToken);
}

#[cfg(test)]
mod tests {
    use super::*;

    // The automocked gateway backs the simpler controller tests; make
    // sure it behaves as a trait object the way the real one does.
    #[tokio::test]
    async fn test_mock_gateway_works_as_trait_object() {
        let mut mock = MockListGateway::new();
        mock.expect_lists().returning(|| {
            Ok(vec![ListRef {
                id: "l1".to_string(),
                name: "Groceries".to_string(),
            }])
        });
        mock.expect_add_item().returning(|_, name| {
            Ok(Item {
                id: "srv-1".to_string(),
                name: name.to_string(),
                complete: false,
                counter: 0,
                last_updated: None,
            })
        });

        let gateway: Box<dyn ListGateway> = Box::new(mock);
        assert_eq!(gateway.lists().await.unwrap()[0].id, "l1");
        assert_eq!(gateway.add_item("l1", "Milk").await.unwrap().name, "Milk");
    }
}
