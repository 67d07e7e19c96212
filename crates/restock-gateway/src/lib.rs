// Client plumbing for the remote list hub
pub mod events;
pub mod hub;
pub mod retry;
pub mod wire;

// Re-export common types
pub use events::{run_event_poller, ChangeBus, ChangeNotice, ChangeSubscription, SubscriptionToken};
pub use hub::{HubClient, HubError};
pub use retry::RetryPolicy;
pub use wire::{WireEvent, WireEventBatch, WireItem, WireItemPatch, WireList, WireListResponse};
