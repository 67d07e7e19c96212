use thiserror::Error;

/// All the ways things can go wrong in restock
///
/// We use thiserror here because it generates the boilerplate for us.
/// Life's too short to manually implement Display and Error traits.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no lists available on the hub")]
    NoListsAvailable,

    #[error("hub call failed: {0}")]
    Gateway(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
