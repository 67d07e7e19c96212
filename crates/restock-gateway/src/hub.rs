use thiserror::Error;

use crate::retry::{is_transient_status, retrying, RetryPolicy};
use crate::wire::{WireEventBatch, WireItem, WireItemPatch, WireList, WireListResponse};

const DEFAULT_HUB_BASE: &str = "http://127.0.0.1:8123";

#[derive(Error, Debug)]
pub enum HubError {
    #[error("hub request failed: {0}")]
    RequestFailed(String),

    #[error("hub rejected request: {0}")]
    Rejected(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HubError>;

/// HTTP client for the list hub's JSON API.
///
/// One client per hub; cheap to clone (reqwest pools connections under
/// the hood). All calls except the event long-poll go through the retry
/// policy.
#[derive(Clone)]
pub struct HubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl HubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(token, DEFAULT_HUB_BASE.to_string())
    }

    /// For hubs not listening on the default address
    pub fn with_base_url(token: Option<String>, base_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("restock/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Create client with custom retry policy
    pub fn with_retry_policy(token: Option<String>, retry_policy: RetryPolicy) -> Self {
        let mut client = Self::new(token);
        client.retry_policy = retry_policy;
        client
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();

        if status == 404 {
            return Err(HubError::NotFound(what.to_string()));
        }

        if status == 401 {
            return Err(HubError::AuthRequired);
        }

        if status == 429 {
            return Err(HubError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if is_transient_status(status) {
                return Err(HubError::RequestFailed(format!(
                    "Status {}: {}",
                    status, body
                )));
            }

            return Err(HubError::Rejected(format!("Status {}: {}", status, body)));
        }

        Ok(response)
    }

    /// All configured lists, in the hub's order
    pub async fn lists(&self) -> Result<Vec<WireList>> {
        let url = format!("{}/api/lists", self.base_url);

        retrying(&self.retry_policy, || async {
            let request = self.authorize(self.client.get(&url));
            let response = Self::check(request.send().await?, "lists").await?;
            let lists: Vec<WireList> = response.json().await?;
            Ok(lists)
        })
        .await
    }

    /// Full item snapshot for one list, settings included
    pub async fn items(&self, list_id: &str) -> Result<WireListResponse> {
        let url = format!("{}/api/lists/{}/items", self.base_url, list_id);

        retrying(&self.retry_policy, || async {
            let request = self.authorize(self.client.get(&url));
            let response = Self::check(request.send().await?, list_id).await?;
            let body: WireListResponse = response.json().await?;
            Ok(body)
        })
        .await
    }

    /// Create an item; the hub assigns the id
    pub async fn add_item(&self, list_id: &str, name: &str) -> Result<WireItem> {
        let url = format!("{}/api/lists/{}/items", self.base_url, list_id);
        let payload = serde_json::json!({ "name": name });

        retrying(&self.retry_policy, || async {
            let request = self.authorize(self.client.post(&url)).json(&payload);
            let response = Self::check(request.send().await?, list_id).await?;
            let item: WireItem = response.json().await?;
            Ok(item)
        })
        .await
    }

    /// Patch name and/or completion state of an item
    pub async fn update_item(
        &self,
        list_id: &str,
        item_id: &str,
        patch: &WireItemPatch,
    ) -> Result<WireItem> {
        let url = format!(
            "{}/api/lists/{}/items/{}",
            self.base_url, list_id, item_id
        );

        retrying(&self.retry_policy, || async {
            let request = self.authorize(self.client.patch(&url)).json(patch);
            let response = Self::check(request.send().await?, item_id).await?;
            let item: WireItem = response.json().await?;
            Ok(item)
        })
        .await
    }

    /// Delete an item permanently
    pub async fn remove_item(&self, list_id: &str, item_id: &str) -> Result<()> {
        let url = format!(
            "{}/api/lists/{}/items/{}",
            self.base_url, list_id, item_id
        );

        retrying(&self.retry_policy, || async {
            let request = self.authorize(self.client.delete(&url));
            Self::check(request.send().await?, item_id).await?;
            Ok(())
        })
        .await
    }

    /// Drop every completed item from a list in one call
    pub async fn clear_completed(&self, list_id: &str) -> Result<()> {
        let url = format!("{}/api/lists/{}/clear-completed", self.base_url, list_id);

        retrying(&self.retry_policy, || async {
            let request = self.authorize(self.client.post(&url));
            Self::check(request.send().await?, list_id).await?;
            Ok(())
        })
        .await
    }

    /// Long-poll the hub for change events past `cursor`.
    ///
    /// Deliberately not retried: the event pump loops on this anyway, and
    /// stacking retries under a long-poll just delays reconnection.
    pub async fn poll_events(&self, cursor: u64) -> Result<WireEventBatch> {
        let url = format!("{}/api/events", self.base_url);

        let request = self
            .authorize(self.client.get(&url))
            .query(&[("cursor", cursor.to_string())]);
        let response = Self::check(request.send().await?, "events").await?;
        let batch: WireEventBatch = response.json().await?;
        Ok(batch)
    }
}
