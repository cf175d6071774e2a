//! REST document store client.
//!
//! Sessions live in a `sessions` collection addressed by record id:
//!
//! ```text
//! PUT    {base}/sessions/{id}          body: SessionRecord JSON (ownerId set)
//! GET    {base}/sessions?ownerId={o}   -> [SessionRecord]
//! DELETE {base}/sessions/{id}
//! DELETE {base}/sessions?ownerId={o}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::RemoteError;
use crate::storage::{sort_newest_first, RemoteConfig, SessionRecord};
use crate::sync::remote::RemoteStore;

const SESSIONS_COLLECTION: &str = "sessions";

pub struct HttpRemoteStore {
    client: reqwest::Client,
    base: Url,
    api_token: Option<String>,
}

impl HttpRemoteStore {
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Unavailable(format!(
                "'{base_url}' cannot be used as a base URL"
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            api_token,
        })
    }

    /// # Errors
    /// Returns an error if the configured base URL is invalid.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        Self::new(
            &config.base_url,
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    fn collection_url(&self, id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`: the base always has path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(SESSIONS_COLLECTION);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    fn owner_url(&self, owner_id: &str) -> Url {
        let mut url = self.collection_url(None);
        url.query_pairs_mut().append_pair("ownerId", owner_id);
        url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let resp = self.authorize(req).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn put(&self, owner_id: &str, record: &SessionRecord) -> Result<(), RemoteError> {
        let mut doc = record.clone();
        doc.owner_id = Some(owner_id.to_string());
        let url = self.collection_url(Some(&doc.id));
        self.send(self.client.put(url).json(&doc)).await?;
        Ok(())
    }

    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<SessionRecord>, RemoteError> {
        let resp = self.send(self.client.get(self.owner_url(owner_id))).await?;
        let body = resp.text().await?;
        let docs: Vec<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        // Unreadable documents are skipped one by one.
        let mut records: Vec<SessionRecord> = docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.get("id").and_then(|v| v.as_str()).unwrap_or("?").to_string();
                match serde_json::from_value(doc) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!(owner_id, id = %id, error = %e, "skipping unreadable remote session");
                        None
                    }
                }
            })
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        match self.send(self.client.delete(self.collection_url(Some(id)))).await {
            Ok(_) | Err(RemoteError::Status { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn batch_delete_by_owner(&self, owner_id: &str) -> Result<(), RemoteError> {
        self.send(self.client.delete(self.owner_url(owner_id))).await?;
        Ok(())
    }
}
