//! REST client for the external VRF store

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use sonic_vrfleak_common::{ImportMutator, LeakError, LeakResult, SnapshotSource, VrfSnapshot};
use tracing::{debug, instrument};

use crate::commands::*;
use crate::config::StoreConfig;
use crate::tables::fields;

/// VRF store reached over its REST API
#[derive(Debug, Clone)]
pub struct HttpVrfStore {
    client: Client,
    base_url: Url,
}

impl HttpVrfStore {
    /// Create a client for the store at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> LeakResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LeakError::config(format!("invalid store URL '{}': {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LeakError::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    /// Create a client from the `[store]` configuration section
    pub fn from_config(config: &StoreConfig) -> LeakResult<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Base URL requests are built from
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// Turns a non-2xx response into a remote error carrying the store's detail
async fn check(operation: &str, response: Response) -> LeakResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get(fields::DETAIL).map(|d| match d {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
        .unwrap_or(body);

    Err(LeakError::remote(
        operation,
        format!("HTTP {}: {}", status.as_u16(), detail),
    ))
}

fn transport(operation: &str) -> impl Fn(reqwest::Error) -> LeakError + '_ {
    move |e| LeakError::remote(operation, e.to_string())
}

#[async_trait]
impl ImportMutator for HttpVrfStore {
    #[instrument(skip(self))]
    async fn add_import(&self, namespace: &str, name: &str, rt: &str) -> LeakResult<()> {
        const OP: &str = "add_import";
        let url = build_add_import_url(&self.base_url, namespace, name)?;
        debug!(%url, "POST");

        let response = self
            .client
            .post(url)
            .json(&build_add_import_body(rt))
            .send()
            .await
            .map_err(transport(OP))?;
        check(OP, response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_import(&self, namespace: &str, name: &str, rt: &str) -> LeakResult<()> {
        const OP: &str = "remove_import";
        let url = build_remove_import_url(&self.base_url, namespace, name, rt)?;
        debug!(%url, "DELETE");

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(transport(OP))?;
        check(OP, response).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for HttpVrfStore {
    #[instrument(skip(self))]
    async fn fetch_snapshot(&self, namespace: Option<&str>) -> LeakResult<VrfSnapshot> {
        const OP: &str = "fetch_snapshot";
        let url = build_list_vrfs_url(&self.base_url, namespace)?;
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport(OP))?;
        let snapshot = check(OP, response)
            .await?
            .json::<VrfSnapshot>()
            .await
            .map_err(transport(OP))?;

        debug!(vrfs = snapshot.len(), "Fetched snapshot");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_url() {
        let err = HttpVrfStore::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, LeakError::Config { .. }));
    }

    #[test]
    fn test_from_config() {
        let store = HttpVrfStore::from_config(&StoreConfig::default()).unwrap();
        assert_eq!(store.base_url().as_str(), "http://127.0.0.1:8000/");
    }

    #[tokio::test]
    async fn test_dot_segment_fails_before_sending() {
        let store = HttpVrfStore::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = store
            .remove_import("default", "..", "65000:1")
            .await
            .unwrap_err();
        assert!(matches!(err, LeakError::Config { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_store_is_remote_error() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let store = HttpVrfStore::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = store
            .add_import("default", "red", "65000:1")
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("add_import"));
    }
}
