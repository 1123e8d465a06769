use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{ControlError, ErrorDetail};
use super::schemas::{
    CapacityRequest, CapacityResponse, ClearResponse, EntryListResponse, EntryResponse,
    HealthResponse, IntervalRequest, IntervalResponse, ListQuery, MonitoringResponse,
    PinResponse, StatusResponse,
};
use super::HistoryControl;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for a running daemon's control API.
#[derive(Clone)]
pub struct DaemonClient {
    client: Client,
    base_url: Url,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Result<Self, ControlError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ControlError::Transport(format!("invalid daemon url '{base_url}': {e}")))?;
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ControlError::Transport(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse, ControlError> {
        self.send(self.client.get(self.url(&["health"])?)).await
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ControlError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ControlError::Transport(format!("invalid daemon url '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn entry_url(&self, id: &str, action: Option<&str>) -> Result<Url, ControlError> {
        match action {
            Some(action) => self.url(&["entries", id.trim(), action]),
            None => self.url(&["entries", id.trim()]),
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, ControlError> {
        let response = request
            .send()
            .await
            .map_err(|e| ControlError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorDetail>(&body) {
            Ok(detail) => Err(ControlError::Remote(detail)),
            Err(_) => Err(ControlError::Transport(format!("daemon returned {status}: {body}"))),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ControlError> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ControlError::Transport(format!("unexpected response: {e}")))
    }

    async fn post<T: DeserializeOwned>(&self, url: Url) -> Result<T, ControlError> {
        self.send(self.client.post(url)).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T, ControlError> {
        self.send(self.client.put(url).json(body)).await
    }
}

impl HistoryControl for DaemonClient {
    async fn status(&self) -> Result<StatusResponse, ControlError> {
        self.send(self.client.get(self.url(&["status"])?)).await
    }

    async fn list(&self, query: ListQuery) -> Result<EntryListResponse, ControlError> {
        self.send(self.client.get(self.url(&["entries"])?).query(&query))
            .await
    }

    async fn get(&self, id: &str) -> Result<EntryResponse, ControlError> {
        self.send(self.client.get(self.entry_url(id, None)?)).await
    }

    async fn pin(&self, id: &str) -> Result<PinResponse, ControlError> {
        self.post(self.entry_url(id, Some("pin"))?).await
    }

    async fn unpin(&self, id: &str) -> Result<PinResponse, ControlError> {
        self.post(self.entry_url(id, Some("unpin"))?).await
    }

    async fn toggle_pin(&self, id: &str) -> Result<PinResponse, ControlError> {
        self.post(self.entry_url(id, Some("toggle-pin"))?).await
    }

    async fn delete(&self, id: &str) -> Result<EntryResponse, ControlError> {
        self.send(self.client.delete(self.entry_url(id, None)?)).await
    }

    async fn clear(&self, all: bool) -> Result<ClearResponse, ControlError> {
        let request = self
            .client
            .delete(self.url(&["entries"])?)
            .query(&[("all", all)]);
        self.send(request).await
    }

    async fn copy(&self, id: &str) -> Result<EntryResponse, ControlError> {
        self.post(self.entry_url(id, Some("copy"))?).await
    }

    async fn set_paused(&self, paused: bool) -> Result<MonitoringResponse, ControlError> {
        let action = if paused { "pause" } else { "resume" };
        self.post(self.url(&[action])?).await
    }

    async fn set_capacity(&self, capacity: usize) -> Result<CapacityResponse, ControlError> {
        self.put(self.url(&["settings", "capacity"])?, &CapacityRequest { capacity })
            .await
    }

    async fn set_interval(&self, interval_ms: u64) -> Result<IntervalResponse, ControlError> {
        self.put(self.url(&["settings", "interval"])?, &IntervalRequest { interval_ms })
            .await
    }

    async fn show(&self) -> Result<(), ControlError> {
        self.execute(self.client.post(self.url(&["show"])?)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entry_urls_are_escaped() {
        let client = DaemonClient::new("http://127.0.0.1:50677").unwrap();

        assert_eq!(
            client.entry_url("abcd1234", Some("pin")).unwrap().as_str(),
            "http://127.0.0.1:50677/entries/abcd1234/pin"
        );
        assert_eq!(
            client.entry_url("a b/c", None).unwrap().as_str(),
            "http://127.0.0.1:50677/entries/a%20b%2Fc"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            DaemonClient::new("not a url"),
            Err(ControlError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_transport_error() {
        // Port 9 (discard) is not expected to run an HTTP server.
        let client = DaemonClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(client.health().await, Err(ControlError::Transport(_))));
    }
}
