//! HTTP collaborator for the monitoring backend.
//!
//! The dashboard controller and the alert monitor never touch `reqwest`
//! directly; they go through the [`RecordSource`] / [`AlertSource`] seams so
//! tests can substitute scripted sources. [`HttpSensorClient`] is the one
//! production implementation, speaking the backend's wire protocol:
//! - `GET {base}/api/sensors/{endpoint}` with pagination/sort/filter params
//! - `GET {base}/api/alerts/recent`
//! - `POST`/`GET {base}/api/settings`
//!
//! A bearer token is attached when (and only when) the session store holds a
//! non-blank one.

use std::future::Future;
use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::context::SessionStore;
use crate::dashboard::QueryState;
use crate::error::FetchError;
use crate::models::{AlertBatch, PageResult, ThresholdRequest, ThresholdSetting};

// ---

/// Source of record pages for one sensor endpoint.
pub trait RecordSource<R> {
    /// Fetch the page described by `query`. `status_key` names the wire
    /// query parameter carrying the status filter for this sensor type.
    fn fetch_page(
        &self,
        endpoint: &str,
        status_key: &str,
        query: &QueryState,
    ) -> impl Future<Output = Result<PageResult<R>, FetchError>> + Send;
}

/// Source of recent alert batches.
pub trait AlertSource {
    fn recent_alerts(&self) -> impl Future<Output = Result<AlertBatch, FetchError>> + Send;
}

// Shared sources: one client behind an Arc can feed several dashboards and
// the alert monitor at once.
impl<R, T: RecordSource<R> + Sync> RecordSource<R> for Arc<T> {
    fn fetch_page(
        &self,
        endpoint: &str,
        status_key: &str,
        query: &QueryState,
    ) -> impl Future<Output = Result<PageResult<R>, FetchError>> + Send {
        (**self).fetch_page(endpoint, status_key, query)
    }
}

impl<T: AlertSource + Sync> AlertSource for Arc<T> {
    fn recent_alerts(&self) -> impl Future<Output = Result<AlertBatch, FetchError>> + Send {
        (**self).recent_alerts()
    }
}

// ---

/// `reqwest`-backed client for the monitoring backend.
///
/// Cheap to clone; clones share the connection pool and the session store.
#[derive(Debug, Clone)]
pub struct HttpSensorClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl HttpSensorClient {
    // ---
    pub fn new(config: &Config, session: SessionStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    /// Issue an authenticated GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, FetchError> {
        // ---
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} with {} params", url, params.len());

        let mut request = self.http.get(&url).query(params);
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;
        Self::decode(response).await
    }

    /// Map the response status onto the fetch taxonomy, then parse.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
        // ---
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(FetchError::Unauthorized),
            StatusCode::FORBIDDEN => Err(FetchError::Forbidden),
            status if !status.is_success() => Err(FetchError::Status(status.as_u16())),
            _ => response
                .json::<T>()
                .await
                .map_err(|e| FetchError::Decode(e.to_string())),
        }
    }

    /// Store a new alert threshold.
    pub async fn save_threshold(
        &self,
        request: &ThresholdRequest,
    ) -> Result<ThresholdSetting, FetchError> {
        // ---
        let url = format!("{}/api/settings", self.base_url);
        debug!("POST {} ({} / {})", url, request.metric, request.threshold_value);

        let mut req = self.http.post(&url).json(request);
        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;
        Self::decode(response).await
    }

    /// List the stored alert thresholds.
    pub async fn fetch_thresholds(&self) -> Result<Vec<ThresholdSetting>, FetchError> {
        self.get_json("/api/settings", &[]).await
    }
}

impl<R: DeserializeOwned + Send> RecordSource<R> for HttpSensorClient {
    async fn fetch_page(
        &self,
        endpoint: &str,
        status_key: &str,
        query: &QueryState,
    ) -> Result<PageResult<R>, FetchError> {
        // ---
        let params = query.wire_params(status_key);
        self.get_json(&format!("/api/sensors/{endpoint}"), &params).await
    }
}

impl AlertSource for HttpSensorClient {
    async fn recent_alerts(&self) -> Result<AlertBatch, FetchError> {
        self.get_json("/api/alerts/recent", &[]).await
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn test_config(url: &str) -> Config {
        // ---
        Config {
            api_base_url: url.to_string(),
            page_size: 10,
            refresh_interval_secs: 60,
            alert_poll_secs: 60,
            alert_display_ms: 5_000,
            alert_advance_ms: 100,
            theme: crate::context::Theme::Dark,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        // ---
        let client = HttpSensorClient::new(&test_config("http://localhost:8080/"), SessionStore::new());
        assert_eq!(client.base_url, "http://localhost:8080");

        let client = HttpSensorClient::new(&test_config("http://localhost:8080"), SessionStore::new());
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
