//! The HTTP client wrapper.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::ApiError;
use crate::config::ShellConfig;

/// Shape of backend error bodies.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the Outlay backend API.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

#[derive(Debug)]
struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ShellConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// GET `path`, decoding a JSON response.
    ///
    /// Returns `Ok(None)` for a 204 or an empty body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a
    /// response body that is not valid JSON for `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<Option<T>, ApiError> {
        self.request::<T, ()>(Method::GET, path, None, token).await
    }

    /// POST a JSON `body` to `path`, decoding a JSON response.
    ///
    /// Returns `Ok(None)` for a 204 or an empty body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a
    /// response body that is not valid JSON for `T`.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<Option<T>, ApiError> {
        self.request(Method::POST, path, Some(body), token).await
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&SecretString>,
    ) -> Result<Option<T>, ApiError> {
        let url = join_endpoint(&self.inner.base_url, path);

        let mut request = self
            .inner
            .http
            .request(method.clone(), url.as_str())
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        // A request with no body sends no body at all, not an empty object.
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            warn!(%method, path, %status, "backend request failed");
            return Err(ApiError::Status { status, message });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))?;
        debug!(%method, path, %status, "backend request ok");
        Ok(Some(value))
    }
}

/// Join the configured base URL and a request path.
///
/// Plain concatenation rather than `Url::join`, so a base URL carrying a
/// path component (e.g. behind a reverse-proxy prefix) keeps it.
fn join_endpoint(base: &Url, path: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
