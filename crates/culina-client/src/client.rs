//! Shared HTTP plumbing for the Culina backend.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use culina_core::config::ApiConfig;
use culina_core::error::{CulinaError, Result};

/// Handle to the backend. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct PingResponse {
    #[serde(default)]
    message: String,
}

impl ApiClient {
    /// Build a client from the `[api]` config section.
    ///
    /// A `timeout_secs` of 0 leaves requests without a deadline.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http = builder
            .build()
            .map_err(|e| CulinaError::Config(format!("failed to build HTTP client: {}", e)))?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!(base_url = %base_url, timeout_secs = config.timeout_secs, "API client ready");
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Health check against `GET /ping`. Returns the server's message.
    pub async fn ping(&self) -> Result<String> {
        let response = self.http.get(self.url("ping")).send().await.map_err(transport)?;
        let body: PingResponse = check_status(response)?.json().await.map_err(transport)?;
        debug!(message = %body.message, "Ping answered");
        Ok(body.message)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

pub(crate) fn transport(err: reqwest::Error) -> CulinaError {
    CulinaError::Transport(err.to_string())
}

pub(crate) fn server_error(status: StatusCode) -> String {
    format!("Server error: {}", status.as_u16())
}

/// Turn a non-2xx response into a transport error.
pub(crate) fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(CulinaError::Transport(server_error(status)))
    }
}
