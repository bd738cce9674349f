// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP implementation of [`VacuumApi`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::capabilities::{CONSUMABLE_MONITORING, MAP_SEGMENTATION};
use crate::error::{ParseError, ProtocolError, Result};
use crate::protocol::VacuumApi;
use crate::telemetry::{
    Consumable, MapPayload, PositionPayload, RobotIdentity, Segment, StateAttribute, parse_map,
    parse_position, parse_state_attributes,
};

// ============================================================================
// HttpConfig - Connection parameters
// ============================================================================

/// Configuration for a robot reachable over HTTP.
///
/// # Examples
///
/// ```
/// use valetudo_bridge::protocol::HttpConfig;
/// use std::time::Duration;
///
/// // Simple configuration
/// let config = HttpConfig::new("192.168.1.60");
///
/// // With all options
/// let config = HttpConfig::new("192.168.1.60")
///     .with_port(8080)
///     .with_https()
///     .with_credentials("valetudo", "password")
///     .with_timeout(Duration::from_secs(3));
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a new HTTP configuration for the specified host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the default request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the credentials if set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns the default request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_client(self) -> std::result::Result<HttpClient, ProtocolError> {
        let base_url = normalize_base_url(&self.base_url())?;

        let client = Client::builder().build().map_err(ProtocolError::Http)?;

        let credentials = self
            .credentials
            .map(|(username, password)| Credentials { username, password });

        Ok(HttpClient {
            base_url: Arc::new(RwLock::new(base_url)),
            client,
            credentials,
            timeout: self.timeout,
        })
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// HTTP client for a single robot.
///
/// Cloning is cheap and clones share the address, so an address update
/// through [`VacuumApi::set_address`] is seen by every clone.
///
/// # Examples
///
/// ```no_run
/// use valetudo_bridge::protocol::{HttpClient, VacuumApi};
///
/// # async fn example() -> valetudo_bridge::Result<()> {
/// let client = HttpClient::new("192.168.1.60")?;
/// let identity = client.fetch_identity().await?;
/// println!("{}", identity.display_name());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: Arc<RwLock<String>>,
    client: Client,
    credentials: Option<Credentials>,
    timeout: Duration,
}

/// HTTP basic authentication credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SystemInfoBody {
    system_id: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RobotInfoBody {
    manufacturer: String,
    model_name: String,
}

impl HttpClient {
    /// Creates a new HTTP client for the specified host.
    ///
    /// The host may carry a scheme and port; `http://` is assumed otherwise.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn new(host: impl Into<String>) -> std::result::Result<Self, ProtocolError> {
        let base_url = normalize_base_url(&host.into())?;

        let client = Client::builder().build().map_err(ProtocolError::Http)?;

        Ok(Self {
            base_url: Arc::new(RwLock::new(base_url)),
            client,
            credentials: None,
            timeout: HttpConfig::DEFAULT_TIMEOUT,
        })
    }

    /// Sets basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Sets the default request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL of the robot.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.base_url.read().clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.read())
    }

    fn capability_path(capability: &str) -> String {
        format!(
            "/api/v2/robot/capabilities/{}",
            urlencoding::encode(capability)
        )
    }

    fn map_send_error(error: reqwest::Error, timeout: Duration) -> ProtocolError {
        if error.is_timeout() {
            ProtocolError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
        } else {
            ProtocolError::Http(error)
        }
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> std::result::Result<String, ProtocolError> {
        let request = match &self.credentials {
            Some(creds) => request.basic_auth(&creds.username, Some(&creds.password)),
            None => request,
        };

        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, timeout))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Self::map_send_error(e, timeout))
    }

    async fn get(&self, path: &str, timeout: Duration) -> std::result::Result<String, ProtocolError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "Sending HTTP GET");

        let body = self.execute(self.client.get(&url), timeout).await?;

        tracing::debug!(url = %url, bytes = body.len(), "Received HTTP response");
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.get(path, self.timeout).await?;
        Ok(serde_json::from_str(&body).map_err(ParseError::Json)?)
    }

    async fn put(&self, path: &str, payload: &serde_json::Value) -> Result<()> {
        let url = self.url(path);
        tracing::debug!(url = %url, payload = %payload, "Sending HTTP PUT");

        self.execute(self.client.put(&url).json(payload), self.timeout)
            .await?;
        Ok(())
    }
}

impl VacuumApi for HttpClient {
    fn address(&self) -> String {
        self.base_url()
    }

    fn set_address(&self, address: &str) -> std::result::Result<(), ProtocolError> {
        let base_url = normalize_base_url(address)?;
        *self.base_url.write() = base_url;
        Ok(())
    }

    async fn fetch_identity(&self) -> Result<RobotIdentity> {
        let system: SystemInfoBody = self.get_json("/api/v2/valetudo").await?;
        let robot: RobotInfoBody = self.get_json("/api/v2/robot").await?;

        Ok(RobotIdentity {
            system_id: system.system_id,
            manufacturer: robot.manufacturer,
            model_name: robot.model_name,
        })
    }

    async fn fetch_capabilities(&self) -> Result<Vec<String>> {
        self.get_json("/api/v2/robot/capabilities").await
    }

    async fn fetch_state_attributes(&self) -> Result<Vec<StateAttribute>> {
        let body = self
            .get("/api/v2/robot/state/attributes", self.timeout)
            .await?;
        Ok(parse_state_attributes(&body)?)
    }

    async fn fetch_full_map(&self, timeout: Duration) -> Result<MapPayload> {
        let body = self.get("/api/v2/robot/state/map", timeout).await?;
        Ok(parse_map(&body)?)
    }

    async fn fetch_position(&self) -> Result<PositionPayload> {
        let body = self.get("/api/v2/robot/state/map", self.timeout).await?;
        Ok(parse_position(&body)?)
    }

    async fn fetch_consumables(&self) -> Result<Vec<Consumable>> {
        self.get_json(&Self::capability_path(CONSUMABLE_MONITORING))
            .await
    }

    async fn fetch_presets(&self, capability: &str) -> Result<Vec<String>> {
        let path = format!("{}/presets", Self::capability_path(capability));
        self.get_json(&path).await
    }

    async fn fetch_segments(&self) -> Result<Vec<Segment>> {
        self.get_json(&Self::capability_path(MAP_SEGMENTATION)).await
    }

    async fn send_control_command(
        &self,
        capability: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        self.put(&Self::capability_path(capability), &payload).await
    }

    async fn apply_preset(&self, capability: &str, name: &str) -> Result<()> {
        let path = format!("{}/preset", Self::capability_path(capability));
        self.put(&path, &serde_json::json!({ "name": name })).await
    }
}

fn normalize_base_url(address: &str) -> std::result::Result<String, ProtocolError> {
    let address = address.trim().trim_end_matches('/');
    if address.is_empty() || address.contains(char::is_whitespace) {
        return Err(ProtocolError::InvalidAddress(address.to_string()));
    }

    if address.starts_with("http://") || address.starts_with("https://") {
        Ok(address.to_string())
    } else {
        Ok(format!("http://{address}"))
    }
}
