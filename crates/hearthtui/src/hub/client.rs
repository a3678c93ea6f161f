use std::ops::Deref;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::instrument;

use super::entity::service_domain;
use super::entity::Entity;
use super::error::HubError;

/// Request timeout applied to every hub call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Operations offered by a home-automation hub.
///
/// Implementations must be opened before any network call and closed after.
/// Callers normally go through [`Session`], which pairs the two for them.
#[async_trait]
pub trait Hub: Send + Sync {
    /// Establish the authenticated transport
    fn open(&mut self) -> Result<(), HubError>;

    /// Release the transport and any pooled connections
    fn close(&mut self);

    /// Probe the API root. Never fails: any problem reads as "not connected".
    async fn check_connection(&self) -> bool;

    /// Fetch every entity known to the hub
    async fn get_states(&self) -> Result<Vec<Entity>, HubError>;

    /// Fetch a single entity
    async fn get_state(&self, entity_id: &str) -> Result<Entity, HubError>;

    /// Fetch hub configuration (version, location name, units, ...)
    async fn get_config(&self) -> Result<Map<String, Value>, HubError>;

    /// Invoke `domain.service`, optionally targeted at one entity
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: Option<&str>,
        params: Map<String, Value>,
    ) -> Result<Value, HubError>;

    async fn turn_on(
        &self,
        entity_id: &str,
        params: Map<String, Value>,
    ) -> Result<Value, HubError> {
        self.call_service(service_domain(entity_id), "turn_on", Some(entity_id), params)
            .await
    }

    async fn turn_off(&self, entity_id: &str) -> Result<Value, HubError> {
        self.call_service(
            service_domain(entity_id),
            "turn_off",
            Some(entity_id),
            Map::new(),
        )
        .await
    }

    async fn toggle(&self, entity_id: &str) -> Result<Value, HubError> {
        self.call_service(
            service_domain(entity_id),
            "toggle",
            Some(entity_id),
            Map::new(),
        )
        .await
    }
}

/// An open hub session.
///
/// Dereferences to the hub; the hub is closed when the session is dropped,
/// whichever way the owning scope is left.
pub struct Session<'a, H: Hub + ?Sized> {
    hub: &'a mut H,
}

impl<'a, H: Hub + ?Sized> Session<'a, H> {
    pub fn open(hub: &'a mut H) -> Result<Self, HubError> {
        hub.open()?;
        Ok(Self { hub })
    }
}

impl<H: Hub + ?Sized> Deref for Session<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.hub
    }
}

impl<H: Hub + ?Sized> Drop for Session<'_, H> {
    fn drop(&mut self) {
        self.hub.close();
    }
}

/// REST client for a Home Assistant compatible hub
pub struct HubClient {
    server: String,
    token: String,
    timeout: Duration,

    /// Present only while a session is open
    http: Option<reqwest::Client>,
}

impl HubClient {
    /// Create a client for `server` (e.g. `http://localhost:8123`).
    ///
    /// Trailing slashes are stripped so paths can be appended directly.
    pub fn new(server: &str, token: impl Into<String>) -> Self {
        Self {
            server: server.trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
            http: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_open(&self) -> bool {
        self.http.is_some()
    }

    /// The underlying HTTP client, available only inside a session
    pub fn http(&self) -> Result<&reqwest::Client, HubError> {
        self.http.as_ref().ok_or(HubError::SessionNotOpen)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value, HubError> {
        let url = self.url(path);
        let response = self
            .http()?
            .get(&url)
            .send()
            .await
            .map_err(|source| HubError::Request {
                url: url.clone(),
                source,
            })?;

        read_json(url, response).await
    }
}

async fn read_json(url: String, response: reqwest::Response) -> Result<Value, HubError> {
    let status = response.status();
    if !status.is_success() {
        return Err(HubError::Status { url, status });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| HubError::Decode {
            url,
            message: e.to_string(),
        })
}

#[async_trait]
impl Hub for HubClient {
    fn open(&mut self) -> Result<(), HubError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(HubError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(format!("hearthtui/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(HubError::Client)?;

        debug!("Opened hub session for {}", self.server);
        self.http = Some(http);
        Ok(())
    }

    fn close(&mut self) {
        if self.http.take().is_some() {
            debug!("Closed hub session for {}", self.server);
        }
    }

    #[instrument(skip(self), fields(server = %self.server))]
    async fn check_connection(&self) -> bool {
        let Ok(http) = self.http() else {
            return false;
        };

        match http.get(self.url("/api/")).send().await {
            Ok(response) => {
                debug!("Connection probe returned {}", response.status());
                response.status() == StatusCode::OK
            }
            Err(e) => {
                debug!("Connection probe failed: {}", e);
                false
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_states(&self) -> Result<Vec<Entity>, HubError> {
        let body = self.get_json("/api/states").await?;
        let items = body.as_array().ok_or_else(|| HubError::Decode {
            url: self.url("/api/states"),
            message: "expected a JSON array".to_string(),
        })?;

        Ok(items.iter().map(Entity::from_api).collect())
    }

    #[instrument(skip(self))]
    async fn get_state(&self, entity_id: &str) -> Result<Entity, HubError> {
        let body = self.get_json(&format!("/api/states/{}", entity_id)).await?;
        Ok(Entity::from_api(&body))
    }

    #[instrument(skip(self))]
    async fn get_config(&self) -> Result<Map<String, Value>, HubError> {
        match self.get_json("/api/config").await? {
            Value::Object(config) => Ok(config),
            _ => Err(HubError::Decode {
                url: self.url("/api/config"),
                message: "expected a JSON object".to_string(),
            }),
        }
    }

    #[instrument(skip(self, params))]
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: Option<&str>,
        mut params: Map<String, Value>,
    ) -> Result<Value, HubError> {
        if let Some(entity_id) = entity_id {
            params.insert("entity_id".to_string(), Value::from(entity_id));
        }

        let url = self.url(&format!("/api/services/{}/{}", domain, service));
        let response = self
            .http()?
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(|source| HubError::Request {
                url: url.clone(),
                source,
            })?;

        read_json(url, response).await
    }
}
