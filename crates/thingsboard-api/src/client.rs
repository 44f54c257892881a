// Session-managed HTTP client
//
// Wraps `reqwest::Client` with JWT injection, proactive/reactive token
// refresh, and bounded retry for transient failures. Endpoint groups
// (telemetry, rpc) are implemented as inherent methods in separate files
// to keep this module focused on the request pipeline.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Session;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Session-managed async client for the ThingsBoard REST API.
///
/// Cheaply cloneable: construct one at process start and clone the handle
/// into request handlers. All clones share one connection pool and one
/// cached session, so concurrent callers never trigger more than one
/// login per token expiry.
#[derive(Clone)]
pub struct ThingsboardClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: TransportConfig,
    /// Connection pool slot. Created on first use, dropped by `close()`,
    /// recreated on demand by the next call.
    http: Mutex<Option<reqwest::Client>>,
    /// Cached session. Token and expiry live and die together; `None`
    /// forces the next call to authenticate before proceeding.
    session: Mutex<Option<Session>>,
}

/// Classification of a single request attempt. The retry driver in
/// [`ThingsboardClient::send`] loops over these.
enum Outcome<T> {
    Success(T),
    Unauthorized { body: String },
    Transient(reqwest::Error),
    Failed { status: u16, body: String },
}

/// One domain call, before token injection.
pub(crate) struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestSpec {
    pub(crate) fn get(path: String) -> Self {
        Self {
            method: Method::GET,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn post(path: String, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path,
            query: Vec::new(),
            body: Some(body),
        }
    }
}

impl ThingsboardClient {
    /// Create a new client from configuration. Does not connect -- the
    /// pool and the session are both created lazily on the first call.
    pub fn new(config: ClientConfig) -> Self {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                http: Mutex::new(None),
                session: Mutex::new(None),
            }),
        }
    }

    /// Access the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Release the connection pool.
    ///
    /// Idempotent and safe to call before any pool exists. The cached
    /// token survives (it is still valid server-side); a later domain
    /// call recreates the pool on demand rather than failing.
    pub async fn close(&self) {
        let mut slot = self.inner.http.lock().await;
        if slot.take().is_some() {
            debug!("connection pool released");
        }
    }

    /// The login endpoint URL (used by the auth module, which bypasses
    /// the retry pipeline).
    pub(crate) fn login_url(&self) -> Result<Url, Error> {
        self.inner.base_url_join("api/auth/login")
    }

    /// The principal (service-level) credentials.
    pub(crate) fn principal(&self) -> (&str, &secrecy::SecretString) {
        (&self.inner.config.username, &self.inner.config.password)
    }

    /// Assumed token validity window.
    pub(crate) fn token_ttl(&self) -> std::time::Duration {
        self.inner.config.token_ttl
    }

    // ── Pool management ──────────────────────────────────────────────

    /// Get or lazily create the shared connection pool.
    pub(crate) async fn http_client(&self) -> Result<reqwest::Client, Error> {
        let mut slot = self.inner.http.lock().await;
        if let Some(http) = slot.as_ref() {
            return Ok(http.clone());
        }
        debug!("creating connection pool");
        let http = self.inner.transport.build_client()?;
        *slot = Some(http.clone());
        Ok(http)
    }

    // ── Session management ───────────────────────────────────────────

    /// Return a token that is good for at least `refresh_margin`,
    /// authenticating first if the cached one is missing or stale.
    ///
    /// The session mutex is held across the login request, so concurrent
    /// callers racing on an expiring token issue exactly one login;
    /// the rest wait and reuse its result.
    pub(crate) async fn ensure_session(&self) -> Result<String, Error> {
        let mut slot = self.inner.session.lock().await;
        if let Some(session) = slot.as_ref() {
            if session.is_fresh(self.inner.config.refresh_margin) {
                return Ok(session.token().to_owned());
            }
            debug!("cached token inside refresh margin, re-authenticating");
        }
        let session = self.authenticate().await?;
        let token = session.token().to_owned();
        *slot = Some(session);
        Ok(token)
    }

    /// Drop the cached session, forcing the next call to re-authenticate.
    pub(crate) async fn invalidate_session(&self) {
        *self.inner.session.lock().await = None;
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Execute one domain call: inject the current token, classify the
    /// attempt, and drive retries.
    ///
    /// Transient failures (connect/timeout) get up to `max_retries`
    /// attempts with linear backoff. A 401 invalidates the session and
    /// replays the request exactly once with a fresh token; a second 401
    /// is surfaced. Any other non-2xx response is surfaced immediately.
    /// Empty 2xx bodies decode to `T::default()`.
    pub(crate) async fn send<T>(&self, spec: RequestSpec) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.inner.base_url_join(&spec.path)?;
        let max_retries = self.inner.config.max_retries.max(1);

        let mut attempt: u32 = 1;
        let mut reauthenticated = false;

        loop {
            let token = self.ensure_session().await?;

            match self.dispatch(&spec, &url, &token).await? {
                Outcome::Success(value) => return Ok(value),
                Outcome::Unauthorized { body } => {
                    if reauthenticated {
                        // Fresh token was also rejected; stop here.
                        return Err(Error::Api { status: 401, body });
                    }
                    warn!("received 401, discarding cached token");
                    self.invalidate_session().await;
                    reauthenticated = true;
                }
                Outcome::Transient(err) => {
                    if attempt >= max_retries {
                        warn!("request failed after {max_retries} attempts: {err}");
                        return Err(Error::RetriesExhausted {
                            attempts: max_retries,
                            source: err,
                        });
                    }
                    warn!("request failed (attempt {attempt}/{max_retries}), retrying: {err}");
                    tokio::time::sleep(self.inner.config.retry_delay * attempt).await;
                    attempt += 1;
                }
                Outcome::Failed { status, body } => {
                    return Err(Error::Api { status, body });
                }
            }
        }
    }

    /// Perform a single attempt and classify the result.
    async fn dispatch<T>(
        &self,
        spec: &RequestSpec,
        url: &Url,
        token: &str,
    ) -> Result<Outcome<T>, Error>
    where
        T: DeserializeOwned + Default,
    {
        let http = self.http_client().await?;

        debug!("{} {}", spec.method, url);

        let mut request = http
            .request(spec.method.clone(), url.clone())
            .header("X-Authorization", format!("Bearer {token}"));
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        if let Some(ref body) = spec.body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() || err.is_connect() => {
                return Ok(Outcome::Transient(err));
            }
            Err(err) => return Err(Error::Transport(err)),
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Ok(Outcome::Unauthorized { body });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(Outcome::Failed {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(Error::Transport)?;
        if body.is_empty() {
            // Some endpoints (RPC ack among them) return nothing on success.
            return Ok(Outcome::Success(T::default()));
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(Outcome::Success(value)),
            Err(e) => Err(Error::Deserialization {
                message: e.to_string(),
                body,
            }),
        }
    }
}

impl ClientInner {
    /// Build a full URL for an API path (e.g. `api/auth/login`),
    /// tolerating base URLs with or without a trailing slash.
    fn base_url_join(&self, path: &str) -> Result<Url, Error> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}")).map_err(Error::InvalidUrl)
    }
}
