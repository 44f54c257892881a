// Runtime client configuration.
//
// Carries connection tuning and principal credentials, never touches disk.
// `thingsboard-config` builds one of these from file + environment.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::transport::TlsMode;

/// Configuration for connecting to a single ThingsBoard instance.
///
/// The principal credentials are the service-level tenant account used
/// to authenticate this client, not an end-user login.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Instance base URL (e.g., `http://localhost:8080`).
    pub base_url: Url,
    /// Tenant username for `/api/auth/login`.
    pub username: String,
    /// Tenant password.
    pub password: SecretString,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts per domain call for transient failures.
    pub max_retries: u32,
    /// Linear backoff base: attempt `n` waits `retry_delay * (n - 1)`.
    pub retry_delay: Duration,
    /// Safety window before expiry during which the token is treated as
    /// already expired, so it can't expire mid-request.
    pub refresh_margin: Duration,
    /// Assumed token validity. The login response carries no expiry, so
    /// this mirrors the platform's JWT lifetime (9 h out of the box).
    /// Tune it together with the platform's `jwt.tokenExpirationTime`.
    pub token_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:8080").expect("static URL"),
            username: "tenant@thingsboard.org".into(),
            password: SecretString::from("tenant".to_owned()),
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            refresh_margin: Duration::from_secs(300),
            token_ttl: Duration::from_secs(9 * 60 * 60),
        }
    }
}
