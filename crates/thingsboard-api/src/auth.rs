// Authentication
//
// JWT login against `/api/auth/login` and the cached session value type.
// The login request goes straight through the connection pool rather than
// the retry pipeline: a failed login is surfaced to the caller, not retried.

use std::time::{Duration, Instant};

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::client::ThingsboardClient;
use crate::error::Error;

/// A cached authentication session.
///
/// Token and expiry are one value: replacing or clearing the session slot
/// swaps both atomically, so no reader ever observes a token without its
/// expiry (or vice versa).
#[derive(Debug, Clone)]
pub(crate) struct Session {
    token: String,
    expires_at: Instant,
}

/// Shape of the `/api/auth/login` response. The platform also returns a
/// `refreshToken`, which this client ignores in favor of re-login.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

impl Session {
    pub(crate) fn new(token: String, ttl: Duration) -> Self {
        Self {
            token,
            expires_at: Instant::now() + ttl,
        }
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Whether the token is still trustworthy: it must outlive the
    /// refresh margin so it cannot expire mid-request. Inside the margin
    /// or past expiry, the session must be replaced first.
    pub(crate) fn is_fresh(&self, margin: Duration) -> bool {
        self.is_fresh_at(Instant::now(), margin)
    }

    fn is_fresh_at(&self, now: Instant, margin: Duration) -> bool {
        now + margin < self.expires_at
    }
}

impl ThingsboardClient {
    /// Log in with the principal credentials and return a new session.
    ///
    /// The platform's login response carries no expiry, so the session
    /// gets the configured assumed validity window (`token_ttl`).
    pub(crate) async fn authenticate(&self) -> Result<Session, Error> {
        let http = self.http_client().await?;
        let url = self.login_url()?;
        let (username, password) = self.principal();

        debug!("authenticating at {url}");

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let response = http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let body = response.text().await.map_err(Error::Transport)?;
        let login: LoginResponse =
            serde_json::from_str(&body).map_err(|_| Error::Authentication {
                message: "no token in login response".into(),
            })?;

        info!("authenticated with ThingsBoard");
        Ok(Session::new(login.token, self.token_ttl()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARGIN: Duration = Duration::from_secs(300);

    #[test]
    fn fresh_session_outlives_margin() {
        let session = Session::new("jwt".into(), Duration::from_secs(9 * 60 * 60));
        assert!(session.is_fresh(MARGIN));
    }

    #[test]
    fn session_inside_margin_is_stale() {
        // Expires in 100s, margin is 300s: must be refreshed first.
        let session = Session::new("jwt".into(), Duration::from_secs(100));
        assert!(!session.is_fresh(MARGIN));
    }

    #[test]
    fn expired_session_is_stale() {
        let session = Session::new("jwt".into(), Duration::ZERO);
        assert!(!session.is_fresh(MARGIN));
        assert!(!session.is_fresh(Duration::ZERO));
    }

    #[test]
    fn freshness_boundary_is_exclusive() {
        let now = Instant::now();
        let session = Session {
            token: "jwt".into(),
            expires_at: now + MARGIN,
        };
        // Exactly margin away from expiry counts as stale.
        assert!(!session.is_fresh_at(now, MARGIN));
        assert!(session.is_fresh_at(now, MARGIN - Duration::from_secs(1)));
    }
}
