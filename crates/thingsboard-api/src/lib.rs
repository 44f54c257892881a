// thingsboard-api: Async Rust client for the ThingsBoard REST API
//
// Session-managed client: one connection pool, one cached JWT with expiry
// tracking, and a request pipeline that injects the token, refreshes it
// proactively and reactively, and retries transient failures.

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

mod auth;
mod rpc;
mod telemetry;

pub use client::ThingsboardClient;
pub use config::ClientConfig;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{Telemetry, TelemetryPoint};
