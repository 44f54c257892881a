// Device RPC endpoints
//
// One-way commands via `POST /api/plugins/rpc/twoway/{id}`. The platform
// acknowledges *receipt*, not execution: the device applies the command
// and reports its actual state back through telemetry, so callers verify
// effects by re-reading telemetry.

use serde_json::{Value, json};
use tracing::debug;

use crate::client::{RequestSpec, ThingsboardClient};
use crate::error::Error;

/// Platform-side timeout for delivering the RPC to the device, in millis.
const RPC_TIMEOUT_MS: u64 = 5000;

impl ThingsboardClient {
    /// Send an RPC command to a device. Fire-and-forget: returns once the
    /// platform acknowledges receipt.
    ///
    /// `setLight` commands are validated before any I/O: `params.state`
    /// must be `"on"` or `"off"`.
    pub async fn send_command(
        &self,
        device_id: &str,
        method: &str,
        params: Value,
    ) -> Result<(), Error> {
        if method == "setLight" {
            validate_light_state(&params)?;
        }

        let body = json!({
            "method": method,
            "params": params,
            "timeout": RPC_TIMEOUT_MS,
        });

        debug!(device_id, method, "sending RPC command");
        let _ack: Value = self
            .send(RequestSpec::post(
                format!("api/plugins/rpc/twoway/{device_id}"),
                body,
            ))
            .await?;
        Ok(())
    }

    /// Turn a device's light on or off.
    ///
    /// Convenience wrapper over [`send_command`](Self::send_command) with
    /// the `setLight` method.
    pub async fn set_light(&self, device_id: &str, state: &str) -> Result<(), Error> {
        self.send_command(device_id, "setLight", json!({ "state": state }))
            .await
    }
}

fn validate_light_state(params: &Value) -> Result<(), Error> {
    match params.get("state").and_then(Value::as_str) {
        Some("on" | "off") => Ok(()),
        other => Err(Error::InvalidArgument {
            message: format!(
                "invalid light state {other:?}: must be \"on\" or \"off\""
            ),
        }),
    }
}
