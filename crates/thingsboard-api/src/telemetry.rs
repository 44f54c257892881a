// Telemetry endpoints
//
// Latest values and historical timeseries, both via
// `GET /api/plugins/telemetry/DEVICE/{id}/values/timeseries`.

use tracing::debug;

use crate::client::{RequestSpec, ThingsboardClient};
use crate::error::Error;
use crate::types::Telemetry;

fn timeseries_path(device_id: &str) -> String {
    format!("api/plugins/telemetry/DEVICE/{device_id}/values/timeseries")
}

impl ThingsboardClient {
    /// Fetch the most recent value for every telemetry key the device
    /// has reported.
    pub async fn get_latest_telemetry(&self, device_id: &str) -> Result<Telemetry, Error> {
        debug!(device_id, "fetching latest telemetry");
        self.send(RequestSpec::get(timeseries_path(device_id))).await
    }

    /// Fetch historical telemetry in `[start_ts, end_ts]` (epoch millis),
    /// capped at `limit` samples per key.
    ///
    /// `keys` restricts which telemetry keys are returned; `None` (or an
    /// empty slice) leaves it to the server default of all keys.
    pub async fn get_telemetry_history(
        &self,
        device_id: &str,
        start_ts: i64,
        end_ts: i64,
        keys: Option<&[&str]>,
        limit: u32,
    ) -> Result<Telemetry, Error> {
        if limit == 0 {
            return Err(Error::InvalidArgument {
                message: "limit must be positive".into(),
            });
        }

        let mut spec = RequestSpec::get(timeseries_path(device_id));
        spec.query = vec![
            ("startTs", start_ts.to_string()),
            ("endTs", end_ts.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(keys) = keys {
            if !keys.is_empty() {
                spec.query.push(("keys", keys.join(",")));
            }
        }

        debug!(device_id, start_ts, end_ts, "fetching telemetry history");
        self.send(spec).await
    }
}
