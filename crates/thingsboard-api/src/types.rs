// Telemetry and RPC wire types.
//
// The timeseries endpoints return `{ key: [{ts, value}, ...] }` with every
// value serialized as a string, whatever its underlying type. Absent keys
// simply don't appear in the map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single telemetry sample. `ts` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    pub ts: i64,
    pub value: String,
}

/// Telemetry keyed by name, each with its time-ordered samples.
///
/// An empty map is a valid result: a device that has never reported, or an
/// empty response body, yields no keys rather than an error.
pub type Telemetry = HashMap<String, Vec<TelemetryPoint>>;
