use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logic::features::{FeatureVector, TcpFlag};
use crate::logic::model::Decision;
use crate::logic::monitor::ResourceSample;
use crate::logic::verification::Outcome;

/// Result of one replay iteration. Built once, emitted, then dropped.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScoredFlow {
    pub flow_id: String,

    // ✅ Input (raw + transformed)
    pub raw: FeatureVector,
    pub transformed: Vec<f32>,

    // ✅ Model output
    pub probability: f32,
    pub decision: Decision,

    // ✅ Verification
    pub label: Option<String>,
    pub outcome: Outcome,

    // ✅ Telemetry
    #[serde(with = "duration_ms")]
    pub latency: Duration,
    pub resources: ResourceSample,
}

impl ScoredFlow {
    pub fn flow_duration(&self) -> f32 {
        self.raw.flow_duration()
    }

    pub fn active_flags(&self) -> Vec<TcpFlag> {
        self.raw.active_flags()
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }
}

/// `FL-<unix seconds>-<buffer index>`
pub fn flow_id(unix_secs: i64, index: usize) -> String {
    format!("FL-{}-{}", unix_secs, index)
}

/// Latency serialized as fractional milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(ms.max(0.0) / 1000.0))
    }
}
