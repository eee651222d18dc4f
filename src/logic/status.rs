//! Run Statistics
//!
//! Counters accumulated by the replay driver and reported when it stops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::dataset::ScoredFlow;
use crate::logic::error::RouterError;
use crate::logic::model::Decision;
use crate::logic::verification::OutcomeTally;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    /// Flows scored and emitted
    pub processed: u64,
    pub allowed: u64,
    pub blocked: u64,
    /// Flows dropped on a per-flow error
    pub skipped: u64,
    pub schema_errors: u64,
    pub inference_errors: u64,
    pub outcomes: OutcomeTally,
    pub peak_memory_mb: f64,
    latency_sum_ms: f64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            processed: 0,
            allowed: 0,
            blocked: 0,
            skipped: 0,
            schema_errors: 0,
            inference_errors: 0,
            outcomes: OutcomeTally::default(),
            peak_memory_mb: 0.0,
            latency_sum_ms: 0.0,
        }
    }

    pub fn record(&mut self, flow: &ScoredFlow) {
        self.processed += 1;
        match flow.decision {
            Decision::Allow => self.allowed += 1,
            Decision::Block => self.blocked += 1,
        }
        self.outcomes.record(flow.outcome);
        self.latency_sum_ms += flow.latency_ms();
        self.peak_memory_mb = self.peak_memory_mb.max(flow.resources.memory_mb);
    }

    pub fn record_skip(&mut self, error: &RouterError) {
        self.skipped += 1;
        match error {
            RouterError::SchemaMismatch(_) => self.schema_errors += 1,
            RouterError::Inference(_) => self.inference_errors += 1,
            _ => {}
        }
    }

    /// Mean transform+score latency over processed flows
    pub fn avg_latency_ms(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.latency_sum_ms / self.processed as f64
        }
    }

    pub fn log_summary(&self) {
        let uptime = Utc::now().signed_duration_since(self.started_at);
        log::info!("=== Run summary ({}s) ===", uptime.num_seconds());
        log::info!(
            "   Flows: {} processed ({} ALLOW / {} BLOCK), {} skipped",
            self.processed,
            self.allowed,
            self.blocked,
            self.skipped
        );
        if self.skipped > 0 {
            log::info!(
                "   Skipped: {} schema mismatch, {} inference error",
                self.schema_errors,
                self.inference_errors
            );
        }
        match self.outcomes.accuracy() {
            Some(accuracy) => log::info!(
                "   Outcomes: {} CORRECT / {} MISS / {} UNVERIFIED (accuracy {:.2}%)",
                self.outcomes.correct,
                self.outcomes.miss,
                self.outcomes.unverified,
                accuracy * 100.0
            ),
            None => log::info!("   Outcomes: {} UNVERIFIED", self.outcomes.unverified),
        }
        log::info!(
            "   Latency: {:.4} ms avg | Peak RAM: {:.2} MB",
            self.avg_latency_ms(),
            self.peak_memory_mb
        );
    }
}
