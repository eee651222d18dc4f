//! Decision Event Types
//!
//! Immutable, timestamped record of one routing decision for the audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::dataset::ScoredFlow;
use crate::logic::features::layout::LayoutInfo;
use crate::logic::features::TcpFlag;
use crate::logic::model::Decision;
use crate::logic::monitor::ResourceSample;
use crate::logic::verification::Outcome;

// ============================================================================
// DECISION EVENT
// ============================================================================

/// One JSONL line of the decision log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// Unique event ID
    pub id: String,
    /// When the decision was emitted (UTC)
    pub timestamp: DateTime<Utc>,
    /// Session ID (for correlating events in same run)
    pub session_id: String,

    pub flow_id: String,
    pub flow_duration: f32,
    pub active_flags: Vec<TcpFlag>,
    pub raw: Vec<f32>,
    pub transformed: Vec<f32>,
    pub probability: f32,
    pub decision: Decision,
    pub label: Option<String>,
    pub outcome: Outcome,
    pub latency_ms: f64,
    pub resources: ResourceSample,

    /// Feature layout the vectors were built against
    pub layout: LayoutInfo,
}

impl DecisionEvent {
    pub fn from_flow(flow: &ScoredFlow) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            session_id: get_session_id(),
            flow_id: flow.flow_id.clone(),
            flow_duration: flow.flow_duration(),
            active_flags: flow.active_flags(),
            raw: flow.raw.as_slice().to_vec(),
            transformed: flow.transformed.clone(),
            probability: flow.probability,
            decision: flow.decision,
            label: flow.label.clone(),
            outcome: flow.outcome,
            latency_ms: flow.latency_ms(),
            resources: flow.resources,
            layout: LayoutInfo::current(),
        }
    }

    /// Convert to JSONL line (for append-only log)
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn is_block(&self) -> bool {
        self.decision.is_block()
    }
}

// ============================================================================
// SESSION ID
// ============================================================================

use once_cell::sync::OnceCell;

static SESSION_ID: OnceCell<String> = OnceCell::new();

/// Get the current session ID (generated once per run)
pub fn get_session_id() -> String {
    SESSION_ID
        .get_or_init(|| Uuid::new_v4().to_string())
        .clone()
}
