//! Console Sink
//!
//! Human-readable per-flow block on the `log` facade.

use super::DecisionSink;
use crate::logic::dataset::ScoredFlow;
use crate::logic::features::format_flags;

#[derive(Debug, Default)]
pub struct ConsoleSink {
    emitted: u64,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

/// Lines for one flow, in print order
pub fn render(flow: &ScoredFlow) -> Vec<String> {
    let truth = flow.label.as_deref().unwrap_or("-");
    let cpu = match flow.resources.cpu_percent {
        Some(cpu) => format!("{:.1}%", cpu),
        None => "n/a".to_string(),
    };

    vec![
        "-".repeat(60),
        format!("📦 FLOW ID: {} | Duration: {:.2}ms", flow.flow_id, flow.flow_duration()),
        format!("🚩 Active Flags: {}", format_flags(&flow.active_flags())),
        format!("🤖 AI Verdict: {} (Confidence: {:.4})", flow.decision, flow.probability),
        format!("🎯 Ground Truth: {} | {}", truth, flow.outcome),
        format!(
            "⚡ Latency: {:.4} ms | 💾 RAM: {:.2} MB | CPU: {}",
            flow.latency_ms(),
            flow.resources.memory_mb,
            cpu
        ),
    ]
}

/// Mitigation notice for blocked flows
pub const MITIGATION_NOTICE: &str = "🚨 ACTION: FIREWALL RULE UPDATED -> DROP PACKET";

impl DecisionSink for ConsoleSink {
    fn emit(&mut self, flow: &ScoredFlow) -> std::io::Result<()> {
        for line in render(flow) {
            log::info!("{}", line);
        }
        if flow.decision.is_block() {
            log::warn!("{}", MITIGATION_NOTICE);
        }
        self.emitted += 1;
        Ok(())
    }
}
