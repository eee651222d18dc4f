//! TCP Flag Inspection
//!
//! Sanity check on the replayed flow: which TCP flags were seen at least once.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::layout::feature_index;
use super::vector::FeatureVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TcpFlag {
    Syn,
    Fin,
    Ack,
    Psh,
}

impl TcpFlag {
    /// Reporting order
    pub const ALL: [TcpFlag; 4] = [TcpFlag::Syn, TcpFlag::Fin, TcpFlag::Ack, TcpFlag::Psh];

    pub fn as_str(&self) -> &'static str {
        match self {
            TcpFlag::Syn => "SYN",
            TcpFlag::Fin => "FIN",
            TcpFlag::Ack => "ACK",
            TcpFlag::Psh => "PSH",
        }
    }

    /// Count column in the feature layout
    pub fn column(&self) -> &'static str {
        match self {
            TcpFlag::Syn => "SYN Flag Count",
            TcpFlag::Fin => "FIN Flag Count",
            TcpFlag::Ack => "ACK Flag Count",
            TcpFlag::Psh => "PSH Flag Count",
        }
    }
}

impl std::fmt::Display for TcpFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static FLAG_INDICES: Lazy<Vec<(TcpFlag, usize)>> = Lazy::new(|| {
    TcpFlag::ALL
        .iter()
        .filter_map(|flag| feature_index(flag.column()).map(|i| (*flag, i)))
        .collect()
});

/// Flags whose count column holds a value > 0
pub fn active_flags(vector: &FeatureVector) -> Vec<TcpFlag> {
    FLAG_INDICES
        .iter()
        .filter(|(_, index)| vector.get(*index).map_or(false, |v| v > 0.0))
        .map(|(flag, _)| *flag)
        .collect()
}

/// Render as `["SYN", "ACK"]` for log lines
pub fn format_flags(flags: &[TcpFlag]) -> String {
    let names: Vec<String> = flags.iter().map(|f| format!("\"{}\"", f.as_str())).collect();
    format!("[{}]", names.join(", "))
}
