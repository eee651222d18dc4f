//! Verification Unit
//!
//! CHỈ so sánh decision với ground truth - không có scoring.
//!
//! The dataset labels dozens of attack families; the classifier is binary, so
//! every label other than the benign sentinel counts as malicious truth. The
//! sentinel comparison is case-sensitive (`"BENIGN"` ≠ `"Benign"`).

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BENIGN_LABEL;
use crate::logic::model::Decision;

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    /// Decision agrees with the label
    Correct,
    /// Decision disagrees with the label
    Miss,
    /// No label available for this flow
    Unverified,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "CORRECT",
            Outcome::Miss => "MISS",
            Outcome::Unverified => "UNVERIFIED",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VERIFIER
// ============================================================================

#[derive(Debug, Clone)]
pub struct Verifier {
    benign_label: String,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(DEFAULT_BENIGN_LABEL)
    }
}

impl Verifier {
    pub fn new(benign_label: &str) -> Self {
        Self { benign_label: benign_label.to_string() }
    }

    pub fn benign_label(&self) -> &str {
        &self.benign_label
    }

    /// Binary truth of a label: true = malicious
    pub fn is_malicious(&self, label: &str) -> bool {
        label != self.benign_label
    }

    pub fn verify(&self, decision: Decision, label: Option<&str>) -> Outcome {
        let Some(label) = label else {
            return Outcome::Unverified;
        };

        let malicious = self.is_malicious(label);
        match (decision, malicious) {
            (Decision::Block, true) | (Decision::Allow, false) => Outcome::Correct,
            _ => Outcome::Miss,
        }
    }
}

// ============================================================================
// OUTCOME TALLY
// ============================================================================

/// Running count of verification outcomes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub correct: u64,
    pub miss: u64,
    pub unverified: u64,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Miss => self.miss += 1,
            Outcome::Unverified => self.unverified += 1,
        }
    }

    pub fn verified(&self) -> u64 {
        self.correct + self.miss
    }

    /// Accuracy over verified flows only; None until one flow was verified
    pub fn accuracy(&self) -> Option<f64> {
        let verified = self.verified();
        if verified == 0 {
            None
        } else {
            Some(self.correct as f64 / verified as f64)
        }
    }
}
