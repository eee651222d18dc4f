//! Decision Threshold
//!
//! Maps the malicious probability to the router action.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_THRESHOLD;
use crate::logic::error::RouterError;

/// Router action for a scored flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Allow,
    Block,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Block => "BLOCK",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Decision::Block)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed-threshold decision policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecisionPolicy {
    /// Probability at or above which a flow is blocked (0.0 - 1.0)
    threshold: f32,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

impl DecisionPolicy {
    pub fn new(threshold: f32) -> Result<Self, RouterError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RouterError::Config(format!(
                "threshold {} outside [0, 1]",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// BLOCK iff `probability >= threshold`; a tie blocks
    pub fn decide(&self, probability: f32) -> Decision {
        if probability >= self.threshold {
            Decision::Block
        } else {
            Decision::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        assert_eq!(DecisionPolicy::default().threshold(), 0.5);
    }

    #[test]
    fn test_boundary_blocks() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(0.5), Decision::Block);
        assert_eq!(policy.decide(0.499_999), Decision::Allow);
    }

    #[test]
    fn test_decide_sweep() {
        let policy = DecisionPolicy::default();
        for i in 0..=1000 {
            let p = i as f32 / 1000.0;
            let expected = if p >= 0.5 { Decision::Block } else { Decision::Allow };
            assert_eq!(policy.decide(p), expected, "p = {}", p);
        }
    }

    #[test]
    fn test_scenarios() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(0.73), Decision::Block);
        assert_eq!(policy.decide(0.10), Decision::Allow);
        assert_eq!(policy.decide(0.61), Decision::Block);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = DecisionPolicy::new(0.8).unwrap();
        assert_eq!(policy.decide(0.73), Decision::Allow);
        assert_eq!(policy.decide(0.8), Decision::Block);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(DecisionPolicy::new(1.5).is_err());
        assert!(DecisionPolicy::new(-0.1).is_err());
        assert!(DecisionPolicy::new(f32::NAN).is_err());
    }

    #[test]
    fn test_decision_serialization() {
        assert_eq!(serde_json::to_string(&Decision::Block).unwrap(), "\"BLOCK\"");
        assert_eq!(Decision::Allow.to_string(), "ALLOW");
    }
}
