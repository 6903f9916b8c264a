use serde::{Deserialize, Serialize};

/// Discrete confidence that a detected identity is a real speaking character
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// Tier under the default thresholds
    pub fn from_dialogue_count(dialogue_count: u32) -> Self {
        ConfidenceThresholds::default().tier(dialogue_count)
    }
}

/// Dialogue-count thresholds for tiers and default review pre-selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub high: u32,
    pub medium: u32,
    /// Identities at or above this count start out selected for confirmation
    pub precheck: u32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 5,
            medium: 3,
            precheck: 3,
        }
    }
}

impl ConfidenceThresholds {
    pub fn tier(&self, dialogue_count: u32) -> ConfidenceTier {
        if dialogue_count >= self.high {
            ConfidenceTier::High
        } else if dialogue_count >= self.medium {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn is_prechecked(&self, dialogue_count: u32) -> bool {
        dialogue_count >= self.precheck
    }
}
