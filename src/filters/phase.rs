//! Callback phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// When a callback runs relative to the action body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Runs ahead of the action and may halt the chain
    Before,

    /// Runs once the action (or the halted chain) has finished
    After,

    /// Wraps the remaining chain and the action body
    Around,
}

impl Phase {
    /// All phases in dispatch order
    pub const ALL: [Phase; 3] = [Phase::Before, Phase::Around, Phase::After];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
            Phase::Around => "around",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Before.to_string(), "before");
        assert_eq!(Phase::Around.to_string(), "around");
        assert_eq!(Phase::After.to_string(), "after");
    }

    #[test]
    fn test_phase_serde_lowercase() {
        let json = serde_json::to_string(&Phase::Around).unwrap();
        assert_eq!(json, "\"around\"");

        let phase: Phase = serde_json::from_str("\"before\"").unwrap();
        assert_eq!(phase, Phase::Before);
    }
}
