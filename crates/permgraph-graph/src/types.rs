//! Graph configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an [`InheritanceGraph`](crate::InheritanceGraph) does with an edge that would close a cycle.
///
/// Self-loops are rejected under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Refuse the edge; `add_dependency` returns false.
    #[default]
    Reject,
    /// Accept the edge. Readers must tolerate cycles.
    Allow,
}

impl CyclePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePolicy::Reject => "reject",
            CyclePolicy::Allow => "allow",
        }
    }
}

impl fmt::Display for CyclePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CyclePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(CyclePolicy::Reject),
            "allow" => Ok(CyclePolicy::Allow),
            other => Err(format!("unknown cycle policy '{other}' (expected 'reject' or 'allow')")),
        }
    }
}
