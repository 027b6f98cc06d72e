//! Token gate decision types.

use serde::{Deserialize, Serialize};

/// Classification of the wallet balance backing AI generation spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceLevel {
    /// Plenty of tokens remaining
    Ok,
    /// Positive but below the low-balance threshold
    Low,
    /// Missing, zero, or negative — gated actions must not proceed
    Empty,
}

impl std::fmt::Display for BalanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Low => write!(f, "low"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

/// Outcome of an admission check against the token ledger.
///
/// Advisory only: the orchestrator performs the actual block/redirect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    pub level: BalanceLevel,
    /// The balance the decision was based on, when one could be read.
    pub balance: Option<f64>,
}

impl GateDecision {
    /// The fail-closed decision used when the ledger cannot be read.
    pub fn denied() -> Self {
        Self {
            allowed: false,
            level: BalanceLevel::Empty,
            balance: None,
        }
    }
}
