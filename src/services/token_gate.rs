//! Token gate: admission control for metered AI actions.
//!
//! Every gated action consumes metered spend, so the gate fails closed:
//! if the ledger cannot be read for any reason, the action is refused.

use std::sync::Arc;
use tracing::{instrument, warn};

use crate::domain::models::{BalanceLevel, GateConfig, GateDecision};
use crate::domain::ports::TokenLedger;

/// Classifies the wallet balance and decides whether a metered action may
/// proceed. Advisory: the orchestrator performs the actual block/redirect.
pub struct TokenGate {
    ledger: Arc<dyn TokenLedger>,
    low_threshold: f64,
}

impl TokenGate {
    pub fn new(ledger: Arc<dyn TokenLedger>, config: &GateConfig) -> Self {
        Self {
            ledger,
            low_threshold: config.low_threshold,
        }
    }

    /// Read the ledger once and classify the result.
    ///
    /// Never returns an error: a transport failure or an unreadable
    /// balance both collapse to the denied decision.
    #[instrument(skip(self))]
    pub async fn check(&self) -> GateDecision {
        match self.ledger.balance().await {
            Ok(Some(balance)) => self.classify(balance),
            Ok(None) => {
                warn!("ledger returned no usable balance, refusing admission");
                GateDecision::denied()
            }
            Err(err) => {
                warn!(error = %err, "balance read failed, refusing admission");
                GateDecision::denied()
            }
        }
    }

    fn classify(&self, balance: f64) -> GateDecision {
        if !balance.is_finite() || balance <= 0.0 {
            return GateDecision {
                allowed: false,
                level: BalanceLevel::Empty,
                balance: Some(balance),
            };
        }
        let level = if balance < self.low_threshold {
            BalanceLevel::Low
        } else {
            BalanceLevel::Ok
        };
        GateDecision {
            allowed: true,
            level,
            balance: Some(balance),
        }
    }
}
