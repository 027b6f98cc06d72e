use async_trait::async_trait;

use crate::domain::errors::TransportError;

/// Port onto the external billing ledger.
///
/// One balance read per call, no retry policy beyond the transport default.
/// The gate, not the ledger, decides what a given balance means.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Read the current wallet balance.
    ///
    /// Returns `None` when the ledger responded but the balance field was
    /// missing or non-numeric; those cases are classified the same as an
    /// empty wallet by the gate.
    async fn balance(&self) -> Result<Option<f64>, TransportError>;
}
