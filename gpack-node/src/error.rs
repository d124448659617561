//! Error types for chain access.

use thiserror::Error;

/// Aggregated error type for fullnode and indexer access.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Transport-level failure: the node could not be reached. Transient;
    /// the caller may retry the whole flow.
    #[error("network unavailable: {0}")]
    Unavailable(String),

    /// The node answered with a non-success status.
    #[error("node rejected request: {0}")]
    Rejected(String),

    /// The node answered but the body did not have the expected shape.
    #[error("unexpected node response: {0}")]
    UnexpectedResponse(String),

    /// The settlement wait ran out of time. Ambiguous outcome: the
    /// transaction may still confirm later. Re-query by hash; never resubmit.
    #[error("settlement timed out for transaction {hash} after {waited_secs}s")]
    SettlementTimeout { hash: String, waited_secs: u64 },
}

impl From<reqwest::Error> for NodeError {
    fn from(err: reqwest::Error) -> Self {
        NodeError::Unavailable(err.to_string())
    }
}
