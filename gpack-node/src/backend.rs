//! Submission seam between the finalizer and the chain.

use std::time::Duration;

use async_trait::async_trait;

use gpack_core::SignedTransaction;

use crate::client::NodeClient;
use crate::error::NodeError;

/// Execution result of a settled transaction. An on-chain abort still
/// settles; `success` reports what the VM did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxnResult {
    pub success: bool,
    pub vm_status: String,
}

/// Chain backend the client finalizer submits through. Implemented by
/// [`NodeClient`] for real networks and by in-memory fakes in tests.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Submit a fully-authenticated transaction; returns its hash.
    async fn submit(&self, txn: &SignedTransaction) -> Result<String, NodeError>;

    /// Await the execution result, bounded by `timeout`.
    async fn wait_for_settlement(
        &self,
        hash: &str,
        timeout: Duration,
    ) -> Result<TxnResult, NodeError>;
}

#[async_trait]
impl ChainBackend for NodeClient {
    async fn submit(&self, txn: &SignedTransaction) -> Result<String, NodeError> {
        self.submit_signed(txn).await
    }

    async fn wait_for_settlement(
        &self,
        hash: &str,
        timeout: Duration,
    ) -> Result<TxnResult, NodeError> {
        NodeClient::wait_for_settlement(self, hash, timeout).await
    }
}
