//! Network-backed transaction factory.
//!
//! Wraps the pure builder in `gpack-core` with the one network round-trip a
//! valid transaction needs: the sender's sequence number, the current gas
//! estimate and the chain id. If that round-trip fails, the build fails with
//! no partial transaction.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::debug;

use gpack_core::{
    build_multi_agent, AccountAddress, BuildError, BuildParams, ChainId, ContractConfig,
    PackOperation, UnsignedMultiAgentTransaction,
};

use crate::client::NodeClient;
use crate::error::NodeError;

/// Gas ceiling used when the caller does not override it.
pub const DEFAULT_MAX_GAS_AMOUNT: u64 = 200_000;
/// Transaction expiration window from build time.
pub const DEFAULT_TXN_EXPIRE_SECS: u64 = 20;

/// Errors raised while building a transaction against the live chain.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The sequencing/gas metadata round-trip failed. Transient; the caller
    /// may retry the whole flow.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
}

impl From<NodeError> for FactoryError {
    fn from(err: NodeError) -> Self {
        FactoryError::NetworkUnavailable(err.to_string())
    }
}

/// Builds unsigned multi-agent transactions against a fullnode.
pub struct TransactionFactory {
    node: Arc<NodeClient>,
    config: ContractConfig,
    creator: AccountAddress,
    max_gas_amount: u64,
    expire_after_secs: u64,
}

impl TransactionFactory {
    pub fn new(node: Arc<NodeClient>, config: ContractConfig, creator: AccountAddress) -> Self {
        TransactionFactory {
            node,
            config,
            creator,
            max_gas_amount: DEFAULT_MAX_GAS_AMOUNT,
            expire_after_secs: DEFAULT_TXN_EXPIRE_SECS,
        }
    }

    pub fn with_max_gas_amount(mut self, max_gas_amount: u64) -> Self {
        self.max_gas_amount = max_gas_amount;
        self
    }

    pub fn with_expire_after_secs(mut self, secs: u64) -> Self {
        self.expire_after_secs = secs;
        self
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn creator(&self) -> AccountAddress {
        self.creator
    }

    /// Build the unsigned transaction for `operation` with `sender` as the
    /// primary signer and the creator as the single secondary signer.
    pub async fn build(
        &self,
        sender: AccountAddress,
        operation: &PackOperation,
    ) -> Result<UnsignedMultiAgentTransaction, FactoryError> {
        let (ledger, sequence_number, gas_unit_price) = tokio::try_join!(
            self.node.ledger_info(),
            self.node.account_sequence_number(sender),
            self.node.estimate_gas_unit_price(),
        )?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        debug!(
            %sender,
            operation = operation.function_name(),
            sequence_number,
            gas_unit_price,
            chain_id = ledger.chain_id,
            "building multi-agent transaction"
        );

        Ok(build_multi_agent(
            sender,
            self.creator,
            operation,
            &self.config,
            BuildParams {
                sequence_number,
                max_gas_amount: self.max_gas_amount,
                gas_unit_price,
                expiration_timestamp_secs: now + self.expire_after_secs,
                chain_id: ChainId(ledger.chain_id),
            },
        ))
    }
}
