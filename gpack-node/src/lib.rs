//! gpack-node
//!
//! REST access to the chain for the Galactic Packs toolkit:
//! - fullnode client (ledger info, sequence numbers, gas estimation, BCS
//!   submission, settlement polling, view calls)
//! - indexer client for owned-token queries, with property bags resolved
//!   once at the ingestion boundary into tagged asset variants
//! - the [`ChainBackend`] seam the client finalizer submits through
//! - the network-backed transaction factory

pub mod assets;
pub mod backend;
pub mod client;
pub mod error;
pub mod factory;

pub use assets::{classify_properties, AssetKind, IndexerClient, OwnedAsset};
pub use backend::{ChainBackend, TxnResult};
pub use client::{LedgerInfo, NodeClient};
pub use error::NodeError;
pub use factory::{FactoryError, TransactionFactory, DEFAULT_MAX_GAS_AMOUNT, DEFAULT_TXN_EXPIRE_SECS};
