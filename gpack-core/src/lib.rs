//! gpack-core
//!
//! Protocol core for the Galactic Packs multi-agent co-signing flow.
//!
//! # Features
//! - Canonical BCS transaction types matching the Aptos wire format
//! - Multi-agent signing messages and Ed25519 account authenticators
//! - Server-side creator co-signer with fail-fast key handling
//! - Byte-exact transport envelope shared between server and client
//!
//! This crate is pure: no network access and no ambient global state. The
//! creator key is an owned resource created once at process start and shared
//! behind a read-only handle.

pub mod address;
pub mod auth;
pub mod cosign;
pub mod envelope;
pub mod error;
pub mod operation;
pub mod txn;

pub use address::AccountAddress;
pub use auth::{
    AccountAuthenticator, Ed25519PublicKey, Ed25519Signature, SignedTransaction,
    TransactionAuthenticator,
};
pub use cosign::{CoSigner, CreatorKey};
pub use envelope::TransactionEnvelope;
pub use error::{AddressError, BuildError, CoSignError, EnvelopeError, KeyError};
pub use operation::{build_multi_agent, BuildParams, ContractConfig, PackOperation};
pub use txn::{
    ChainId, EntryFunction, Identifier, ModuleId, RawTransaction, StructTag, TransactionPayload,
    TypeTag, UnsignedMultiAgentTransaction,
};
