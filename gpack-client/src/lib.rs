//! gpack-client
//!
//! Client side of the Galactic Packs co-signing flow:
//! - [`CosignerApi`]: typed HTTP client for the co-signer service
//! - [`WalletSigner`]: the seam holding the user's signing capability
//! - [`Finalizer`]: drives a sealed envelope through user signature,
//!   submission and settlement

pub mod finalize;
pub mod service_api;
pub mod wallet;

pub use finalize::{Finalized, FinalizeError, Finalizer, FlowStage, DEFAULT_SETTLEMENT_TIMEOUT};
pub use service_api::{CosignerApi, ServiceError};
pub use wallet::{LocalWallet, WalletError, WalletSigner};
