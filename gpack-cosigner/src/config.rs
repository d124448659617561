//! Service configuration.

use anyhow::{Context, Result};
use std::env;

use gpack_core::{AccountAddress, ContractConfig};

/// Default contract deployment (testnet).
pub const DEFAULT_MODULE_ADDRESS: &str =
    "0x553faabe7ca12e3664f05c9a3d2f378e5779bc5b45ea90b05804a655e64b282a";
pub const DEFAULT_MODULE_NAME: &str = "galactic_packs";
pub const DEFAULT_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com";
pub const DEFAULT_INDEXER_URL: &str = "https://api.testnet.aptoslabs.com/v1/graphql";

/// Co-signer service configuration.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Fullnode base URL.
    pub node_url: String,
    /// Indexer GraphQL endpoint.
    pub indexer_url: String,
    /// Contract location.
    pub contract: ContractConfig,
    /// Creator private key, hex. Absence leaves co-signing permanently
    /// unavailable for this process.
    pub creator_private_key: Option<String>,
    /// Pack collection id for holdings queries.
    pub packs_collection: Option<String>,
    /// Gallery collection ids.
    pub aliens_collection: Option<String>,
    pub predators_collection: Option<String>,
    pub yodas_collection: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let node_url =
            env::var("GPACK_NODE_URL").unwrap_or_else(|_| DEFAULT_NODE_URL.to_string());
        let indexer_url =
            env::var("GPACK_INDEXER_URL").unwrap_or_else(|_| DEFAULT_INDEXER_URL.to_string());

        let module_address: AccountAddress = env::var("GPACK_MODULE_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_MODULE_ADDRESS.to_string())
            .parse()
            .context("GPACK_MODULE_ADDRESS is not a valid address")?;
        let module_name =
            env::var("GPACK_MODULE_NAME").unwrap_or_else(|_| DEFAULT_MODULE_NAME.to_string());

        Ok(ServiceConfig {
            node_url,
            indexer_url,
            contract: ContractConfig::new(module_address, module_name),
            creator_private_key: env::var("CREATOR_PRIVATE_KEY").ok(),
            packs_collection: env::var("GPACK_PACKS_COLLECTION").ok(),
            aliens_collection: env::var("GPACK_ALIENS_COLLECTION").ok(),
            predators_collection: env::var("GPACK_PREDATORS_COLLECTION").ok(),
            yodas_collection: env::var("GPACK_YODAS_COLLECTION").ok(),
        })
    }

    /// A configuration with defaults and no key, for tests.
    pub fn for_tests() -> Self {
        ServiceConfig {
            node_url: DEFAULT_NODE_URL.to_string(),
            indexer_url: DEFAULT_INDEXER_URL.to_string(),
            contract: ContractConfig::new(
                DEFAULT_MODULE_ADDRESS.parse().unwrap(),
                DEFAULT_MODULE_NAME,
            ),
            creator_private_key: None,
            packs_collection: None,
            aliens_collection: None,
            predators_collection: None,
            yodas_collection: None,
        }
    }
}
