//! Contract operations and the pure transaction builder.
//!
//! The contract surface is a fixed, known set of entry points. Operation
//! names resolve against that set and nothing else; anything unrecognized is
//! an [`BuildError::UnknownOperation`].

use serde::{Deserialize, Serialize};

use crate::address::AccountAddress;
use crate::error::BuildError;
use crate::txn::{
    ChainId, EntryFunction, Identifier, ModuleId, RawTransaction, TransactionPayload,
    UnsignedMultiAgentTransaction,
};

/// Entry-point and view-function names of the `galactic_packs` module.
pub const FN_BUY_PACK: &str = "buy_pack";
pub const FN_OPEN_PACK: &str = "open_pack";
pub const FN_GET_TOTAL_SOLD: &str = "get_total_sold";

/// Price of one pack, in octas.
pub const PACK_PRICE_OCTAS: u64 = 10_000_000;
/// Maximum number of packs the contract sells.
pub const MAX_PACKS: u64 = 100;
/// Cards minted per opened pack.
pub const PACK_SIZE: u64 = 3;

/// Where the contract lives: publishing address plus module name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    pub module_address: AccountAddress,
    pub module_name: String,
}

impl ContractConfig {
    pub fn new(module_address: AccountAddress, module_name: impl Into<String>) -> Self {
        ContractConfig {
            module_address,
            module_name: module_name.into(),
        }
    }

    pub fn module_id(&self) -> ModuleId {
        ModuleId {
            address: self.module_address,
            name: Identifier::new(self.module_name.clone()),
        }
    }

    /// Fully-qualified function identifier, e.g. `0x553f::galactic_packs::buy_pack`.
    pub fn qualified(&self, function: &str) -> String {
        format!(
            "{}::{}::{}",
            self.module_address, self.module_name, function
        )
    }
}

/// A co-signed contract operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackOperation {
    /// Buy one unopened pack (`buy_pack`, no arguments).
    Purchase,
    /// Open a previously bought pack (`open_pack(pack_token)`).
    Redeem { pack_token: AccountAddress },
}

impl PackOperation {
    /// Resolve an operation by its public name. `purchase` takes no
    /// arguments; `redeem` takes the pack token address.
    pub fn resolve(name: &str, args: &[&str]) -> Result<Self, BuildError> {
        match name {
            "purchase" => {
                if !args.is_empty() {
                    return Err(BuildError::UnknownOperation(format!(
                        "purchase takes no arguments, got {}",
                        args.len()
                    )));
                }
                Ok(PackOperation::Purchase)
            }
            "redeem" => match args {
                [token] => Ok(PackOperation::Redeem {
                    pack_token: token.parse()?,
                }),
                _ => Err(BuildError::UnknownOperation(format!(
                    "redeem takes exactly one argument (pack token), got {}",
                    args.len()
                ))),
            },
            other => Err(BuildError::UnknownOperation(other.to_string())),
        }
    }

    /// The contract entry-point name this operation targets.
    pub fn function_name(&self) -> &'static str {
        match self {
            PackOperation::Purchase => FN_BUY_PACK,
            PackOperation::Redeem { .. } => FN_OPEN_PACK,
        }
    }

    /// Encode the entry-function call. Arguments are BCS-encoded positionally
    /// in the target function's declared parameter order.
    pub fn entry_function(&self, config: &ContractConfig) -> EntryFunction {
        let args = match self {
            PackOperation::Purchase => vec![],
            // open_pack(pack_token: address)
            PackOperation::Redeem { pack_token } => vec![bcs::to_bytes(pack_token).unwrap()],
        };
        EntryFunction {
            module: config.module_id(),
            function: Identifier::new(self.function_name()),
            ty_args: vec![],
            args,
        }
    }
}

/// Chain-sequencing metadata a transaction needs before it is valid. Fetched
/// from the node by callers that have one; supplied directly in tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildParams {
    pub sequence_number: u64,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub chain_id: ChainId,
}

/// Construct the unsigned multi-agent transaction for an operation: the user
/// is the primary signer, the creator the single secondary signer, and the
/// fee-payer slot stays empty (the user's account funds the transaction).
/// Pure construction; no side effects.
pub fn build_multi_agent(
    sender: AccountAddress,
    creator: AccountAddress,
    operation: &PackOperation,
    config: &ContractConfig,
    params: BuildParams,
) -> UnsignedMultiAgentTransaction {
    UnsignedMultiAgentTransaction {
        raw_txn: RawTransaction {
            sender,
            sequence_number: params.sequence_number,
            payload: TransactionPayload::EntryFunction(operation.entry_function(config)),
            max_gas_amount: params.max_gas_amount,
            gas_unit_price: params.gas_unit_price,
            expiration_timestamp_secs: params.expiration_timestamp_secs,
            chain_id: params.chain_id,
        },
        secondary_signer_addresses: vec![creator],
        fee_payer_address: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ContractConfig {
        ContractConfig::new(
            AccountAddress::from_hex(
                "0x553faabe7ca12e3664f05c9a3d2f378e5779bc5b45ea90b05804a655e64b282a",
            )
            .unwrap(),
            "galactic_packs",
        )
    }

    #[test]
    fn resolves_known_operations() {
        assert_eq!(
            PackOperation::resolve("purchase", &[]).unwrap(),
            PackOperation::Purchase
        );
        let redeem = PackOperation::resolve("redeem", &["0xfeed"]).unwrap();
        assert_eq!(
            redeem,
            PackOperation::Redeem {
                pack_token: AccountAddress::from_hex("0xfeed").unwrap()
            }
        );
    }

    #[test]
    fn rejects_unknown_operations_and_bad_arity() {
        assert!(matches!(
            PackOperation::resolve("battle", &[]),
            Err(BuildError::UnknownOperation(_))
        ));
        assert!(matches!(
            PackOperation::resolve("purchase", &["0x1"]),
            Err(BuildError::UnknownOperation(_))
        ));
        assert!(matches!(
            PackOperation::resolve("redeem", &[]),
            Err(BuildError::UnknownOperation(_))
        ));
        // a bad pack token surfaces as an address error, not an arity error
        assert!(matches!(
            PackOperation::resolve("redeem", &["zz"]),
            Err(BuildError::InvalidAddress(_))
        ));
    }

    #[test]
    fn builder_shapes_the_transaction() {
        let sender = AccountAddress::from_hex("0xa11ce").unwrap();
        let creator = AccountAddress::from_hex("0xc0de").unwrap();
        let txn = build_multi_agent(
            sender,
            creator,
            &PackOperation::Purchase,
            &config(),
            BuildParams {
                sequence_number: 11,
                max_gas_amount: 200_000,
                gas_unit_price: 100,
                expiration_timestamp_secs: 1_700_000_020,
                chain_id: ChainId(2),
            },
        );

        assert_eq!(txn.raw_txn.sender, sender);
        assert_eq!(txn.secondary_signer_addresses, vec![creator]);
        assert_eq!(txn.fee_payer_address, None);
        let entry = txn.entry_function().unwrap();
        assert_eq!(entry.function.as_str(), FN_BUY_PACK);
        assert_eq!(entry.module.name.as_str(), "galactic_packs");
        assert!(entry.ty_args.is_empty());
        assert!(entry.args.is_empty());
    }

    #[test]
    fn redeem_encodes_the_pack_token_positionally() {
        let pack = AccountAddress::from_hex("0xfeed").unwrap();
        let entry = PackOperation::Redeem { pack_token: pack }.entry_function(&config());
        assert_eq!(entry.args, vec![bcs::to_bytes(&pack).unwrap()]);
    }

    #[test]
    fn qualified_names() {
        assert_eq!(
            config().qualified(FN_GET_TOTAL_SOLD),
            "0x553faabe7ca12e3664f05c9a3d2f378e5779bc5b45ea90b05804a655e64b282a::galactic_packs::get_total_sold"
        );
    }
}
