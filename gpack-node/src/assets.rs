//! Owned-asset queries and property-bag ingestion.
//!
//! Indexer rows carry an arbitrary token-property bag. The bag is resolved
//! exactly once, here at the ingestion boundary, into a tagged variant; the
//! rest of the system never re-inspects raw properties.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use url::Url;

use gpack_core::AccountAddress;

use crate::error::NodeError;

/// Property keys written by the pack contract.
const PROP_PACK_NUMBER: &str = "Pack Number";
const PROP_OPENED: &str = "Opened";
const PROP_SERIAL_NUMBER: &str = "Serial Number";
const PROP_RARITY: &str = "Rarity";

/// Indexer page size; matches the upstream query limit.
const PAGE_SIZE: usize = 100;

/// What a token's property bag says it is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetKind {
    /// An unopened or opened pack.
    Pack {
        pack_number: Option<String>,
        opened: bool,
    },
    /// A collectible card from an opened pack.
    Collectible {
        serial_number: Option<String>,
        rarity: String,
    },
    /// Properties that match neither known shape; raw bag preserved.
    Unknown(BTreeMap<String, String>),
}

/// One token owned by a user, with its properties already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedAsset {
    pub token_id: String,
    pub name: String,
    pub uri: Option<String>,
    pub kind: AssetKind,
    /// Set when this row's detail data was missing or unreadable; the row
    /// degrades instead of failing the whole listing.
    pub detail_error: Option<String>,
}

/// Resolve a raw token-property bag into its tagged variant.
///
/// A bag carrying `Pack Number` or `Opened` is a pack; `Serial Number` or
/// `Rarity` marks a collectible; anything else is `Unknown`.
pub fn classify_properties(properties: &serde_json::Map<String, Value>) -> AssetKind {
    let text = |key: &str| -> Option<String> {
        properties.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };

    if properties.contains_key(PROP_PACK_NUMBER) || properties.contains_key(PROP_OPENED) {
        let opened = match properties.get(PROP_OPENED) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true" || s == "1",
            _ => false,
        };
        return AssetKind::Pack {
            pack_number: text(PROP_PACK_NUMBER),
            opened,
        };
    }

    if properties.contains_key(PROP_SERIAL_NUMBER) || properties.contains_key(PROP_RARITY) {
        return AssetKind::Collectible {
            serial_number: text(PROP_SERIAL_NUMBER),
            rarity: text(PROP_RARITY).unwrap_or_else(|| "Unknown".to_string()),
        };
    }

    AssetKind::Unknown(
        properties
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect(),
    )
}

const OWNED_TOKENS_QUERY: &str = r#"
query OwnedTokens($owner: String!, $collection: String!, $limit: Int!, $offset: Int!) {
  current_token_ownerships_v2(
    where: {
      owner_address: { _eq: $owner }
      current_token_data: { collection_id: { _eq: $collection } }
      amount: { _gt: "0" }
    }
    limit: $limit
    offset: $offset
  ) {
    token_data_id
    current_token_data {
      token_name
      token_uri
      token_properties
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<OwnershipsData>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct OwnershipsData {
    current_token_ownerships_v2: Vec<OwnershipRow>,
}

#[derive(Debug, Deserialize)]
struct OwnershipRow {
    token_data_id: String,
    #[serde(default)]
    current_token_data: Option<TokenData>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    #[serde(default)]
    token_name: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    token_properties: Option<Value>,
}

/// Indexer GraphQL client for ownership queries.
#[derive(Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl IndexerClient {
    /// Create a client for an indexer GraphQL endpoint, e.g.
    /// `https://api.testnet.aptoslabs.com/v1/graphql`.
    pub fn new(endpoint: &str) -> Result<Self, NodeError> {
        let endpoint: Url = endpoint.parse().map_err(|e: url::ParseError| {
            NodeError::Unavailable(format!("invalid indexer URL: {e}"))
        })?;
        Ok(IndexerClient {
            http: reqwest::Client::new(),
            endpoint,
        })
    }

    /// All tokens `owner` holds from one collection, paged through the
    /// indexer [`PAGE_SIZE`] rows at a time.
    pub async fn owned_tokens(
        &self,
        owner: AccountAddress,
        collection_id: &str,
    ) -> Result<Vec<OwnedAsset>, NodeError> {
        let mut assets = Vec::new();
        let mut offset = 0usize;
        loop {
            let rows = self.fetch_page(owner, collection_id, offset).await?;
            let page_len = rows.len();
            assets.extend(rows.into_iter().map(ingest_row));
            if page_len < PAGE_SIZE {
                break;
            }
            offset += page_len;
        }
        Ok(assets)
    }

    async fn fetch_page(
        &self,
        owner: AccountAddress,
        collection_id: &str,
        offset: usize,
    ) -> Result<Vec<OwnershipRow>, NodeError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&serde_json::json!({
                "query": OWNED_TOKENS_QUERY,
                "variables": {
                    "owner": owner.to_hex_literal(),
                    "collection": collection_id,
                    "limit": PAGE_SIZE,
                    "offset": offset,
                },
            }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NodeError::Rejected(format!("indexer {status}: {body}")));
        }
        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| NodeError::UnexpectedResponse(e.to_string()))?;
        if let Some(errors) = body.errors {
            return Err(NodeError::Rejected(format!(
                "indexer errors: {}",
                serde_json::Value::Array(errors)
            )));
        }
        Ok(body
            .data
            .map(|d| d.current_token_ownerships_v2)
            .unwrap_or_default())
    }
}

fn ingest_row(row: OwnershipRow) -> OwnedAsset {
    let Some(data) = row.current_token_data else {
        warn!(token = %row.token_data_id, "indexer row missing token data");
        return OwnedAsset {
            token_id: row.token_data_id,
            name: "Unknown".to_string(),
            uri: None,
            kind: AssetKind::Unknown(BTreeMap::new()),
            detail_error: Some("token data missing from indexer row".to_string()),
        };
    };

    let kind = match &data.token_properties {
        Some(Value::Object(map)) => classify_properties(map),
        Some(other) => {
            warn!(token = %row.token_data_id, "token properties are not an object");
            let mut bag = BTreeMap::new();
            bag.insert("raw".to_string(), other.to_string());
            AssetKind::Unknown(bag)
        }
        None => AssetKind::Unknown(BTreeMap::new()),
    };

    OwnedAsset {
        token_id: row.token_data_id,
        name: data.token_name.unwrap_or_else(|| "Unknown".to_string()),
        uri: data.token_uri,
        kind,
        detail_error: None,
    }
}
