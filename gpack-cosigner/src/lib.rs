//! gpack-cosigner library
//!
//! Axum-based HTTP service that prepares and co-signs multi-agent pack
//! transactions.
//!
//! # Features
//! - Envelope-producing endpoints for the `purchase` and `redeem` operations
//! - Creator key held in memory for the process lifetime, loaded at start
//! - Read-only views: total packs sold, categorized holdings
//!
//! The co-signing endpoints check key availability before anything else, so a
//! process started without key material answers deterministically and without
//! network access.

pub mod config;

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use gpack_core::{
    AccountAddress, BuildError, CoSignError, CoSigner, CreatorKey, EnvelopeError, PackOperation,
    TransactionEnvelope,
};
use gpack_node::{
    AssetKind, FactoryError, IndexerClient, NodeClient, NodeError, OwnedAsset, TransactionFactory,
};

pub use config::ServiceConfig;

// Stable machine-readable error codes, preserved alongside the human message.
const CODE_INVALID_ADDRESS: &str = "INVALID_ADDRESS";
const CODE_UNKNOWN_OPERATION: &str = "UNKNOWN_OPERATION";
const CODE_NETWORK_UNAVAILABLE: &str = "NETWORK_UNAVAILABLE";
const CODE_COSIGNER_UNAVAILABLE: &str = "COSIGNER_UNAVAILABLE";
const CODE_SIGNER_MISMATCH: &str = "SIGNER_MISMATCH";
const CODE_MALFORMED_ENVELOPE: &str = "MALFORMED_ENVELOPE";
const CODE_INTERNAL: &str = "INTERNAL_SERVER_ERROR";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServiceConfig>,
    co_signer: Arc<CoSigner>,
    node: Arc<NodeClient>,
    indexer: Arc<IndexerClient>,
    /// Present only when the creator key loaded.
    factory: Option<Arc<TransactionFactory>>,
}

impl AppState {
    /// Build state from configuration. A missing or malformed creator key
    /// degrades co-signing to permanently unavailable rather than failing
    /// startup; the read-only surface stays up either way.
    pub fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        let co_signer = match config.creator_private_key.as_deref() {
            Some(hex_key) => match CreatorKey::from_hex(hex_key) {
                Ok(key) => {
                    info!(creator = %key.address(), "creator key loaded");
                    CoSigner::new(key)
                }
                Err(err) => {
                    warn!("creator key malformed, co-signing unavailable: {err}");
                    CoSigner::unavailable()
                }
            },
            None => {
                warn!("CREATOR_PRIVATE_KEY not set, co-signing unavailable");
                CoSigner::unavailable()
            }
        };

        let node = Arc::new(NodeClient::new(&config.node_url)?);
        let indexer = Arc::new(IndexerClient::new(&config.indexer_url)?);

        let factory = co_signer.address().map(|creator| {
            Arc::new(TransactionFactory::new(
                node.clone(),
                config.contract.clone(),
                creator,
            ))
        });

        Ok(AppState {
            config: Arc::new(config),
            co_signer: Arc::new(co_signer),
            node,
            indexer,
            factory,
        })
    }
}

/// Build the router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/info", get(info_endpoint))
        .route("/txn/purchase", post(prepare_purchase))
        .route("/txn/redeem", post(prepare_redeem))
        .route("/view/total-sold", get(total_sold))
        .route("/assets/:address", get(assets))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Service info endpoint.
async fn info_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "module_address": state.config.contract.module_address.to_hex_literal(),
        "module_name": state.config.contract.module_name,
        "creator_address": state.co_signer.address().map(|a| a.to_hex_literal()),
        "cosigner_available": state.co_signer.is_available(),
        "version": env!("CARGO_PKG_VERSION"),
        "operations": ["purchase", "redeem"],
    }))
}

/// Purchase request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub user_address: String,
}

/// Redeem request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub user_address: String,
    pub pack_token_id: String,
}

/// Prepare and co-sign a `buy_pack` transaction.
async fn prepare_purchase(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<TransactionEnvelope>, ApiError> {
    let operation = PackOperation::resolve("purchase", &[])?;
    prepare(&state, &req.user_address, operation).await
}

/// Prepare and co-sign an `open_pack` transaction.
async fn prepare_redeem(
    State(state): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<TransactionEnvelope>, ApiError> {
    let operation = PackOperation::resolve("redeem", &[req.pack_token_id.as_str()])?;
    prepare(&state, &req.user_address, operation).await
}

/// Shared preparation flow: availability check, address validation, build,
/// co-sign, seal. Key availability is checked first so a keyless process
/// fails fast without touching the network.
async fn prepare(
    state: &AppState,
    user_address: &str,
    operation: PackOperation,
) -> Result<Json<TransactionEnvelope>, ApiError> {
    let factory = state
        .factory
        .as_ref()
        .ok_or_else(|| ApiError::from(CoSignError::Unavailable))?;

    let sender: AccountAddress = user_address
        .parse()
        .map_err(|e: gpack_core::AddressError| ApiError::bad_request(CODE_INVALID_ADDRESS, e.0))?;

    let txn = factory.build(sender, &operation).await?;
    let creator_auth = state.co_signer.co_sign(&txn)?;

    info!(
        %sender,
        operation = operation.function_name(),
        "prepared co-signed transaction"
    );
    Ok(Json(TransactionEnvelope::seal(&txn, &creator_auth)))
}

/// Total sold response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSoldResponse {
    pub total_sold: u64,
}

/// Total packs sold, via the contract view function.
async fn total_sold(State(state): State<AppState>) -> Result<Json<TotalSoldResponse>, ApiError> {
    let total_sold = state.node.total_sold(&state.config.contract).await?;
    Ok(Json(TotalSoldResponse { total_sold }))
}

/// One asset in a holdings response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    pub token_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<std::collections::BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<OwnedAsset> for AssetView {
    fn from(asset: OwnedAsset) -> Self {
        let mut view = AssetView {
            token_id: asset.token_id,
            name: asset.name,
            uri: asset.uri,
            kind: "unknown",
            pack_number: None,
            opened: None,
            serial_number: None,
            rarity: None,
            properties: None,
            error: asset.detail_error,
        };
        match asset.kind {
            AssetKind::Pack {
                pack_number,
                opened,
            } => {
                view.kind = "pack";
                view.pack_number = pack_number;
                view.opened = Some(opened);
            }
            AssetKind::Collectible {
                serial_number,
                rarity,
            } => {
                view.kind = "collectible";
                view.serial_number = serial_number;
                view.rarity = Some(rarity);
            }
            AssetKind::Unknown(bag) => {
                view.properties = Some(bag);
            }
        }
        view
    }
}

/// Holdings response: packs plus the gallery collections.
#[derive(Debug, Serialize)]
pub struct AssetsResponse {
    pub packs: Vec<AssetView>,
    pub gallery: GalleryView,
}

#[derive(Debug, Serialize)]
pub struct GalleryView {
    pub aliens: Vec<AssetView>,
    pub predators: Vec<AssetView>,
    pub yodas: Vec<AssetView>,
}

/// Categorized holdings for one account. Collections without a configured id
/// come back empty rather than failing the whole listing.
async fn assets(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<AssetsResponse>, ApiError> {
    let owner: AccountAddress = address
        .parse()
        .map_err(|e: gpack_core::AddressError| ApiError::bad_request(CODE_INVALID_ADDRESS, e.0))?;

    let fetch = |collection: Option<String>| {
        let indexer = state.indexer.clone();
        async move {
            match collection {
                Some(id) => indexer.owned_tokens(owner, &id).await,
                None => Ok(vec![]),
            }
        }
    };

    let (packs, aliens, predators, yodas) = tokio::try_join!(
        fetch(state.config.packs_collection.clone()),
        fetch(state.config.aliens_collection.clone()),
        fetch(state.config.predators_collection.clone()),
        fetch(state.config.yodas_collection.clone()),
    )?;

    let views = |assets: Vec<OwnedAsset>| assets.into_iter().map(AssetView::from).collect();
    Ok(Json(AssetsResponse {
        packs: views(packs),
        gallery: GalleryView {
            aliens: views(aliens),
            predators: views(predators),
            yodas: views(yodas),
        },
    }))
}

/// API error type: HTTP status, stable error code, human message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "error": self.message,
            "error_code": self.code,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<CoSignError> for ApiError {
    fn from(err: CoSignError) -> Self {
        let (status, code) = match &err {
            CoSignError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, CODE_COSIGNER_UNAVAILABLE),
            CoSignError::SignerMismatch(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, CODE_SIGNER_MISMATCH)
            }
        };
        ApiError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl From<BuildError> for ApiError {
    fn from(err: BuildError) -> Self {
        let code = match &err {
            BuildError::InvalidAddress(_) => CODE_INVALID_ADDRESS,
            BuildError::UnknownOperation(_) => CODE_UNKNOWN_OPERATION,
        };
        ApiError::bad_request(code, err.to_string())
    }
}

impl From<FactoryError> for ApiError {
    fn from(err: FactoryError) -> Self {
        let (status, code) = match &err {
            FactoryError::Build(BuildError::InvalidAddress(_)) => {
                (StatusCode::BAD_REQUEST, CODE_INVALID_ADDRESS)
            }
            FactoryError::Build(BuildError::UnknownOperation(_)) => {
                (StatusCode::BAD_REQUEST, CODE_UNKNOWN_OPERATION)
            }
            FactoryError::NetworkUnavailable(_) => {
                (StatusCode::BAD_GATEWAY, CODE_NETWORK_UNAVAILABLE)
            }
        };
        ApiError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl From<NodeError> for ApiError {
    fn from(err: NodeError) -> Self {
        let status = match &err {
            NodeError::SettlementTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        };
        ApiError {
            status,
            code: CODE_NETWORK_UNAVAILABLE,
            message: err.to_string(),
        }
    }
}

impl From<EnvelopeError> for ApiError {
    fn from(err: EnvelopeError) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            code: CODE_MALFORMED_ENVELOPE,
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: CODE_INTERNAL,
            message: err.to_string(),
        }
    }
}
