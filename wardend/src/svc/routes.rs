use std::sync::Arc;

use rst_common::standard::serde_json::{json, Value};
use rst_common::with_http_tokio::axum::extract::{Path, State};
use rst_common::with_http_tokio::axum::http::HeaderMap;
use rst_common::with_http_tokio::axum::routing::{get, post};
use rst_common::with_http_tokio::axum::{Json, Router};
use rst_common::with_logging::log::{debug, info};

use prople_warden_core::identity::connection::types::{ConnectionAPI, ConnectionEvent};
use prople_warden_core::identity::exchange::types::{CredentialExchangeEvent, ExchangeAPI};
use prople_warden_core::identity::revocation::types::RevocationAPI;
use prople_warden_core::identity::verifiable::VerifiableCredential;

use crate::errors::WardenError;

pub const WALLET_HEADER: &str = "x-wallet-id";

/// `AppState` holds the services reachable from the http surface
#[derive(Clone)]
pub struct AppState {
    connections: Arc<dyn ConnectionAPI>,
    exchanges: Arc<dyn ExchangeAPI>,
    revocation: Arc<dyn RevocationAPI>,
}

impl AppState {
    pub fn new(
        connections: Arc<dyn ConnectionAPI>,
        exchanges: Arc<dyn ExchangeAPI>,
        revocation: Arc<dyn RevocationAPI>,
    ) -> Self {
        Self {
            connections,
            exchanges,
            revocation,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/topic/connections", post(connection_webhook))
        .route(
            "/webhooks/topic/issue_credential_v2_0",
            post(credential_webhook),
        )
        .route("/status/:list_name", get(status_list))
        .with_state(state)
}

/// a missing or blank header means the event belongs to the base wallet
fn agent_wallet_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(WALLET_HEADER)
        .and_then(|val| val.to_str().ok())
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

async fn connection_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<ConnectionEvent>,
) -> Result<Json<Value>, WardenError> {
    let wallet_id = agent_wallet_id(&headers);
    debug!(
        "[webhook:connections] connection_id: {} | state: {} | wallet: {:?}",
        event.connection_id, event.rfc23_state, wallet_id
    );

    let transition = state.connections.handle_event(wallet_id, event).await?;
    Ok(Json(json!({ "transition": format!("{:?}", transition) })))
}

async fn credential_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<CredentialExchangeEvent>,
) -> Result<Json<Value>, WardenError> {
    let wallet_id = agent_wallet_id(&headers);
    debug!(
        "[webhook:issue_credential_v2_0] thread_id: {} | state: {} | wallet: {:?}",
        event.thread_id, event.state, wallet_id
    );

    let transition = state.exchanges.handle_event(wallet_id, event).await?;
    Ok(Json(json!({ "transition": format!("{:?}", transition) })))
}

async fn status_list(
    State(state): State<AppState>,
    Path(list_name): Path<String>,
) -> Result<Json<VerifiableCredential>, WardenError> {
    info!("[status:get] list_name: {}", list_name);

    let credential = state
        .revocation
        .get_status_list_credential_of_managed_wallet(list_name)
        .await?;

    Ok(Json(credential))
}
