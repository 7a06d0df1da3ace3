use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::json;
use rst_common::with_logging::log::info;

use prople_warden_core::bpdm::BpdmBuilder;
use prople_warden_core::identity::types::IdentityError;

use crate::rpc::shared::{call_empty, HttpClient};

/// `RpcClient` triggers the business partner data pipeline, the pipeline itself owns
/// the partner credentials logic
#[derive(Clone)]
pub struct RpcClient {
    http: HttpClient,
}

impl RpcClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl BpdmBuilder for RpcClient {
    async fn pull_and_update_credentials(&self, bpn: Option<String>) -> Result<(), IdentityError> {
        info!(
            "[bpdm:pull_and_update_credentials] bpn: {}",
            bpn.as_deref().unwrap_or("all")
        );

        call_empty(self.http.post("/credentials/pull").json(&json!({ "bpn": bpn })))
            .await
            .map_err(IdentityError::from)
    }

    async fn issue_and_send_credentials(
        &self,
        wallet_did: String,
        connection_id: String,
    ) -> Result<(), IdentityError> {
        info!(
            "[bpdm:issue_and_send_credentials] did: {} | connection: {}",
            wallet_did, connection_id
        );

        call_empty(self.http.post("/credentials/issue").json(&json!({
            "walletDid": wallet_did,
            "connectionId": connection_id,
        })))
        .await
        .map_err(IdentityError::from)
    }
}
