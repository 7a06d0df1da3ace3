use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;

use prople_warden_core::identity::revocation::types::RPCBuilder;
use prople_warden_core::identity::types::IdentityError;

use crate::rpc::shared::{call_limited, HttpClient};

/// largest status list credential accepted from a remote platform
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// `RpcClient` fetches status list credentials published by other platforms
#[derive(Clone)]
pub struct RpcClient {
    http: HttpClient,
    max_body_bytes: usize,
}

impl RpcClient {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

#[async_trait]
impl RPCBuilder for RpcClient {
    async fn fetch_status_list_credential(&self, url: String) -> Result<Value, IdentityError> {
        call_limited(self.http.get_absolute(&url), self.max_body_bytes)
            .await
            .map_err(IdentityError::from)
    }
}
