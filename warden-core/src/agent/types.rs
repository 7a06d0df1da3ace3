use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;
use rst_common::with_errors::thiserror::{self, Error};

use crate::identity::types::IdentityError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("request error: {0}")]
    RequestError(String),

    #[error("response error: status {status}: {message}")]
    ResponseError { status: u16, message: String },

    #[error("unserialize error: {0}")]
    UnserializeError(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

impl From<AgentError> for IdentityError {
    fn from(value: AgentError) -> Self {
        IdentityError::Upstream(value.to_string())
    }
}

/// `AgentAuth` selects the agent credentials used for a call
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAuth {
    /// the platform's own base wallet, authenticated with the admin key
    Base,

    /// a platform managed sub-wallet
    Tenant { wallet_id: String, token: String },
}

/// `SubIdentity` is the key triple the agent returns for a newly allocated sub-wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct SubIdentity {
    pub wallet_id: String,
    pub wallet_key: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct DidInfo {
    pub did: String,
    pub verkey: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,

    #[serde(rename = "type")]
    pub method_type: String,

    #[serde(default)]
    pub controller: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub id: String,

    #[serde(rename = "type")]
    pub service_type: String,

    pub service_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct DidDocument {
    pub id: String,

    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,

    #[serde(default)]
    pub service: Vec<ServiceEndpoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignRequest {
    pub document: Value,
    pub verification_method: String,
}

/// `SignResponse` mirrors the agent answer, a signed document or an error string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct SignResponse {
    #[serde(default)]
    pub signed_doc: Option<Value>,

    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ConnectionRecord {
    pub connection_id: String,
    pub rfc23_state: String,

    #[serde(default)]
    pub their_did: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ExchangeRecord {
    pub cred_ex_id: String,
    pub thread_id: String,
    pub state: String,
}

/// `AgentBuilder` is the capability set consumed from the external identity agent.
///
/// The agent owns every private key. This crate only orchestrates calls and interprets
/// their results.
#[async_trait]
pub trait AgentBuilder {
    async fn create_sub_identity(&self, label: String) -> Result<SubIdentity, AgentError>;

    async fn remove_sub_identity(
        &self,
        wallet_id: String,
        wallet_key: String,
    ) -> Result<(), AgentError>;

    async fn create_did(&self, auth: AgentAuth) -> Result<DidInfo, AgentError>;

    async fn resolve_did(&self, did: String) -> Result<DidDocument, AgentError>;

    /// `register_did_on_ledger` is always executed by the base wallet acting as endorser
    async fn register_did_on_ledger(
        &self,
        did: String,
        verkey: String,
        alias: String,
    ) -> Result<(), AgentError>;

    async fn sign_document(
        &self,
        auth: AgentAuth,
        request: SignRequest,
    ) -> Result<SignResponse, AgentError>;

    async fn verify_document(&self, document: Value) -> Result<bool, AgentError>;

    async fn update_service_endpoint(
        &self,
        auth: AgentAuth,
        did: String,
        endpoint: String,
    ) -> Result<(), AgentError>;

    async fn send_connection_request(
        &self,
        auth: AgentAuth,
        their_did: String,
        alias: Option<String>,
    ) -> Result<ConnectionRecord, AgentError>;

    async fn accept_connection_request(
        &self,
        auth: AgentAuth,
        connection_id: String,
    ) -> Result<ConnectionRecord, AgentError>;

    async fn send_credential_offer(
        &self,
        auth: AgentAuth,
        connection_id: String,
        credential: Value,
    ) -> Result<ExchangeRecord, AgentError>;

    async fn accept_credential_offer(
        &self,
        auth: AgentAuth,
        cred_ex_id: String,
    ) -> Result<ExchangeRecord, AgentError>;

    async fn accept_issued_credential(
        &self,
        auth: AgentAuth,
        cred_ex_id: String,
    ) -> Result<ExchangeRecord, AgentError>;

    async fn set_endorser_metadata(
        &self,
        auth: AgentAuth,
        connection_id: String,
    ) -> Result<(), AgentError>;
}
