use rst_common::standard::serde::{self, Deserialize, Serialize};

use prople_warden_core::agent::types::{DidDocument, DidInfo};

pub const WALLET_TYPE: &str = "askar";
pub const KEY_MANAGEMENT_MODE: &str = "managed";
pub const DID_METHOD: &str = "sov";
pub const KEY_TYPE: &str = "ed25519";
pub const PROOF_TYPE: &str = "Ed25519Signature2018";
pub const PROOF_PURPOSE: &str = "assertionMethod";
pub const ENDPOINT_TYPE: &str = "Endpoint";
pub const ENDORSER_JOB: &str = "TRANSACTION_AUTHOR";

#[derive(Debug, Serialize)]
#[serde(crate = "self::serde")]
pub struct CreateWalletRequest {
    pub label: String,
    pub wallet_name: String,
    pub wallet_key: String,
    pub wallet_type: String,
    pub key_management_mode: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
pub struct CreateWalletResponse {
    pub wallet_id: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
pub struct CreateDidResponse {
    pub result: DidInfo,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ResolveDidResponse {
    pub did_document: DidDocument,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
pub struct VerifyResponse {
    #[serde(default)]
    pub valid: bool,

    #[serde(default)]
    pub error: Option<String>,
}

/// `qualify_did` prefixes a bare ledger nym with its method
pub fn qualify_did(did: &str) -> String {
    if did.starts_with("did:") {
        return did.to_string();
    }

    format!("did:{}:{}", DID_METHOD, did)
}

/// `unqualify_did` strips the method prefix, the ledger endpoints only accept bare nyms
pub fn unqualify_did(did: &str) -> String {
    did.strip_prefix(&format!("did:{}:", DID_METHOD))
        .unwrap_or(did)
        .to_string()
}
