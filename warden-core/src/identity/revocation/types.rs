use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use crate::identity::types::{IdentityError, VerificationFailure};
use crate::identity::verifiable::vc::VerifiableCredential;

use super::RevocationList;

pub const STATUS_ENTRY_TYPE: &str = "StatusList2021Entry";
pub const STATUS_PURPOSE_REVOCATION: &str = "revocation";
pub const STATUS_LIST_CREDENTIAL_TYPE: &str = "StatusList2021Credential";
pub const STATUS_LIST_SUBJECT_TYPE: &str = "StatusList2021";

/// `StatusEntry` is the `credentialStatus` block attached to a revocable credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct StatusEntry {
    pub id: String,

    #[serde(rename = "type")]
    pub entry_type: String,

    pub status_purpose: String,
    pub status_list_index: String,
    pub status_list_credential: String,
}

fn invalid_field(field: &str, reason: &str) -> IdentityError {
    IdentityError::Verification(VerificationFailure::InvalidStatusField {
        field: field.to_string(),
        reason: reason.to_string(),
    })
}

impl StatusEntry {
    pub fn new(list_url: String, index: usize) -> Self {
        Self {
            id: format!("{}#{}", list_url, index),
            entry_type: STATUS_ENTRY_TYPE.to_string(),
            status_purpose: STATUS_PURPOSE_REVOCATION.to_string(),
            status_list_index: index.to_string(),
            status_list_credential: list_url,
        }
    }

    /// `from_value` validates the structure of a raw status block, every violation names
    /// the offending field
    pub fn from_value(value: &Value) -> Result<Self, IdentityError> {
        let status = value
            .as_object()
            .ok_or(invalid_field("credentialStatus", "must be an object"))?;

        let entry_type = status
            .get("type")
            .and_then(|val| val.as_str())
            .unwrap_or_default();

        if entry_type != STATUS_ENTRY_TYPE {
            return Err(invalid_field(
                "type",
                &format!("expected {STATUS_ENTRY_TYPE}, got '{entry_type}'"),
            ));
        }

        let purpose = status
            .get("statusPurpose")
            .and_then(|val| val.as_str())
            .unwrap_or_default();

        if purpose != STATUS_PURPOSE_REVOCATION {
            return Err(invalid_field(
                "statusPurpose",
                &format!("expected {STATUS_PURPOSE_REVOCATION}, got '{purpose}'"),
            ));
        }

        let index = match status.get("statusListIndex") {
            Some(Value::String(val)) => val.trim().parse::<u64>().ok(),
            Some(Value::Number(val)) => val.as_u64(),
            _ => None,
        }
        .ok_or(invalid_field(
            "statusListIndex",
            "must be a non-negative integer",
        ))?;

        let list_url = status
            .get("statusListCredential")
            .and_then(|val| val.as_str())
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .ok_or(invalid_field("statusListCredential", "must not be blank"))?;

        let id = status
            .get("id")
            .and_then(|val| val.as_str())
            .map(|val| val.to_string())
            .unwrap_or_else(|| format!("{}#{}", list_url, index));

        Ok(Self {
            id,
            entry_type: entry_type.to_string(),
            status_purpose: purpose.to_string(),
            status_list_index: index.to_string(),
            status_list_credential: list_url,
        })
    }

    pub fn to_value(&self) -> Result<Value, IdentityError> {
        serde_json::to_value(self).map_err(|err| IdentityError::JSONError(err.to_string()))
    }

    pub fn index(&self) -> Result<usize, IdentityError> {
        self.status_list_index
            .parse::<usize>()
            .map_err(|_| invalid_field("statusListIndex", "must be a non-negative integer"))
    }

    pub fn list_url(&self) -> String {
        self.status_list_credential.to_owned()
    }

    /// last path segment of the list url, the list name for lists served by this platform
    pub fn list_name(&self) -> String {
        self.status_list_credential
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
pub trait RepoBuilder {
    async fn save_revocation_list(&self, list: &RevocationList) -> Result<(), IdentityError>;

    async fn get_revocation_list(
        &self,
        name: String,
    ) -> Result<Option<RevocationList>, IdentityError>;

    async fn list_revocation_list_names(&self) -> Result<Vec<String>, IdentityError>;
}

/// `RPCBuilder` fetches status list credentials published by other platforms
#[async_trait]
pub trait RPCBuilder {
    async fn fetch_status_list_credential(&self, url: String) -> Result<Value, IdentityError>;
}

#[async_trait]
pub trait RevocationAPI: Send + Sync {
    /// allocate the status list of a profile, registering twice keeps the first list
    async fn register_list(&self, profile: String) -> Result<String, IdentityError>;

    async fn add_status_entry(&self, profile: String) -> Result<StatusEntry, IdentityError>;

    async fn revoke(&self, profile: String, index: usize) -> Result<(), IdentityError>;

    /// re-sign the status list credential of one profile, or all profiles, returning the
    /// names of the lists that were reissued
    async fn issue_status_list_credentials(
        &self,
        profile: Option<String>,
        force: bool,
    ) -> Result<Vec<String>, IdentityError>;

    async fn get_status_list_credential_of_managed_wallet(
        &self,
        list_name: String,
    ) -> Result<VerifiableCredential, IdentityError>;

    async fn get_status_list_credential_of_url(
        &self,
        url: String,
    ) -> Result<VerifiableCredential, IdentityError>;
}
