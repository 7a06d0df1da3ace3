use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use crate::identity::revocation::types::StatusEntry;
use crate::identity::types::IdentityError;
use crate::identity::verifiable::vc::VerifiableCredential;

/// `StatusRef` points at the status list slot of a revocable credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct StatusRef {
    pub list_name: String,
    pub list_url: String,
    pub index: usize,
}

/// `Credential` is a signed credential stored in its holder's wallet, immutable once saved.
/// `payload` is the signed document exactly as received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Credential {
    id: String,
    issuer_did: String,
    holder_did: String,
    types: Vec<String>,
    payload: Value,
    status: Option<StatusRef>,
    issued_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn from_payload(payload: Value) -> Result<Self, IdentityError> {
        let document = VerifiableCredential::from_value(payload.clone())?;
        let id = document
            .id
            .to_owned()
            .filter(|id| !id.is_empty())
            .ok_or(IdentityError::ValidationError(
                "credential id was missing".to_string(),
            ))?;

        let holder_did = document.subject_id().ok_or(IdentityError::ValidationError(
            "credential subject id was missing".to_string(),
        ))?;

        let status = match document.credential_status.as_ref() {
            Some(value) => {
                let entry = StatusEntry::from_value(value)?;
                Some(StatusRef {
                    list_name: entry.list_name(),
                    list_url: entry.list_url(),
                    index: entry.index()?,
                })
            }
            None => None,
        };

        Ok(Self {
            id,
            issuer_did: document.issuer_id().to_string(),
            holder_did,
            types: document.types,
            issued_at: document.issuance_date.unwrap_or_else(Utc::now),
            expires_at: document.expiration_date,
            status,
            payload,
        })
    }

    pub fn id(&self) -> String {
        self.id.to_owned()
    }

    pub fn issuer_did(&self) -> String {
        self.issuer_did.to_owned()
    }

    pub fn holder_did(&self) -> String {
        self.holder_did.to_owned()
    }

    pub fn types(&self) -> Vec<String> {
        self.types.to_owned()
    }

    pub fn has_type(&self, credential_type: &str) -> bool {
        self.types.iter().any(|val| val == credential_type)
    }

    pub fn payload(&self) -> Value {
        self.payload.to_owned()
    }

    pub fn document(&self) -> Result<VerifiableCredential, IdentityError> {
        VerifiableCredential::from_value(self.payload.to_owned())
    }

    pub fn status(&self) -> Option<StatusRef> {
        self.status.to_owned()
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl TryInto<Vec<u8>> for Credential {
    type Error = IdentityError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for Credential {
    type Error = IdentityError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}
