use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Map, Value};

use crate::identity::types::IdentityError;

pub const CONTEXT_CREDENTIALS_V1: &str = "https://www.w3.org/2018/credentials/v1";
pub const CONTEXT_STATUS_LIST_2021: &str = "https://w3id.org/vc/status-list/2021/v1";
pub const TYPE_VERIFIABLE_CREDENTIAL: &str = "VerifiableCredential";

/// `VerifiableCredential` is the JSON-LD document model shared by issuance, storage and
/// verification.
///
/// `credential_status` stays a raw value, a malformed status block must still parse so the
/// verification engine can name the offending field. Members this model does not name
/// (`evidence`, `credentialSchema`, `termsOfUse`, ...) are kept in `extra`.
///
/// Serializing this model is not byte identical to the document it was parsed from, dates
/// are normalized. Signatures are always checked against the raw document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub types: Vec<String>,

    pub issuer: Issuer,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    pub credential_subject: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `Issuer` is either a plain did or an object carrying the did as `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde", untagged)]
pub enum Issuer {
    Id(String),
    Object(IssuerObject),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct IssuerObject {
    pub id: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Issuer {
    pub fn id(&self) -> &str {
        match self {
            Issuer::Id(id) => id,
            Issuer::Object(issuer) => &issuer.id,
        }
    }
}

impl From<String> for Issuer {
    fn from(value: String) -> Self {
        Issuer::Id(value)
    }
}

impl VerifiableCredential {
    pub fn new(id: String, issuer: String, types: Vec<String>, subject: Value) -> Self {
        let mut all_types = vec![TYPE_VERIFIABLE_CREDENTIAL.to_string()];
        for credential_type in types {
            if !all_types.contains(&credential_type) {
                all_types.push(credential_type);
            }
        }

        Self {
            context: vec![Value::String(CONTEXT_CREDENTIALS_V1.to_string())],
            id: Some(id),
            types: all_types,
            issuer: Issuer::from(issuer),
            issuance_date: None,
            expiration_date: None,
            credential_subject: subject,
            credential_status: None,
            proof: None,
            extra: Map::new(),
        }
    }

    /// `has_context` only matches url entries, inline context objects are skipped
    pub fn has_context(&self, context: &str) -> bool {
        self.context.iter().any(|ctx| ctx.as_str() == Some(context))
    }

    pub fn add_context(&mut self, context: &str) {
        if !self.has_context(context) {
            self.context.push(Value::String(context.to_string()));
        }
    }

    pub fn issuer_id(&self) -> &str {
        self.issuer.id()
    }

    /// `subject_id` returns the `credentialSubject.id`, `None` for an anonymous claim
    pub fn subject_id(&self) -> Option<String> {
        self.credential_subject
            .get("id")
            .and_then(|id| id.as_str())
            .map(|id| id.to_string())
    }

    pub fn has_type(&self, credential_type: &str) -> bool {
        self.types.iter().any(|val| val == credential_type)
    }

    pub fn to_value(&self) -> Result<Value, IdentityError> {
        serde_json::to_value(self).map_err(|err| IdentityError::JSONError(err.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, IdentityError> {
        serde_json::from_value(value).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

/// `bind_subject` applies the subject id precedence: an explicit holder did always
/// overrides an `id` already present in the claims
pub fn bind_subject(claims: Value, holder_did: Option<String>) -> Result<Value, IdentityError> {
    let mut subject: Map<String, Value> = match claims {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            return Err(IdentityError::ValidationError(
                "credential subject must be an object".to_string(),
            ))
        }
    };

    if let Some(did) = holder_did {
        subject.insert("id".to_string(), Value::String(did));
    }

    Ok(Value::Object(subject))
}

impl TryInto<Vec<u8>> for VerifiableCredential {
    type Error = IdentityError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for VerifiableCredential {
    type Error = IdentityError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}
