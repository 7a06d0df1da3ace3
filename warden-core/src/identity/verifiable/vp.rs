use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Map, Value};

use crate::identity::types::IdentityError;

use super::vc::{VerifiableCredential, CONTEXT_CREDENTIALS_V1};

pub const TYPE_VERIFIABLE_PRESENTATION: &str = "VerifiablePresentation";

/// `VerifiablePresentation` keeps its embedded credentials as received, each one is
/// verified against its own signed bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde", rename_all = "camelCase")]
pub struct VerifiablePresentation {
    #[serde(rename = "@context")]
    pub context: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub types: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,

    #[serde(default)]
    pub verifiable_credential: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiablePresentation {
    pub fn new(id: String, holder: String, credentials: Vec<Value>) -> Self {
        Self {
            context: vec![Value::String(CONTEXT_CREDENTIALS_V1.to_string())],
            id: Some(id),
            types: vec![TYPE_VERIFIABLE_PRESENTATION.to_string()],
            holder: Some(holder),
            verifiable_credential: credentials,
            proof: None,
            extra: Map::new(),
        }
    }

    /// `credentials` parses the embedded credentials, in document order
    pub fn credentials(&self) -> Result<Vec<VerifiableCredential>, IdentityError> {
        self.verifiable_credential
            .iter()
            .map(|raw| VerifiableCredential::from_value(raw.to_owned()))
            .collect()
    }

    pub fn to_value(&self) -> Result<Value, IdentityError> {
        serde_json::to_value(self).map_err(|err| IdentityError::JSONError(err.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, IdentityError> {
        serde_json::from_value(value).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json::json;

    #[test]
    fn test_embedded_credentials_stay_raw() {
        let credential = json!({
            "@context": [CONTEXT_CREDENTIALS_V1],
            "id": "urn:uuid:cred",
            "type": ["VerifiableCredential"],
            "issuer": "did:web:issuer",
            "issuanceDate": "2024-01-01T00:00:00.000Z",
            "credentialSubject": {"id": "did:web:holder"},
            "evidence": [{"type": "DocumentVerification"}]
        });

        let doc = json!({
            "@context": [CONTEXT_CREDENTIALS_V1],
            "type": ["VerifiablePresentation"],
            "holder": "did:web:holder",
            "verifiableCredential": [credential.clone()],
            "proof": {"type": "Ed25519Signature2018"}
        });

        let presentation = VerifiablePresentation::from_value(doc.clone()).unwrap();
        assert_eq!(presentation.verifiable_credential[0], credential);
        assert_eq!(presentation.to_value().unwrap(), doc);

        let parsed = presentation.credentials().unwrap();
        assert_eq!(parsed[0].subject_id(), Some("did:web:holder".to_string()));
    }

    #[test]
    fn test_malformed_embedded_credential() {
        let presentation = VerifiablePresentation::new(
            "urn:uuid:vp".to_string(),
            "did:web:holder".to_string(),
            vec![json!({"id": "urn:uuid:broken"})],
        );

        assert!(presentation.credentials().is_err());
    }
}
