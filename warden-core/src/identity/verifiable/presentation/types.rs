use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;

use crate::identity::types::{IdentityError, VerificationFailure};
use crate::identity::verifiable::VerifiablePresentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct VerifyOptions {
    pub with_date_validation: bool,
    pub with_revocation_validation: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            with_date_validation: true,
            with_revocation_validation: true,
        }
    }
}

/// `VerificationResult` echoes the verified document, `failure` names the first rejection
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub valid: bool,
    pub failure: Option<VerificationFailure>,
    pub document: Value,
}

impl VerificationResult {
    pub fn accepted(document: Value) -> Self {
        Self {
            valid: true,
            failure: None,
            document,
        }
    }

    pub fn rejected(document: Value, failure: VerificationFailure) -> Self {
        Self {
            valid: false,
            failure: Some(failure),
            document,
        }
    }
}

#[async_trait]
pub trait PresentationAPI: Send + Sync {
    /// `issue_presentation` wraps credentials owned by the holder into a signed presentation.
    /// When `verify` is given every credential must pass verification first
    async fn issue_presentation(
        &self,
        holder_identifier: String,
        credentials: Vec<Value>,
        verify: Option<VerifyOptions>,
    ) -> Result<VerifiablePresentation, IdentityError>;

    async fn verify_presentation(
        &self,
        presentation: Value,
        with_date_validation: bool,
        with_revocation_validation: bool,
    ) -> Result<VerificationResult, IdentityError>;

    async fn verify_credential(
        &self,
        credential: Value,
        with_date_validation: bool,
        with_revocation_validation: bool,
    ) -> Result<VerificationResult, IdentityError>;
}
