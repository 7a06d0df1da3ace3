use std::sync::Arc;

use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::debug;

use crate::agent::types::AgentBuilder;
use crate::identity::revocation::decode_status_list_credential;
use crate::identity::revocation::types::{RevocationAPI, StatusEntry};
use crate::identity::types::{IdentityError, VerificationFailure};
use crate::identity::verifiable::VerifiableCredential;

use super::types::VerifyOptions;

/// `Verifier` runs the per document checks. Every rejection is an
/// [`IdentityError::Verification`], anything else is an operational failure
pub struct Verifier<TRevocation, TAgent>
where
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    revocation: Arc<TRevocation>,
    agent: Arc<TAgent>,
}

impl<TRevocation, TAgent> Clone for Verifier<TRevocation, TAgent>
where
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            revocation: self.revocation.clone(),
            agent: self.agent.clone(),
        }
    }
}

impl<TRevocation, TAgent> Verifier<TRevocation, TAgent>
where
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    pub fn new(revocation: Arc<TRevocation>, agent: Arc<TAgent>) -> Self {
        Self { revocation, agent }
    }

    /// `check_credential` applies the proof, date, status and revocation checks in that order.
    /// The signature is checked separately through [`Verifier::check_signature`]
    pub async fn check_credential(
        &self,
        credential: &VerifiableCredential,
        opts: VerifyOptions,
    ) -> Result<(), IdentityError> {
        if credential.proof.is_none() {
            return Err(VerificationFailure::MissingProof.into());
        }

        if opts.with_date_validation {
            check_dates(credential, Utc::now())?;
        }

        // structural validation of a present status block never depends on the flags
        let status = match credential.credential_status.as_ref() {
            Some(value) => Some(StatusEntry::from_value(value)?),
            None => None,
        };

        if let (true, Some(entry)) = (opts.with_revocation_validation, status) {
            self.check_revocation(credential, &entry).await?;
        }

        Ok(())
    }

    async fn check_revocation(
        &self,
        credential: &VerifiableCredential,
        entry: &StatusEntry,
    ) -> Result<(), IdentityError> {
        let index = entry.index()?;
        let list = self
            .revocation
            .get_status_list_credential_of_url(entry.list_url())
            .await?;

        if list.issuer_id() != credential.issuer_id() {
            return Err(VerificationFailure::IssuerMismatch(format!(
                "status list issued by {}, credential issued by {}",
                list.issuer_id(),
                credential.issuer_id()
            ))
            .into());
        }

        let bits = decode_status_list_credential(&list)?;
        if bits.get(index) {
            return Err(VerificationFailure::Revoked(format!(
                "{} at index {index}",
                credential.id.clone().unwrap_or_default()
            ))
            .into());
        }

        debug!(
            "[verifier:check_revocation] list: {} | index: {index} | active",
            entry.list_url()
        );
        Ok(())
    }

    /// `check_signature` delegates the cryptographic check to the agent
    pub async fn check_signature(&self, document: Value, label: &str) -> Result<(), IdentityError> {
        let verified = self.agent.verify_document(document).await?;
        if !verified {
            return Err(VerificationFailure::InvalidSignature(label.to_string()).into());
        }

        Ok(())
    }
}

pub(crate) fn check_dates(
    credential: &VerifiableCredential,
    now: DateTime<Utc>,
) -> Result<(), IdentityError> {
    let issuance = credential
        .issuance_date
        .ok_or(VerificationFailure::InvalidDate(
            "issuanceDate was missing".to_string(),
        ))?;

    if now < issuance {
        return Err(VerificationFailure::InvalidDate(format!(
            "not valid before {}",
            issuance.to_rfc3339()
        ))
        .into());
    }

    if let Some(expiration) = credential.expiration_date {
        if now > expiration {
            return Err(VerificationFailure::InvalidDate(format!(
                "expired at {}",
                expiration.to_rfc3339()
            ))
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::chrono::Duration;
    use rst_common::standard::serde_json::json;
    use rst_common::with_tokio::tokio;

    use crate::identity::revocation::bitstring::Bitstring;
    use crate::identity::revocation::build_status_list_credential;
    use crate::testing::{MockFakeAgent, MockFakeRevocation};

    const LIST_URL: &str = "https://warden.example/status/BPNL000000000000";

    fn generate_credential(status_index: Option<usize>) -> VerifiableCredential {
        let mut credential = VerifiableCredential::new(
            "urn:uuid:cred-1".to_string(),
            "did:sov:base".to_string(),
            vec!["BpnCredential".to_string()],
            json!({"id": "did:sov:tenant", "bpn": "BPNL000000000001"}),
        );
        credential.issuance_date = Some(Utc::now() - Duration::days(1));
        credential.proof = Some(json!({"type": "Ed25519Signature2018"}));
        credential.credential_status = status_index
            .map(|index| StatusEntry::new(LIST_URL.to_string(), index).to_value().unwrap());
        credential
    }

    fn status_list(issuer: &str, revoked: &[usize]) -> VerifiableCredential {
        let mut bits = Bitstring::new();
        for index in revoked {
            bits.set(*index);
        }

        build_status_list_credential(issuer.to_string(), LIST_URL.to_string(), &bits).unwrap()
    }

    fn verifier(revocation: MockFakeRevocation) -> Verifier<MockFakeRevocation, MockFakeAgent> {
        Verifier::new(Arc::new(revocation), Arc::new(MockFakeAgent::new()))
    }

    #[test]
    fn test_check_dates() {
        let now = Utc::now();
        let mut credential = generate_credential(None);
        assert!(check_dates(&credential, now).is_ok());

        credential.issuance_date = Some(now + Duration::days(1));
        let early = check_dates(&credential, now);
        assert!(matches!(
            early,
            Err(IdentityError::Verification(VerificationFailure::InvalidDate(_)))
        ));

        credential.issuance_date = Some(now - Duration::days(10));
        credential.expiration_date = Some(now - Duration::days(1));
        let expired = check_dates(&credential, now);
        assert!(matches!(
            expired,
            Err(IdentityError::Verification(VerificationFailure::InvalidDate(_)))
        ));

        credential.issuance_date = None;
        credential.expiration_date = None;
        assert!(check_dates(&credential, now).is_err());
    }

    #[tokio::test]
    async fn test_missing_proof() {
        let mut revocation = MockFakeRevocation::new();
        revocation.expect_get_status_list_credential_of_url().times(0);

        let mut credential = generate_credential(Some(0));
        credential.proof = None;

        let result = verifier(revocation)
            .check_credential(&credential, VerifyOptions::default())
            .await;
        assert_eq!(
            result.unwrap_err().verification_failure(),
            Some(VerificationFailure::MissingProof)
        );
    }

    #[tokio::test]
    async fn test_revoked_only_with_flag() {
        let mut revocation = MockFakeRevocation::new();
        revocation
            .expect_get_status_list_credential_of_url()
            .times(1)
            .returning(|_| Ok(status_list("did:sov:base", &[2])));

        let checker = verifier(revocation);
        let credential = generate_credential(Some(2));

        let revoked = checker
            .check_credential(&credential, VerifyOptions::default())
            .await;
        assert!(matches!(
            revoked,
            Err(IdentityError::Verification(VerificationFailure::Revoked(_)))
        ));

        let skipped = checker
            .check_credential(
                &credential,
                VerifyOptions {
                    with_date_validation: true,
                    with_revocation_validation: false,
                },
            )
            .await;
        assert!(skipped.is_ok());
    }

    #[tokio::test]
    async fn test_active_index() {
        let mut revocation = MockFakeRevocation::new();
        revocation
            .expect_get_status_list_credential_of_url()
            .returning(|_| Ok(status_list("did:sov:base", &[2])));

        let result = verifier(revocation)
            .check_credential(&generate_credential(Some(3)), VerifyOptions::default())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_issuer_mismatch() {
        let mut revocation = MockFakeRevocation::new();
        revocation
            .expect_get_status_list_credential_of_url()
            .returning(|_| Ok(status_list("did:web:somebody-else", &[])));

        let result = verifier(revocation)
            .check_credential(&generate_credential(Some(0)), VerifyOptions::default())
            .await;
        assert!(matches!(
            result,
            Err(IdentityError::Verification(VerificationFailure::IssuerMismatch(_)))
        ));
    }

    #[tokio::test]
    async fn test_status_structure_checked_without_revocation_flag() {
        let mut revocation = MockFakeRevocation::new();
        revocation.expect_get_status_list_credential_of_url().times(0);

        let mut credential = generate_credential(Some(0));
        if let Some(status) = credential.credential_status.as_mut() {
            status["statusPurpose"] = json!("suspension");
        }

        let result = verifier(revocation)
            .check_credential(
                &credential,
                VerifyOptions {
                    with_date_validation: false,
                    with_revocation_validation: false,
                },
            )
            .await;

        match result {
            Err(IdentityError::Verification(VerificationFailure::InvalidStatusField {
                field,
                ..
            })) => assert_eq!(field, "statusPurpose".to_string()),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_signature() {
        let mut agent = MockFakeAgent::new();
        agent.expect_verify_document().returning(|_| Ok(false));

        let checker = Verifier::new(Arc::new(MockFakeRevocation::new()), Arc::new(agent));
        let result = checker.check_signature(json!({}), "urn:uuid:cred-1").await;
        assert!(matches!(
            result,
            Err(IdentityError::Verification(VerificationFailure::InvalidSignature(_)))
        ));
    }
}
