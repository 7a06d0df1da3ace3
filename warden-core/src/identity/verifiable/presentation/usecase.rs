use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::standard::uuid::Uuid;
use rst_common::with_logging::log::{debug, info};

use crate::agent::types::AgentBuilder;
use crate::identity::revocation::types::RevocationAPI;
use crate::identity::types::{IdentityError, VerificationFailure};
use crate::identity::verifiable::proof::Signer;
use crate::identity::verifiable::{VerifiableCredential, VerifiablePresentation};
use crate::identity::wallet::types::{resolve_wallet, RepoBuilder as WalletRepoBuilder};

use super::types::{PresentationAPI, VerificationResult, VerifyOptions};
use super::Verifier;

pub struct Usecase<TWalletRepo, TRevocation, TAgent>
where
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    wallets: Arc<TWalletRepo>,
    signer: Signer<TAgent>,
    verifier: Verifier<TRevocation, TAgent>,
}

impl<TWalletRepo, TRevocation, TAgent> Clone for Usecase<TWalletRepo, TRevocation, TAgent>
where
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            wallets: self.wallets.clone(),
            signer: self.signer.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

impl<TWalletRepo, TRevocation, TAgent> Usecase<TWalletRepo, TRevocation, TAgent>
where
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    pub fn new(wallets: Arc<TWalletRepo>, revocation: Arc<TRevocation>, agent: Arc<TAgent>) -> Self {
        Self {
            wallets,
            signer: Signer::new(agent.clone()),
            verifier: Verifier::new(revocation, agent),
        }
    }

    /// local checks of every credential first, signatures last so a rejected document
    /// never costs an agent round trip. Embedded credentials are signature checked on
    /// their raw values
    async fn check_presentation(
        &self,
        presentation: &VerifiablePresentation,
        credentials: &[VerifiableCredential],
        document: Value,
        opts: VerifyOptions,
    ) -> Result<(), IdentityError> {
        if presentation.proof.is_none() {
            return Err(VerificationFailure::MissingProof.into());
        }

        for credential in credentials.iter() {
            self.verifier.check_credential(credential, opts).await?;
        }

        let label = presentation.id.clone().unwrap_or("presentation".to_string());
        self.verifier.check_signature(document, &label).await?;

        for (credential, raw) in credentials
            .iter()
            .zip(presentation.verifiable_credential.iter())
        {
            let label = credential.id.clone().unwrap_or("credential".to_string());
            self.verifier
                .check_signature(raw.to_owned(), &label)
                .await?;
        }

        Ok(())
    }
}

/// `into_result` turns a rejection into an invalid result, operational failures stay errors
fn into_result(document: Value, checked: Result<(), IdentityError>) -> Result<VerificationResult, IdentityError> {
    match checked {
        Ok(_) => Ok(VerificationResult::accepted(document)),
        Err(IdentityError::Verification(failure)) => {
            debug!("[presentation:verify] rejected: {failure}");
            Ok(VerificationResult::rejected(document, failure))
        }
        Err(err) => Err(err),
    }
}

fn malformed(err: IdentityError) -> IdentityError {
    match err {
        IdentityError::JSONError(msg) => {
            IdentityError::ValidationError(format!("malformed document: {msg}"))
        }
        other => other,
    }
}

#[async_trait]
impl<TWalletRepo, TRevocation, TAgent> PresentationAPI for Usecase<TWalletRepo, TRevocation, TAgent>
where
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    async fn issue_presentation(
        &self,
        holder_identifier: String,
        credentials: Vec<Value>,
        verify: Option<VerifyOptions>,
    ) -> Result<VerifiablePresentation, IdentityError> {
        let holder = resolve_wallet(self.wallets.as_ref(), &holder_identifier).await?;

        for raw in credentials.iter() {
            let credential = VerifiableCredential::from_value(raw.to_owned()).map_err(malformed)?;

            if credential.subject_id() != Some(holder.did()) {
                return Err(IdentityError::ValidationError(format!(
                    "credential {} does not belong to {}",
                    credential.id.clone().unwrap_or_default(),
                    holder.did()
                )));
            }

            if let Some(opts) = verify {
                self.verifier.check_credential(&credential, opts).await?;
                let label = credential.id.clone().unwrap_or("credential".to_string());
                self.verifier
                    .check_signature(raw.to_owned(), &label)
                    .await?;
            }
        }

        let unsigned = VerifiablePresentation::new(
            format!("urn:uuid:{}", Uuid::new_v4()),
            holder.did(),
            credentials,
        );

        let signed = self.signer.sign(&holder, unsigned.to_value()?).await?;
        let presentation = VerifiablePresentation::from_value(signed)?;

        info!(
            "[presentation:issue] holder: {} | credentials: {}",
            holder.bpn(),
            presentation.verifiable_credential.len()
        );

        Ok(presentation)
    }

    async fn verify_presentation(
        &self,
        presentation: Value,
        with_date_validation: bool,
        with_revocation_validation: bool,
    ) -> Result<VerificationResult, IdentityError> {
        let parsed = VerifiablePresentation::from_value(presentation.clone()).map_err(malformed)?;
        let credentials = parsed.credentials().map_err(malformed)?;
        let opts = VerifyOptions {
            with_date_validation,
            with_revocation_validation,
        };

        let checked = self
            .check_presentation(&parsed, &credentials, presentation.clone(), opts)
            .await;
        into_result(presentation, checked)
    }

    async fn verify_credential(
        &self,
        credential: Value,
        with_date_validation: bool,
        with_revocation_validation: bool,
    ) -> Result<VerificationResult, IdentityError> {
        let parsed = VerifiableCredential::from_value(credential.clone()).map_err(malformed)?;
        let opts = VerifyOptions {
            with_date_validation,
            with_revocation_validation,
        };

        let checked = match self.verifier.check_credential(&parsed, opts).await {
            Ok(_) => {
                let label = parsed.id.clone().unwrap_or("credential".to_string());
                self.verifier
                    .check_signature(credential.clone(), &label)
                    .await
            }
            Err(err) => Err(err),
        };

        into_result(credential, checked)
    }
}
