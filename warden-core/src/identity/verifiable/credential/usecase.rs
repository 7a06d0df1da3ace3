use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::Utc;
use rst_common::standard::serde_json::Value;
use rst_common::standard::uuid::Uuid;
use rst_common::with_logging::log::{debug, info};

use crate::agent::types::AgentBuilder;
use crate::identity::revocation::types::RevocationAPI;
use crate::identity::types::{IdentityError, Identifier};
use crate::identity::verifiable::proof::Signer;
use crate::identity::verifiable::vc::{bind_subject, VerifiableCredential, CONTEXT_STATUS_LIST_2021};
use crate::identity::wallet::types::{resolve_wallet, RepoBuilder as WalletRepoBuilder};
use crate::identity::wallet::{Wallet, WalletKind};

use super::types::{CredentialAPI, IssueParams, RepoBuilder};
use super::Credential;

pub struct Usecase<TRepo, TWalletRepo, TRevocation, TAgent>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    repo: Arc<TRepo>,
    wallets: Arc<TWalletRepo>,
    revocation: Arc<TRevocation>,
    signer: Signer<TAgent>,
}

impl<TRepo, TWalletRepo, TRevocation, TAgent> Clone
    for Usecase<TRepo, TWalletRepo, TRevocation, TAgent>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            wallets: self.wallets.clone(),
            revocation: self.revocation.clone(),
            signer: self.signer.clone(),
        }
    }
}

impl<TRepo, TWalletRepo, TRevocation, TAgent> Usecase<TRepo, TWalletRepo, TRevocation, TAgent>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    pub fn new(
        repo: Arc<TRepo>,
        wallets: Arc<TWalletRepo>,
        revocation: Arc<TRevocation>,
        agent: Arc<TAgent>,
    ) -> Self {
        Self {
            repo,
            wallets,
            revocation,
            signer: Signer::new(agent),
        }
    }

    async fn resolve_holder_did(&self, holder: Option<String>) -> Result<Option<String>, IdentityError> {
        let identifier = match holder {
            Some(val) => Identifier::parse(&val)?,
            None => return Ok(None),
        };

        match identifier {
            Identifier::Did(did) => Ok(Some(did)),
            Identifier::Bpn(bpn) => {
                let wallet = self
                    .wallets
                    .get_wallet_by_bpn(bpn.clone())
                    .await?
                    .ok_or(IdentityError::NotFound(format!("wallet {bpn}")))?;

                Ok(Some(wallet.did()))
            }
        }
    }

    /// `prepare_with` returns the unsigned document together with the issuer verification
    /// method, resolved before any status slot gets allocated
    async fn prepare_with(
        &self,
        issuer: &Wallet,
        params: IssueParams,
    ) -> Result<(VerifiableCredential, String), IdentityError> {
        if params.credential_type.trim().is_empty() {
            return Err(IdentityError::ValidationError(
                "credential_type was missing".to_string(),
            ));
        }

        let method = self.signer.verification_method(issuer).await?;

        let holder_did = self.resolve_holder_did(params.holder).await?;
        let subject = bind_subject(params.claims, holder_did)?;

        let mut credential = VerifiableCredential::new(
            format!("urn:uuid:{}", Uuid::new_v4()),
            issuer.did(),
            vec![params.credential_type],
            subject,
        );

        let issuance_date = params.issuance_date.unwrap_or_else(Utc::now);
        if let Some(expiration) = params.expiration_date {
            if expiration < issuance_date {
                return Err(IdentityError::ValidationError(
                    "expiration_date is before issuance_date".to_string(),
                ));
            }
        }

        credential.issuance_date = Some(issuance_date);
        credential.expiration_date = params.expiration_date;

        if params.revocable {
            let entry = self
                .revocation
                .add_status_entry(issuer.revocation_list_name())
                .await?;

            credential.add_context(CONTEXT_STATUS_LIST_2021);
            credential.credential_status = Some(entry.to_value()?);
        }

        Ok((credential, method))
    }
}

#[async_trait]
impl<TRepo, TWalletRepo, TRevocation, TAgent> CredentialAPI
    for Usecase<TRepo, TWalletRepo, TRevocation, TAgent>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    async fn prepare_credential(
        &self,
        params: IssueParams,
    ) -> Result<VerifiableCredential, IdentityError> {
        let issuer = resolve_wallet(self.wallets.as_ref(), &params.issuer).await?;
        let (credential, _) = self.prepare_with(&issuer, params).await?;
        Ok(credential)
    }

    async fn issue_credential(
        &self,
        params: IssueParams,
    ) -> Result<VerifiableCredential, IdentityError> {
        let issuer = resolve_wallet(self.wallets.as_ref(), &params.issuer).await?;
        let (unsigned, method) = self.prepare_with(&issuer, params).await?;

        let signed = self
            .signer
            .sign_with_method(&issuer, method, unsigned.to_value()?)
            .await?;
        let credential = VerifiableCredential::from_value(signed.clone())?;

        info!(
            "[credential:issue] issuer: {} | id: {:?} | types: {:?}",
            issuer.bpn(),
            credential.id,
            credential.types
        );

        let holder = match credential.subject_id() {
            Some(did) => self.wallets.get_wallet_by_did(did).await?,
            None => None,
        };

        match holder {
            Some(wallet) if wallet.kind() != WalletKind::SelfManaged => {
                let stored = Credential::from_payload(signed)?;
                self.repo.save_credential(&stored).await?;
                debug!(
                    "[credential:issue] stored into holder: {} | id: {}",
                    wallet.bpn(),
                    stored.id()
                );
            }
            _ => debug!("[credential:issue] holder not custodied, credential returned only"),
        }

        Ok(credential)
    }

    async fn store_credential(
        &self,
        holder_identifier: String,
        credential: Value,
    ) -> Result<Credential, IdentityError> {
        let wallet = resolve_wallet(self.wallets.as_ref(), &holder_identifier).await?;
        let stored = Credential::from_payload(credential)?;

        if stored.holder_did() != wallet.did() {
            return Err(IdentityError::ValidationError(format!(
                "credential subject {} is not the holder {}",
                stored.holder_did(),
                wallet.did()
            )));
        }

        self.repo.save_credential(&stored).await?;
        Ok(stored)
    }

    async fn list_credentials(
        &self,
        holder_identifier: String,
        type_filter: Option<String>,
    ) -> Result<Vec<Credential>, IdentityError> {
        let wallet = resolve_wallet(self.wallets.as_ref(), &holder_identifier).await?;
        let credentials = self
            .repo
            .list_credentials_by_holder(wallet.did())
            .await?
            .into_iter()
            .filter(|credential| match type_filter.as_ref() {
                Some(credential_type) => credential.has_type(credential_type),
                None => true,
            })
            .collect();

        Ok(credentials)
    }

    async fn revoke_credential(
        &self,
        issuer_identifier: String,
        credential_id: String,
    ) -> Result<(), IdentityError> {
        let issuer = resolve_wallet(self.wallets.as_ref(), &issuer_identifier).await?;
        let credential = self
            .repo
            .get_credential(credential_id.clone())
            .await?
            .ok_or(IdentityError::NotFound(format!("credential {credential_id}")))?;

        if credential.issuer_did() != issuer.did() {
            return Err(IdentityError::ValidationError(format!(
                "credential {credential_id} was not issued by {}",
                issuer.bpn()
            )));
        }

        let status = credential.status().ok_or(IdentityError::ValidationError(format!(
            "credential {credential_id} is not revocable"
        )))?;

        if status.list_name != issuer.revocation_list_name() {
            return Err(IdentityError::ValidationError(format!(
                "credential {credential_id} points to a foreign status list"
            )));
        }

        self.revocation.revoke(status.list_name, status.index).await
    }
}
