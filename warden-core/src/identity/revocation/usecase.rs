use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, info, warn};

use crate::agent::types::AgentBuilder;
use crate::identity::types::{Context, IdentityError};
use crate::identity::verifiable::proof::Signer;
use crate::identity::verifiable::vc::VerifiableCredential;
use crate::identity::wallet::types::RepoBuilder as WalletRepoBuilder;
use crate::locks::KeyedLock;

use super::types::{RPCBuilder, RepoBuilder, RevocationAPI, StatusEntry};
use super::{build_status_list_credential, RevocationList};

/// `Usecase` owns two lock sets. `bits` guards every read-modify-write of a list row, while
/// `issuing` keeps two reissues of the same profile from signing concurrently. A reissue
/// never holds `bits` across the agent call, so allocations and revocations keep flowing.
pub struct Usecase<TRepo, TWalletRepo, TAgent, TRPC>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TAgent: AgentBuilder + Send + Sync,
    TRPC: RPCBuilder + Send + Sync,
{
    repo: Arc<TRepo>,
    wallets: Arc<TWalletRepo>,
    rpc: Arc<TRPC>,
    signer: Signer<TAgent>,
    ctx: Context,
    bits: KeyedLock,
    issuing: KeyedLock,
}

impl<TRepo, TWalletRepo, TAgent, TRPC> Clone for Usecase<TRepo, TWalletRepo, TAgent, TRPC>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TAgent: AgentBuilder + Send + Sync,
    TRPC: RPCBuilder + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            wallets: self.wallets.clone(),
            rpc: self.rpc.clone(),
            signer: self.signer.clone(),
            ctx: self.ctx.clone(),
            bits: self.bits.clone(),
            issuing: self.issuing.clone(),
        }
    }
}

impl<TRepo, TWalletRepo, TAgent, TRPC> Usecase<TRepo, TWalletRepo, TAgent, TRPC>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TAgent: AgentBuilder + Send + Sync,
    TRPC: RPCBuilder + Send + Sync,
{
    pub fn new(
        repo: Arc<TRepo>,
        wallets: Arc<TWalletRepo>,
        agent: Arc<TAgent>,
        rpc: Arc<TRPC>,
        ctx: Context,
    ) -> Self {
        Self {
            repo,
            wallets,
            rpc,
            signer: Signer::new(agent),
            ctx,
            bits: KeyedLock::new(),
            issuing: KeyedLock::new(),
        }
    }

    async fn load(&self, profile: &str) -> Result<RevocationList, IdentityError> {
        self.repo
            .get_revocation_list(profile.to_string())
            .await?
            .ok_or(IdentityError::NotFound(format!("revocation list {profile}")))
    }

    /// `reissue` signs the list from a snapshot of its bits and returns whether a new
    /// credential was stored
    async fn reissue(&self, profile: &str, force: bool) -> Result<bool, IdentityError> {
        let _issuing = self.issuing.lock(profile).await;

        let snapshot = {
            let _guard = self.bits.lock(profile).await;
            let list = self.load(profile).await?;

            let needed =
                force || list.is_dirty() || list.last_issued_credential().is_none();
            if !needed {
                debug!("[revocation:reissue] profile: {profile} | clean, skipped");
                return Ok(false);
            }

            list.bitstring().clone()
        };

        let wallet = self
            .wallets
            .get_wallet_by_bpn(profile.to_string())
            .await?
            .ok_or(IdentityError::NotFound(format!("wallet {profile}")))?;

        let unsigned = build_status_list_credential(
            wallet.did(),
            self.ctx.status_list_url(profile),
            &snapshot,
        )?;

        let signed = self.signer.sign(&wallet, unsigned.to_value()?).await?;
        let credential = VerifiableCredential::from_value(signed)?;

        // bits may have moved while the agent was signing, set_issued keeps the list dirty then
        let _guard = self.bits.lock(profile).await;
        let mut list = self.load(profile).await?;
        list.set_issued(credential, &snapshot);
        self.repo.save_revocation_list(&list).await?;

        info!(
            "[revocation:reissue] profile: {profile} | revoked: {} | still dirty: {}",
            snapshot.set_indexes().len(),
            list.is_dirty()
        );

        Ok(true)
    }
}

#[async_trait]
impl<TRepo, TWalletRepo, TAgent, TRPC> RevocationAPI for Usecase<TRepo, TWalletRepo, TAgent, TRPC>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TAgent: AgentBuilder + Send + Sync,
    TRPC: RPCBuilder + Send + Sync,
{
    async fn register_list(&self, profile: String) -> Result<String, IdentityError> {
        if profile.trim().is_empty() {
            return Err(IdentityError::ValidationError(
                "profile name was missing".to_string(),
            ));
        }

        let _guard = self.bits.lock(&profile).await;
        if self.repo.get_revocation_list(profile.clone()).await?.is_some() {
            debug!("[revocation:register_list] profile: {profile} | already registered");
            return Ok(profile);
        }

        let list = RevocationList::new(profile.clone());
        self.repo.save_revocation_list(&list).await?;

        info!("[revocation:register_list] profile: {profile}");
        Ok(profile)
    }

    async fn add_status_entry(&self, profile: String) -> Result<StatusEntry, IdentityError> {
        let _guard = self.bits.lock(&profile).await;

        let mut list = self.load(&profile).await?;
        let index = list.allocate_index();
        self.repo.save_revocation_list(&list).await?;

        debug!("[revocation:add_status_entry] profile: {profile} | index: {index}");
        Ok(StatusEntry::new(self.ctx.status_list_url(&profile), index))
    }

    async fn revoke(&self, profile: String, index: usize) -> Result<(), IdentityError> {
        let _guard = self.bits.lock(&profile).await;

        let mut list = self.load(&profile).await?;
        list.revoke(index)?;
        self.repo.save_revocation_list(&list).await?;

        info!("[revocation:revoke] profile: {profile} | index: {index}");
        Ok(())
    }

    async fn issue_status_list_credentials(
        &self,
        profile: Option<String>,
        force: bool,
    ) -> Result<Vec<String>, IdentityError> {
        if let Some(name) = profile {
            let issued = self.reissue(&name, force).await?;
            return Ok(if issued { vec![name] } else { vec![] });
        }

        let mut reissued = Vec::new();
        for name in self.repo.list_revocation_list_names().await? {
            match self.reissue(&name, force).await {
                Ok(true) => reissued.push(name),
                Ok(false) => {}
                Err(err) => warn!("[revocation:issue_status_list_credentials] profile: {name} | failed: {err}"),
            }
        }

        Ok(reissued)
    }

    async fn get_status_list_credential_of_managed_wallet(
        &self,
        list_name: String,
    ) -> Result<VerifiableCredential, IdentityError> {
        let list = self.load(&list_name).await?;
        if let Some(credential) = list.last_issued_credential() {
            return Ok(credential);
        }

        let _ = self.reissue(&list_name, false).await?;
        self.load(&list_name)
            .await?
            .last_issued_credential()
            .ok_or(IdentityError::NotFound(format!(
                "status list credential {list_name}"
            )))
    }

    async fn get_status_list_credential_of_url(
        &self,
        url: String,
    ) -> Result<VerifiableCredential, IdentityError> {
        if let Some(list_name) = self.ctx.local_list_name(&url) {
            return self
                .get_status_list_credential_of_managed_wallet(list_name)
                .await;
        }

        debug!("[revocation:get_status_list_credential_of_url] remote: {url}");
        let value = self.rpc.fetch_status_list_credential(url).await?;
        VerifiableCredential::from_value(value)
    }
}
