use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, error, info, warn};

use crate::agent::types::{AgentAuth, AgentBuilder};
use crate::identity::connection::types::{ConnectionAPI, RepoBuilder as ConnectionRepoBuilder};
use crate::identity::revocation::types::RevocationAPI;
use crate::identity::types::{validate_did, Context, IdentityError, Identifier};
use crate::identity::verifiable::credential::types::RepoBuilder as CredentialRepoBuilder;
use crate::tasks::TaskPool;

use super::types::{resolve_wallet, BootstrapAPI, RepoBuilder, WalletAPI};
use super::{AgentKeys, Wallet, WalletKind};

/// `Usecase` is the provisioning orchestrator. Every step that allocates something at the
/// agent is compensated when a later step of the same call fails
pub struct Usecase<TRepo, TCredentialRepo, TConnectionRepo, TRevocation, TConnection, TBootstrap, TAgent>
where
    TRepo: RepoBuilder + Send + Sync,
    TCredentialRepo: CredentialRepoBuilder + Send + Sync,
    TConnectionRepo: ConnectionRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TConnection: ConnectionAPI + 'static,
    TBootstrap: BootstrapAPI + 'static,
    TAgent: AgentBuilder + Send + Sync,
{
    repo: Arc<TRepo>,
    credential_repo: Arc<TCredentialRepo>,
    connection_repo: Arc<TConnectionRepo>,
    revocation: Arc<TRevocation>,
    connections: Arc<TConnection>,
    bootstrap: Arc<TBootstrap>,
    agent: Arc<TAgent>,
    tasks: TaskPool,
    ctx: Context,
}

impl<TRepo, TCredentialRepo, TConnectionRepo, TRevocation, TConnection, TBootstrap, TAgent> Clone
    for Usecase<TRepo, TCredentialRepo, TConnectionRepo, TRevocation, TConnection, TBootstrap, TAgent>
where
    TRepo: RepoBuilder + Send + Sync,
    TCredentialRepo: CredentialRepoBuilder + Send + Sync,
    TConnectionRepo: ConnectionRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TConnection: ConnectionAPI + 'static,
    TBootstrap: BootstrapAPI + 'static,
    TAgent: AgentBuilder + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            credential_repo: self.credential_repo.clone(),
            connection_repo: self.connection_repo.clone(),
            revocation: self.revocation.clone(),
            connections: self.connections.clone(),
            bootstrap: self.bootstrap.clone(),
            agent: self.agent.clone(),
            tasks: self.tasks.clone(),
            ctx: self.ctx.clone(),
        }
    }
}

fn validate_bpn(bpn: &str) -> Result<String, IdentityError> {
    match Identifier::parse(bpn)? {
        Identifier::Bpn(bpn) => Ok(bpn),
        Identifier::Did(_) => Err(IdentityError::ValidationError(format!(
            "expected a bpn, got {bpn}"
        ))),
    }
}

impl<TRepo, TCredentialRepo, TConnectionRepo, TRevocation, TConnection, TBootstrap, TAgent>
    Usecase<TRepo, TCredentialRepo, TConnectionRepo, TRevocation, TConnection, TBootstrap, TAgent>
where
    TRepo: RepoBuilder + Send + Sync,
    TCredentialRepo: CredentialRepoBuilder + Send + Sync,
    TConnectionRepo: ConnectionRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TConnection: ConnectionAPI + 'static,
    TBootstrap: BootstrapAPI + 'static,
    TAgent: AgentBuilder + Send + Sync,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<TRepo>,
        credential_repo: Arc<TCredentialRepo>,
        connection_repo: Arc<TConnectionRepo>,
        revocation: Arc<TRevocation>,
        connections: Arc<TConnection>,
        bootstrap: Arc<TBootstrap>,
        agent: Arc<TAgent>,
        tasks: TaskPool,
        ctx: Context,
    ) -> Self {
        Self {
            repo,
            credential_repo,
            connection_repo,
            revocation,
            connections,
            bootstrap,
            agent,
            tasks,
            ctx,
        }
    }

    async fn compensate(&self, keys: Option<&AgentKeys>) {
        let keys = match keys {
            Some(keys) => keys,
            None => return,
        };

        if let Err(err) = self
            .agent
            .remove_sub_identity(keys.wallet_id.clone(), keys.wallet_key.clone())
            .await
        {
            error!(
                "[wallet:compensate] sub identity: {} | removal failed: {err}",
                keys.wallet_id
            );
        }
    }

    /// `rollback` undoes a provisioned wallet, the stored row first, then its sub identity
    async fn rollback(&self, wallet: &Wallet) {
        if let Err(err) = self.repo.remove_wallet(wallet.bpn()).await {
            error!(
                "[wallet:rollback] bpn: {} | removal failed: {err}",
                wallet.bpn()
            );
        }

        self.compensate(wallet.keys().as_ref()).await;
    }

    /// `provision` allocates the agent side of a wallet and persists it
    async fn provision(&self, name: String, bpn: String) -> Result<Wallet, IdentityError> {
        let is_base = bpn == self.ctx.base_bpn();

        let keys: Option<AgentKeys> = match is_base {
            true => None,
            false => Some(self.agent.create_sub_identity(name.clone()).await?.into()),
        };

        let auth = match keys.as_ref() {
            Some(keys) => AgentAuth::Tenant {
                wallet_id: keys.wallet_id.clone(),
                token: keys.token.clone(),
            },
            None => AgentAuth::Base,
        };

        let did_info = match self.agent.create_did(auth).await {
            Ok(info) => info,
            Err(err) => {
                self.compensate(keys.as_ref()).await;
                return Err(err.into());
            }
        };

        // the base wallet endorses every other did, its own did is anchored out of band
        if !is_base {
            if let Err(err) = self
                .agent
                .register_did_on_ledger(did_info.did.clone(), did_info.verkey.clone(), name.clone())
                .await
            {
                self.compensate(keys.as_ref()).await;
                return Err(err.into());
            }
        }

        let wallet = match keys.clone() {
            Some(keys) => Wallet::new_managed(name, bpn, did_info.did, did_info.verkey, keys),
            None => Wallet::new_base(name, bpn, did_info.did, did_info.verkey),
        };

        if let Err(err) = self.repo.save_wallet(&wallet).await {
            self.compensate(keys.as_ref()).await;
            return Err(err);
        }

        Ok(wallet)
    }

    fn spawn_default_issuance(&self, wallet: &Wallet) {
        let bootstrap = self.bootstrap.clone();
        let bpn = wallet.bpn();

        self.tasks
            .spawn(format!("default-credentials:{bpn}"), async move {
                let _ = bootstrap.issue_default_credentials(bpn).await?;
                Ok(())
            });
    }

    fn spawn_base_connection(&self, wallet: &Wallet) {
        let connections = self.connections.clone();
        let base_bpn = self.ctx.base_bpn();
        let did = wallet.did();

        self.tasks
            .spawn(format!("base-connection:{did}"), async move {
                let _ = connections.connect(base_bpn, did, None).await?;
                Ok(())
            });
    }
}

#[async_trait]
impl<TRepo, TCredentialRepo, TConnectionRepo, TRevocation, TConnection, TBootstrap, TAgent> WalletAPI
    for Usecase<TRepo, TCredentialRepo, TConnectionRepo, TRevocation, TConnection, TBootstrap, TAgent>
where
    TRepo: RepoBuilder + Send + Sync,
    TCredentialRepo: CredentialRepoBuilder + Send + Sync,
    TConnectionRepo: ConnectionRepoBuilder + Send + Sync,
    TRevocation: RevocationAPI,
    TConnection: ConnectionAPI + 'static,
    TBootstrap: BootstrapAPI + 'static,
    TAgent: AgentBuilder + Send + Sync,
{
    async fn create_wallet(&self, name: String, bpn: String) -> Result<Wallet, IdentityError> {
        if name.trim().is_empty() {
            return Err(IdentityError::ValidationError("name was missing".to_string()));
        }

        let bpn = validate_bpn(&bpn)?;
        if self.repo.get_wallet_by_bpn(bpn.clone()).await?.is_some() {
            return Err(IdentityError::Conflict(format!("wallet {bpn}")));
        }

        let wallet = self.provision(name, bpn).await?;
        if let Err(err) = self
            .revocation
            .register_list(wallet.revocation_list_name())
            .await
        {
            warn!(
                "[wallet:create_wallet] bpn: {} | revocation list failed, rolling back: {err}",
                wallet.bpn()
            );
            self.rollback(&wallet).await;
            return Err(err);
        }

        info!(
            "[wallet:create_wallet] bpn: {} | did: {} | kind: {:?}",
            wallet.bpn(),
            wallet.did(),
            wallet.kind()
        );

        self.spawn_default_issuance(&wallet);
        if wallet.kind() == WalletKind::Managed {
            self.spawn_base_connection(&wallet);
        }

        Ok(wallet)
    }

    async fn ensure_base_wallet(&self) -> Result<Wallet, IdentityError> {
        let existing = self.repo.get_wallet_by_bpn(self.ctx.base_bpn()).await?;
        match existing {
            Some(wallet) => {
                let _ = self
                    .revocation
                    .register_list(wallet.revocation_list_name())
                    .await?;

                if wallet.is_pending_membership_issuance() {
                    self.spawn_default_issuance(&wallet);
                }

                debug!("[wallet:ensure_base_wallet] bpn: {} | present", wallet.bpn());
                Ok(wallet)
            }
            None => {
                self.create_wallet(self.ctx.base_name(), self.ctx.base_bpn())
                    .await
            }
        }
    }

    async fn register_self_managed_wallet(
        &self,
        name: String,
        bpn: String,
        did: String,
        callback_url: Option<String>,
    ) -> Result<Wallet, IdentityError> {
        if name.trim().is_empty() {
            return Err(IdentityError::ValidationError("name was missing".to_string()));
        }

        let bpn = validate_bpn(&bpn)?;
        validate_did(&did)?;

        let wallet = Wallet::new_self_managed(name, bpn, did);
        self.repo.save_wallet(&wallet).await?;

        if let Err(err) = self
            .connections
            .connect(self.ctx.base_bpn(), wallet.did(), callback_url)
            .await
        {
            warn!(
                "[wallet:register_self_managed_wallet] bpn: {} | connection failed, rolling back: {err}",
                wallet.bpn()
            );
            self.repo.remove_wallet(wallet.bpn()).await?;
            return Err(err);
        }

        info!(
            "[wallet:register_self_managed_wallet] bpn: {} | did: {}",
            wallet.bpn(),
            wallet.did()
        );
        Ok(wallet)
    }

    async fn delete_wallet(&self, identifier: String) -> Result<(), IdentityError> {
        let wallet = resolve_wallet(self.repo.as_ref(), &identifier).await?;
        if wallet.kind() == WalletKind::Base {
            return Err(IdentityError::ValidationError(
                "the base wallet cannot be deleted".to_string(),
            ));
        }

        let credentials = self
            .credential_repo
            .remove_credentials_by_holder(wallet.did())
            .await?;
        let connections = self
            .connection_repo
            .remove_connections_by_did(wallet.did())
            .await?;

        if let Some(keys) = wallet.keys() {
            self.agent
                .remove_sub_identity(keys.wallet_id, keys.wallet_key)
                .await?;
        }

        self.repo.remove_wallet(wallet.bpn()).await?;

        info!(
            "[wallet:delete_wallet] bpn: {} | credentials: {credentials} | connections: {connections}",
            wallet.bpn()
        );
        Ok(())
    }

    async fn get_wallet(&self, identifier: String) -> Result<Wallet, IdentityError> {
        resolve_wallet(self.repo.as_ref(), &identifier).await
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>, IdentityError> {
        self.repo.list_wallets().await
    }

    async fn update_service_endpoint(
        &self,
        identifier: String,
        endpoint: String,
    ) -> Result<(), IdentityError> {
        let endpoint = endpoint.trim().to_string();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(IdentityError::ValidationError(format!(
                "service endpoint must be an http url, got '{endpoint}'"
            )));
        }

        let wallet = resolve_wallet(self.repo.as_ref(), &identifier).await?;
        let auth = wallet.agent_auth()?;

        let document = self.agent.resolve_did(wallet.did()).await?;
        if document
            .service
            .iter()
            .any(|service| service.service_endpoint == endpoint)
        {
            return Err(IdentityError::Conflict(format!(
                "service endpoint {endpoint} of {}",
                wallet.did()
            )));
        }

        self.agent
            .update_service_endpoint(auth, wallet.did(), endpoint)
            .await?;
        Ok(())
    }
}
