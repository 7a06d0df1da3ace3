use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, info, warn};

use crate::agent::types::AgentBuilder;
use crate::bpdm::BpdmBuilder;
use crate::identity::callback::types::{CallbackAPI, CallbackTopic};
use crate::identity::types::{validate_did, Context, IdentityError, Transition};
use crate::identity::wallet::types::{
    resolve_wallet, BootstrapAPI, RepoBuilder as WalletRepoBuilder,
};
use crate::identity::wallet::{Wallet, WalletKind};
use crate::locks::KeyedLock;
use crate::tasks::TaskPool;

use super::types::{ConnectionAPI, ConnectionEvent, RepoBuilder, Rfc23State};
use super::Connection;

pub struct Usecase<TRepo, TWalletRepo, TCallback, TAgent, TBootstrap, TBpdm>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync + 'static,
    TCallback: CallbackAPI,
    TAgent: AgentBuilder + Send + Sync + 'static,
    TBootstrap: BootstrapAPI + 'static,
    TBpdm: BpdmBuilder + Send + Sync + 'static,
{
    repo: Arc<TRepo>,
    wallets: Arc<TWalletRepo>,
    callbacks: Arc<TCallback>,
    agent: Arc<TAgent>,
    bootstrap: Arc<TBootstrap>,
    bpdm: Arc<TBpdm>,
    tasks: TaskPool,
    locks: KeyedLock,
    ctx: Context,
}

impl<TRepo, TWalletRepo, TCallback, TAgent, TBootstrap, TBpdm> Clone
    for Usecase<TRepo, TWalletRepo, TCallback, TAgent, TBootstrap, TBpdm>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync + 'static,
    TCallback: CallbackAPI,
    TAgent: AgentBuilder + Send + Sync + 'static,
    TBootstrap: BootstrapAPI + 'static,
    TBpdm: BpdmBuilder + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            wallets: self.wallets.clone(),
            callbacks: self.callbacks.clone(),
            agent: self.agent.clone(),
            bootstrap: self.bootstrap.clone(),
            bpdm: self.bpdm.clone(),
            tasks: self.tasks.clone(),
            locks: self.locks.clone(),
            ctx: self.ctx.clone(),
        }
    }
}

impl<TRepo, TWalletRepo, TCallback, TAgent, TBootstrap, TBpdm>
    Usecase<TRepo, TWalletRepo, TCallback, TAgent, TBootstrap, TBpdm>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync + 'static,
    TCallback: CallbackAPI,
    TAgent: AgentBuilder + Send + Sync + 'static,
    TBootstrap: BootstrapAPI + 'static,
    TBpdm: BpdmBuilder + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<TRepo>,
        wallets: Arc<TWalletRepo>,
        callbacks: Arc<TCallback>,
        agent: Arc<TAgent>,
        bootstrap: Arc<TBootstrap>,
        bpdm: Arc<TBpdm>,
        tasks: TaskPool,
        ctx: Context,
    ) -> Self {
        Self {
            repo,
            wallets,
            callbacks,
            agent,
            bootstrap,
            bpdm,
            tasks,
            locks: KeyedLock::new(),
            ctx,
        }
    }

    async fn resolve_owner(&self, agent_wallet_id: Option<String>) -> Result<Wallet, IdentityError> {
        match agent_wallet_id.filter(|id| !id.is_empty()) {
            Some(wallet_id) => self
                .wallets
                .get_wallet_by_agent_id(wallet_id.clone())
                .await?
                .ok_or(IdentityError::NotFound(format!("agent wallet {wallet_id}"))),
            None => self
                .wallets
                .get_wallet_by_bpn(self.ctx.base_bpn())
                .await?
                .ok_or(IdentityError::NotFound("base wallet".to_string())),
        }
    }

    /// `apply_state` persists a state reported by the agent, honoring the transition table.
    /// Callers must hold the connection lock
    async fn apply_state(
        &self,
        owner: &Wallet,
        connection_id: String,
        target_did: Option<String>,
        state: Rfc23State,
    ) -> Result<(Connection, Transition), IdentityError> {
        let existing = self.repo.get_connection(connection_id.clone()).await?;
        let transition = Rfc23State::transition(existing.as_ref().map(|conn| conn.state()), state);

        let mut connection = existing.unwrap_or(Connection::new(
            connection_id,
            owner.did(),
            target_did.clone(),
            state,
        ));

        if transition == Transition::Applied {
            connection.set_target_did(target_did);
            connection.set_state(state);
            self.repo.save_connection(&connection).await?;
        }

        Ok((connection, transition))
    }

    async fn record_callback(&self, connection: &Connection) -> Result<(), IdentityError> {
        let state = connection.state();
        let _ = self
            .callbacks
            .update_state(
                connection.connection_id(),
                CallbackTopic::Connection,
                state.as_str().to_string(),
                state.is_terminal(),
            )
            .await?;

        Ok(())
    }

    async fn accept_with(
        &self,
        owner: &Wallet,
        connection_id: String,
    ) -> Result<Connection, IdentityError> {
        let auth = owner.agent_auth()?;
        let record = self
            .agent
            .accept_connection_request(auth, connection_id.clone())
            .await?;

        let state = Rfc23State::parse(&record.rfc23_state).unwrap_or(Rfc23State::ResponseSent);
        let (connection, _) = self
            .apply_state(owner, connection_id, record.their_did, state)
            .await?;

        Ok(connection)
    }

    fn on_completed(&self, owner: Wallet, event: &ConnectionEvent) {
        if event.is_endorser_relationship() {
            let agent = self.agent.clone();
            let connection_id = event.connection_id.to_owned();

            self.tasks
                .spawn(format!("endorsement:{}", owner.bpn()), async move {
                    let auth = owner.agent_auth()?;
                    agent.set_endorser_metadata(auth, connection_id).await?;

                    let verkey = owner.verification_key().unwrap_or_default();
                    agent
                        .register_did_on_ledger(owner.did(), verkey, owner.name())
                        .await?;

                    Ok(())
                });

            return;
        }

        self.spawn_default_issuance(&owner);

        let counterpart_did = match event.their_did.to_owned() {
            Some(did) => did,
            None => return,
        };

        let wallets = self.wallets.clone();
        let bootstrap = self.bootstrap.clone();
        let bpdm = self.bpdm.clone();
        let connection_id = event.connection_id.to_owned();

        self.tasks
            .spawn(format!("counterpart:{counterpart_did}"), async move {
                let counterpart = match wallets.get_wallet_by_did(counterpart_did.clone()).await? {
                    Some(wallet) => wallet,
                    None => return Ok(()),
                };

                match counterpart.kind() {
                    WalletKind::SelfManaged => {
                        bpdm.issue_and_send_credentials(counterpart_did, connection_id)
                            .await
                    }
                    WalletKind::Managed if counterpart.is_pending_membership_issuance() => {
                        let _ = bootstrap
                            .issue_default_credentials(counterpart.bpn())
                            .await?;
                        Ok(())
                    }
                    _ => Ok(()),
                }
            });
    }

    fn spawn_default_issuance(&self, wallet: &Wallet) {
        if wallet.kind() != WalletKind::Managed || !wallet.is_pending_membership_issuance() {
            return;
        }

        let bootstrap = self.bootstrap.clone();
        let bpn = wallet.bpn();
        self.tasks
            .spawn(format!("default-credentials:{bpn}"), async move {
                let _ = bootstrap.issue_default_credentials(bpn).await?;
                Ok(())
            });
    }
}

#[async_trait]
impl<TRepo, TWalletRepo, TCallback, TAgent, TBootstrap, TBpdm> ConnectionAPI
    for Usecase<TRepo, TWalletRepo, TCallback, TAgent, TBootstrap, TBpdm>
where
    TRepo: RepoBuilder + Send + Sync,
    TWalletRepo: WalletRepoBuilder + Send + Sync + 'static,
    TCallback: CallbackAPI,
    TAgent: AgentBuilder + Send + Sync + 'static,
    TBootstrap: BootstrapAPI + 'static,
    TBpdm: BpdmBuilder + Send + Sync + 'static,
{
    async fn connect(
        &self,
        owner_identifier: String,
        target_did: String,
        callback_url: Option<String>,
    ) -> Result<Connection, IdentityError> {
        validate_did(&target_did)?;

        let owner = resolve_wallet(self.wallets.as_ref(), &owner_identifier).await?;
        let auth = owner.agent_auth()?;

        let record = self
            .agent
            .send_connection_request(auth, target_did.clone(), Some(owner.name()))
            .await?;

        let state = Rfc23State::parse(&record.rfc23_state).unwrap_or(Rfc23State::RequestSent);
        info!(
            "[connection:connect] owner: {} | target: {target_did} | connection: {} | state: {}",
            owner.bpn(),
            record.connection_id,
            state.as_str()
        );

        let _guard = self.locks.lock(&record.connection_id).await;
        let (connection, _) = self
            .apply_state(&owner, record.connection_id.clone(), Some(target_did), state)
            .await?;

        let _ = self
            .callbacks
            .open(
                connection.connection_id(),
                CallbackTopic::Connection,
                callback_url,
                connection.state().as_str().to_string(),
            )
            .await?;

        Ok(connection)
    }

    async fn accept(
        &self,
        owner_identifier: String,
        connection_id: String,
    ) -> Result<Connection, IdentityError> {
        let owner = resolve_wallet(self.wallets.as_ref(), &owner_identifier).await?;

        let _guard = self.locks.lock(&connection_id).await;
        let connection = self.accept_with(&owner, connection_id).await?;
        self.record_callback(&connection).await?;

        Ok(connection)
    }

    async fn handle_event(
        &self,
        agent_wallet_id: Option<String>,
        event: ConnectionEvent,
    ) -> Result<Transition, IdentityError> {
        let state = match Rfc23State::parse(&event.rfc23_state) {
            Some(state) => state,
            None => {
                warn!(
                    "[connection:handle_event] connection: {} | unknown state: {}",
                    event.connection_id, event.rfc23_state
                );
                return Ok(Transition::Ignored);
            }
        };

        let owner = self.resolve_owner(agent_wallet_id).await?;
        let guard = self.locks.lock(&event.connection_id).await;

        let existing = self.repo.get_connection(event.connection_id.clone()).await?;
        let transition = Rfc23State::transition(existing.as_ref().map(|conn| conn.state()), state);
        if transition != Transition::Applied {
            debug!(
                "[connection:handle_event] connection: {} | state: {} | {:?}",
                event.connection_id,
                state.as_str(),
                transition
            );
            return Ok(transition);
        }

        // the agent is asked first so a failed accept leaves nothing behind for the redelivery
        let connection = if state == Rfc23State::RequestReceived {
            let auth = owner.agent_auth()?;
            let record = self
                .agent
                .accept_connection_request(auth, event.connection_id.clone())
                .await?;

            let _ = self
                .apply_state(
                    &owner,
                    event.connection_id.clone(),
                    event.their_did.clone(),
                    state,
                )
                .await?;

            let accepted = Rfc23State::parse(&record.rfc23_state).unwrap_or(Rfc23State::ResponseSent);
            let (connection, _) = self
                .apply_state(&owner, event.connection_id.clone(), event.their_did.clone(), accepted)
                .await?;
            connection
        } else {
            let (connection, _) = self
                .apply_state(
                    &owner,
                    event.connection_id.clone(),
                    event.their_did.clone(),
                    state,
                )
                .await?;
            connection
        };
        drop(guard);

        info!(
            "[connection:handle_event] owner: {} | connection: {} | state: {}",
            owner.bpn(),
            connection.connection_id(),
            connection.state().as_str()
        );

        self.record_callback(&connection).await?;

        if connection.state() == Rfc23State::Completed {
            self.on_completed(owner, &event);
        }

        Ok(Transition::Applied)
    }

    async fn list_connections(
        &self,
        identifier: String,
    ) -> Result<Vec<Connection>, IdentityError> {
        let wallet = resolve_wallet(self.wallets.as_ref(), &identifier).await?;
        self.repo.list_connections_by_did(wallet.did()).await
    }

    async fn find_completed_connection(
        &self,
        owner_did: String,
        target_did: String,
    ) -> Result<Option<Connection>, IdentityError> {
        let connection = self
            .repo
            .list_connections_by_did(owner_did.clone())
            .await?
            .into_iter()
            .find(|conn| {
                conn.state() == Rfc23State::Completed
                    && conn.involves(&owner_did)
                    && conn.involves(&target_did)
            });

        Ok(connection)
    }
}
