use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, info, warn};

use crate::agent::types::{AgentBuilder, ExchangeRecord};
use crate::identity::callback::types::{CallbackAPI, CallbackTopic};
use crate::identity::connection::types::ConnectionAPI;
use crate::identity::types::{Context, IdentityError, Transition};
use crate::identity::verifiable::credential::types::{CredentialAPI, IssueParams};
use crate::identity::verifiable::VerifiableCredential;
use crate::identity::wallet::types::{resolve_wallet, RepoBuilder as WalletRepoBuilder};
use crate::identity::wallet::{Wallet, WalletKind};
use crate::locks::KeyedLock;

use super::types::{CredentialExchangeEvent, ExchangeAPI, ExchangeState, Lane, OfferParams};

pub struct Usecase<TWalletRepo, TCallback, TCredential, TConnection, TAgent>
where
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TCallback: CallbackAPI,
    TCredential: CredentialAPI,
    TConnection: ConnectionAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    wallets: Arc<TWalletRepo>,
    callbacks: Arc<TCallback>,
    credentials: Arc<TCredential>,
    connections: Arc<TConnection>,
    agent: Arc<TAgent>,
    locks: KeyedLock,
    ctx: Context,
}

impl<TWalletRepo, TCallback, TCredential, TConnection, TAgent> Clone
    for Usecase<TWalletRepo, TCallback, TCredential, TConnection, TAgent>
where
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TCallback: CallbackAPI,
    TCredential: CredentialAPI,
    TConnection: ConnectionAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            wallets: self.wallets.clone(),
            callbacks: self.callbacks.clone(),
            credentials: self.credentials.clone(),
            connections: self.connections.clone(),
            agent: self.agent.clone(),
            locks: self.locks.clone(),
            ctx: self.ctx.clone(),
        }
    }
}

/// holder side records get their own key, the caller facing record stays on the thread id
fn record_key(thread_id: &str, lane: Lane) -> String {
    match lane {
        Lane::Issuer => thread_id.to_string(),
        Lane::Holder => format!("{thread_id}#holder"),
    }
}

impl<TWalletRepo, TCallback, TCredential, TConnection, TAgent>
    Usecase<TWalletRepo, TCallback, TCredential, TConnection, TAgent>
where
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TCallback: CallbackAPI,
    TCredential: CredentialAPI,
    TConnection: ConnectionAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    pub fn new(
        wallets: Arc<TWalletRepo>,
        callbacks: Arc<TCallback>,
        credentials: Arc<TCredential>,
        connections: Arc<TConnection>,
        agent: Arc<TAgent>,
        ctx: Context,
    ) -> Self {
        Self {
            wallets,
            callbacks,
            credentials,
            connections,
            agent,
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

    /// `store_issued` stores the attached credential for a self-managed holder. Managed
    /// holders already got theirs from the issuing call
    async fn store_issued(&self, event: &CredentialExchangeEvent) -> Result<(), IdentityError> {
        let credential = match event.attached_credential()? {
            Some(credential) => credential,
            None => {
                warn!(
                    "[exchange:store_issued] thread: {} | no credential attached",
                    event.thread_id
                );
                return Ok(());
            }
        };

        let holder_did = VerifiableCredential::from_value(credential.clone())?
            .subject_id()
            .ok_or(IdentityError::ValidationError(
                "issued credential has no subject".to_string(),
            ))?;

        let holder = match self.wallets.get_wallet_by_did(holder_did.clone()).await? {
            Some(wallet) if wallet.kind() == WalletKind::SelfManaged => wallet,
            _ => {
                debug!("[exchange:store_issued] holder: {holder_did} | not self-managed, skipped");
                return Ok(());
            }
        };

        match self.credentials.store_credential(holder.did(), credential).await {
            Ok(stored) => {
                info!(
                    "[exchange:store_issued] holder: {} | credential: {}",
                    holder.bpn(),
                    stored.id()
                );
                Ok(())
            }
            Err(IdentityError::Conflict(_)) => {
                debug!("[exchange:store_issued] holder: {} | already stored", holder.bpn());
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl<TWalletRepo, TCallback, TCredential, TConnection, TAgent> ExchangeAPI
    for Usecase<TWalletRepo, TCallback, TCredential, TConnection, TAgent>
where
    TWalletRepo: WalletRepoBuilder + Send + Sync,
    TCallback: CallbackAPI,
    TCredential: CredentialAPI,
    TConnection: ConnectionAPI,
    TAgent: AgentBuilder + Send + Sync,
{
    async fn offer_credential(&self, params: OfferParams) -> Result<ExchangeRecord, IdentityError> {
        let issuer = resolve_wallet(self.wallets.as_ref(), &params.issuer).await?;
        let holder = resolve_wallet(self.wallets.as_ref(), &params.holder).await?;

        if holder.kind() != WalletKind::SelfManaged {
            return Err(IdentityError::ValidationError(format!(
                "holder {} is custodied, use issue_credential",
                holder.bpn()
            )));
        }

        let auth = issuer.agent_auth()?;
        let connection = self
            .connections
            .find_completed_connection(issuer.did(), holder.did())
            .await?
            .ok_or(IdentityError::NotFound(format!(
                "completed connection between {} and {}",
                issuer.bpn(),
                holder.bpn()
            )))?;

        let unsigned = self
            .credentials
            .prepare_credential(IssueParams {
                issuer: issuer.did(),
                holder: Some(holder.did()),
                credential_type: params.credential_type,
                claims: params.claims,
                issuance_date: None,
                expiration_date: params.expiration_date,
                revocable: params.revocable,
            })
            .await?;

        let record = self
            .agent
            .send_credential_offer(auth, connection.connection_id(), unsigned.to_value()?)
            .await?;

        let state = ExchangeState::parse(&record.state).unwrap_or(ExchangeState::OfferSent);
        let _guard = self.locks.lock(&record.thread_id).await;
        let _ = self
            .callbacks
            .open(
                record.thread_id.clone(),
                CallbackTopic::Credential,
                params.callback_url,
                state.as_str().to_string(),
            )
            .await?;

        info!(
            "[exchange:offer_credential] issuer: {} | holder: {} | thread: {}",
            issuer.bpn(),
            holder.bpn(),
            record.thread_id
        );

        Ok(record)
    }

    async fn handle_event(
        &self,
        agent_wallet_id: Option<String>,
        event: CredentialExchangeEvent,
    ) -> Result<Transition, IdentityError> {
        let state = match ExchangeState::parse(&event.state) {
            Some(state) => state,
            None => {
                warn!(
                    "[exchange:handle_event] thread: {} | unknown state: {}",
                    event.thread_id, event.state
                );
                return Ok(Transition::Ignored);
            }
        };

        if event.thread_id.trim().is_empty() {
            return Err(IdentityError::ValidationError(
                "thread_id was missing".to_string(),
            ));
        }

        let key = record_key(&event.thread_id, event.lane(state));
        let _guard = self.locks.lock(&key).await;

        let current = self.callbacks.get(key.clone()).await?;
        let transition = match current.as_ref() {
            Some(record) if record.is_terminal() => {
                if ExchangeState::parse(&record.state()) == Some(state) {
                    Transition::Replayed
                } else {
                    Transition::Ignored
                }
            }
            Some(record) => ExchangeState::transition(ExchangeState::parse(&record.state()), state),
            None => Transition::Applied,
        };

        if transition != Transition::Applied {
            debug!(
                "[exchange:handle_event] thread: {} | state: {} | {:?}",
                event.thread_id,
                state.as_str(),
                transition
            );
            return Ok(transition);
        }

        // side effects first, the record only moves once they succeeded
        match state {
            ExchangeState::OfferReceived | ExchangeState::CredentialReceived => {
                let owner = self.resolve_owner(agent_wallet_id).await?;
                if owner.kind() != WalletKind::SelfManaged {
                    let auth = owner.agent_auth()?;
                    let _ = match state {
                        ExchangeState::OfferReceived => {
                            self.agent
                                .accept_credential_offer(auth, event.cred_ex_id.clone())
                                .await?
                        }
                        _ => {
                            self.agent
                                .accept_issued_credential(auth, event.cred_ex_id.clone())
                                .await?
                        }
                    };
                }
            }
            ExchangeState::CredentialIssued => {
                if let Err(err) = self.store_issued(&event).await {
                    warn!(
                        "[exchange:handle_event] thread: {} | store failed, waiting for redelivery: {err}",
                        event.thread_id
                    );
                    return Ok(Transition::Deferred);
                }
            }
            _ => {}
        }

        let _ = self
            .callbacks
            .update_state(
                key,
                CallbackTopic::Credential,
                state.as_str().to_string(),
                state.is_terminal(),
            )
            .await?;

        info!(
            "[exchange:handle_event] thread: {} | state: {}",
            event.thread_id,
            state.as_str()
        );

        Ok(Transition::Applied)
    }
}
