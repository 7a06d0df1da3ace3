use std::sync::Arc;
use std::time::Duration;

use rst_common::with_logging::log::info;

use prople_warden_core::identity::callback::Usecase as CallbackUsecase;
use prople_warden_core::identity::connection::Usecase as ConnectionUsecase;
use prople_warden_core::identity::exchange::Usecase as ExchangeUsecase;
use prople_warden_core::identity::revocation::Usecase as RevocationUsecase;
use prople_warden_core::identity::verifiable::credential::Usecase as CredentialUsecase;
use prople_warden_core::identity::verifiable::presentation::Usecase as PresentationUsecase;
use prople_warden_core::identity::wallet::{Bootstrap, Usecase as WalletUsecase};
use prople_warden_core::tasks::TaskPool;

use crate::apps::identity::{callback, connection, credential, revocation, wallet};
use crate::apps::DbBuilder;
use crate::common::helpers;
use crate::common::types::CommonError;
use crate::config::{Config, Parser};
use crate::rpc::shared::HttpClient;
use crate::rpc::{agent, bpdm, notifier, revocation as status_list};

pub type AgentClient = agent::RpcClient;
pub type BpdmClient = bpdm::RpcClient;

pub type CallbackService = CallbackUsecase<callback::Repository, notifier::RpcClient>;

pub type RevocationService = RevocationUsecase<
    revocation::Repository,
    wallet::Repository,
    AgentClient,
    status_list::RpcClient,
>;

pub type CredentialService =
    CredentialUsecase<credential::Repository, wallet::Repository, RevocationService, AgentClient>;

pub type BootstrapService = Bootstrap<wallet::Repository, CredentialService>;

pub type ConnectionService = ConnectionUsecase<
    connection::Repository,
    wallet::Repository,
    CallbackService,
    AgentClient,
    BootstrapService,
    BpdmClient,
>;

pub type ExchangeService = ExchangeUsecase<
    wallet::Repository,
    CallbackService,
    CredentialService,
    ConnectionService,
    AgentClient,
>;

pub type WalletService = WalletUsecase<
    wallet::Repository,
    credential::Repository,
    connection::Repository,
    RevocationService,
    ConnectionService,
    BootstrapService,
    AgentClient,
>;

pub type PresentationService = PresentationUsecase<wallet::Repository, RevocationService, AgentClient>;

/// `Identity` is the fully wired set of identity services
#[derive(Clone)]
pub struct Identity {
    wallets: Arc<WalletService>,
    connections: Arc<ConnectionService>,
    exchanges: Arc<ExchangeService>,
    credentials: Arc<CredentialService>,
    presentations: Arc<PresentationService>,
    revocation: Arc<RevocationService>,
    callbacks: Arc<CallbackService>,
    bpdm: Arc<BpdmClient>,
    tasks: TaskPool,
}

impl Identity {
    pub fn wallets(&self) -> Arc<WalletService> {
        self.wallets.clone()
    }

    pub fn connections(&self) -> Arc<ConnectionService> {
        self.connections.clone()
    }

    pub fn exchanges(&self) -> Arc<ExchangeService> {
        self.exchanges.clone()
    }

    pub fn credentials(&self) -> Arc<CredentialService> {
        self.credentials.clone()
    }

    pub fn presentations(&self) -> Arc<PresentationService> {
        self.presentations.clone()
    }

    pub fn revocation(&self) -> Arc<RevocationService> {
        self.revocation.clone()
    }

    pub fn callbacks(&self) -> Arc<CallbackService> {
        self.callbacks.clone()
    }

    pub fn bpdm(&self) -> Arc<BpdmClient> {
        self.bpdm.clone()
    }

    pub fn tasks(&self) -> TaskPool {
        self.tasks.clone()
    }
}

/// `WardenRPC` loads the configuration and wires storage, agent clients and usecases
pub struct WardenRPC {
    config: Config,
}

impl WardenRPC {
    pub fn new(config_path: &str) -> Result<Self, CommonError> {
        let config = Parser::new(config_path.to_string())
            .parse()
            .map_err(|err| CommonError::ConfigError(err.to_string()))?;

        helpers::validate(config.clone())?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn build_identity(&self) -> Result<Identity, CommonError> {
        let mut db_builder = DbBuilder::new(self.config.clone());
        let db = db_builder.build(|cfg| {
            let storage = cfg.db().identity();
            (storage.common(), storage.options())
        })?;

        let timeout = Duration::from_secs(self.config.agent().timeout_secs());
        let agent_http = HttpClient::new(self.config.agent().base_url(), timeout)?;
        let outbound_http = HttpClient::new(String::new(), timeout)?;
        let bpdm_http = HttpClient::new(self.config.bpdm().base_url(), timeout)?;

        let agent = Arc::new(agent::RpcClient::new(
            agent_http,
            self.config.agent().api_key(),
        ));
        let notifier = Arc::new(notifier::RpcClient::new(outbound_http.clone()));
        let status_lists = Arc::new(status_list::RpcClient::new(outbound_http));
        let bpdm = Arc::new(bpdm::RpcClient::new(bpdm_http));

        let wallet_repo = Arc::new(wallet::Repository::new(db.clone()));
        let credential_repo = Arc::new(credential::Repository::new(db.clone()));
        let connection_repo = Arc::new(connection::Repository::new(db.clone()));
        let callback_repo = Arc::new(callback::Repository::new(db.clone()));
        let revocation_repo = Arc::new(revocation::Repository::new(db));

        let ctx = self.config.platform().to_context();
        let tasks = TaskPool::new(self.config.platform().workers());

        let callbacks = Arc::new(CallbackUsecase::new(callback_repo, notifier, tasks.clone()));
        let revocation = Arc::new(RevocationUsecase::new(
            revocation_repo,
            wallet_repo.clone(),
            agent.clone(),
            status_lists,
            ctx.clone(),
        ));

        let credentials = Arc::new(CredentialUsecase::new(
            credential_repo.clone(),
            wallet_repo.clone(),
            revocation.clone(),
            agent.clone(),
        ));

        let bootstrap = Arc::new(Bootstrap::new(
            wallet_repo.clone(),
            credentials.clone(),
            ctx.clone(),
        ));

        let connections = Arc::new(ConnectionUsecase::new(
            connection_repo.clone(),
            wallet_repo.clone(),
            callbacks.clone(),
            agent.clone(),
            bootstrap.clone(),
            bpdm.clone(),
            tasks.clone(),
            ctx.clone(),
        ));

        let exchanges = Arc::new(ExchangeUsecase::new(
            wallet_repo.clone(),
            callbacks.clone(),
            credentials.clone(),
            connections.clone(),
            agent.clone(),
            ctx.clone(),
        ));

        let wallets = Arc::new(WalletUsecase::new(
            wallet_repo.clone(),
            credential_repo,
            connection_repo,
            revocation.clone(),
            connections.clone(),
            bootstrap,
            agent.clone(),
            tasks.clone(),
            ctx,
        ));

        let presentations = Arc::new(PresentationUsecase::new(
            wallet_repo,
            revocation.clone(),
            agent,
        ));

        info!("[warden:build_identity] identity services ready");
        Ok(Identity {
            wallets,
            connections,
            exchanges,
            credentials,
            presentations,
            revocation,
            callbacks,
            bpdm,
            tasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers::testdb;

    #[test]
    fn test_new_from_fixture() {
        let warden = WardenRPC::new(&testdb::fixture_path("config.toml"));
        assert!(!warden.is_err());

        let warden = warden.unwrap();
        assert_eq!(warden.config().platform().workers(), 4);
    }

    #[test]
    fn test_new_rejects_partial_config() {
        let warden = WardenRPC::new(&testdb::fixture_path("config_app.toml"));
        assert!(matches!(warden, Err(CommonError::ConfigError(_))));
    }

    #[test]
    fn test_new_missing_file() {
        let warden = WardenRPC::new(&testdb::fixture_path("missing.toml"));
        assert!(matches!(warden, Err(CommonError::ConfigError(_))));
    }
}
