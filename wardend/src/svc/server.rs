use std::time::Duration;

use rst_common::with_http_tokio::axum::{self, Router};
use rst_common::with_http_tokio::tower_http::timeout::TimeoutLayer;
use rst_common::with_http_tokio::tower_http::trace::TraceLayer;
use rst_common::with_logging::log::info;
use rst_common::with_tokio::tokio::net::TcpListener;
use rst_common::with_tracing::tracing_subscriber::{
    self, layer::SubscriberExt, util::SubscriberInitExt,
};

use prople_warden_core::identity::wallet::types::WalletAPI;
use prople_warden_rpc::WardenRPC;

use crate::errors::WardenError;
use crate::svc::routes::{self, AppState};
use crate::svc::scheduler::Scheduler;

pub struct Server {
    config: String,
}

impl Server {
    pub fn new(config: String) -> Server {
        Self { config }
    }

    fn init_tracing(&self) {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!(
                        "{}=debug,warden_core=debug,warden_rpc=debug,tower_http=debug",
                        env!("CARGO_CRATE_NAME")
                    )
                    .into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();
    }

    pub async fn serve(&self) -> Result<(), WardenError> {
        self.init_tracing();

        let warden_rpc =
            WardenRPC::new(&self.config).map_err(|err| WardenError::RpcError(err.to_string()))?;

        let identity = warden_rpc
            .build_identity()
            .map_err(|err| WardenError::RpcError(err.to_string()))?;

        let base_wallet = identity.wallets().ensure_base_wallet().await?;
        info!(
            "[wardend:serve] base wallet bpn: {} | did: {}",
            base_wallet.bpn(),
            base_wallet.did()
        );

        let scheduler = Scheduler::new(
            identity.revocation(),
            identity.bpdm(),
            identity.callbacks(),
            warden_rpc.config().scheduler().clone(),
        );
        let _jobs = scheduler.start();

        let state = AppState::new(
            identity.connections(),
            identity.exchanges(),
            identity.revocation(),
        );

        let app: Router = routes::router(state).layer((
            TraceLayer::new_for_http(),
            TimeoutLayer::new(Duration::from_secs(10)),
        ));

        let listen_addr = warden_rpc.config().app().listen_addr();
        let listener = TcpListener::bind(&listen_addr)
            .await
            .map_err(|err| WardenError::ServerError(err.to_string()))?;

        info!("[wardend:serve] listening on: {}", listen_addr);
        axum::serve(listener, app)
            .await
            .map_err(|err| WardenError::ServerError(err.to_string()))?;

        identity.tasks().wait_idle().await;
        Ok(())
    }
}
