use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::sync::Mutex;
use rstdev_storage::engine::rocksdb::db::DB;

use prople_warden_core::identity::types::IdentityError;
use prople_warden_core::identity::wallet::types::RepoBuilder;
use prople_warden_core::identity::wallet::Wallet;

use crate::apps::{DbIdSet, DbRunner};
use crate::common::helpers::build_key;

const WALLET_KEY_BPN: &str = "wallet_bpn";
const WALLET_KEY_DID: &str = "wallet_did";
const WALLET_KEY_AGENT: &str = "wallet_agent";
const WALLET_KEY_INDEX: &str = "wallet_index";

/// `Repository` stores wallets by BPN, with secondary keys for the DID and the agent
/// sub-wallet id pointing back to the BPN
#[derive(Clone)]
pub struct Repository {
    db: DbRunner<DB>,
    write: Arc<Mutex<()>>,
}

impl Repository {
    pub fn new(db: DbRunner<DB>) -> Self {
        Self {
            db,
            write: Arc::new(Mutex::new(())),
        }
    }

    fn index_key(&self) -> String {
        build_key(WALLET_KEY_INDEX, "all")
    }

    async fn bpn_by(&self, prefix: &str, val: &str) -> Result<Option<String>, IdentityError> {
        let bpn: Option<String> = self.db.get_value(build_key(prefix, val)).await?;
        Ok(bpn)
    }
}

#[async_trait]
impl RepoBuilder for Repository {
    async fn save_wallet(&self, wallet: &Wallet) -> Result<(), IdentityError> {
        let _write = self.write.lock().await;

        if self.get_wallet_by_bpn(wallet.bpn()).await?.is_some() {
            return Err(IdentityError::Conflict(format!(
                "wallet bpn already exists: {}",
                wallet.bpn()
            )));
        }

        if self.bpn_by(WALLET_KEY_DID, &wallet.did()).await?.is_some() {
            return Err(IdentityError::Conflict(format!(
                "wallet did already exists: {}",
                wallet.did()
            )));
        }

        self.db
            .save_value(build_key(WALLET_KEY_BPN, &wallet.bpn()), wallet)
            .await?;

        self.db
            .save_value(build_key(WALLET_KEY_DID, &wallet.did()), &wallet.bpn())
            .await?;

        if let Some(keys) = wallet.keys() {
            self.db
                .save_value(build_key(WALLET_KEY_AGENT, &keys.wallet_id), &wallet.bpn())
                .await?;
        }

        let mut index = DbIdSet::load(&self.db, self.index_key()).await?;
        index.insert(wallet.bpn());
        index.store(&self.db, self.index_key()).await?;

        debug!("[wallet:repo:save] bpn: {}", wallet.bpn());
        Ok(())
    }

    async fn update_wallet(&self, wallet: &Wallet) -> Result<(), IdentityError> {
        let _write = self.write.lock().await;

        if self.get_wallet_by_bpn(wallet.bpn()).await?.is_none() {
            return Err(IdentityError::NotFound(format!("wallet {}", wallet.bpn())));
        }

        self.db
            .save_value(build_key(WALLET_KEY_BPN, &wallet.bpn()), wallet)
            .await?;

        Ok(())
    }

    async fn remove_wallet(&self, bpn: String) -> Result<(), IdentityError> {
        let _write = self.write.lock().await;

        let wallet = match self.get_wallet_by_bpn(bpn.clone()).await? {
            Some(wallet) => wallet,
            None => return Ok(()),
        };

        self.db.remove(build_key(WALLET_KEY_DID, &wallet.did())).await?;
        if let Some(keys) = wallet.keys() {
            self.db
                .remove(build_key(WALLET_KEY_AGENT, &keys.wallet_id))
                .await?;
        }

        self.db.remove(build_key(WALLET_KEY_BPN, &bpn)).await?;

        let mut index = DbIdSet::load(&self.db, self.index_key()).await?;
        index.remove(&bpn);
        index.store(&self.db, self.index_key()).await?;

        debug!("[wallet:repo:remove] bpn: {}", bpn);
        Ok(())
    }

    async fn get_wallet_by_bpn(&self, bpn: String) -> Result<Option<Wallet>, IdentityError> {
        let wallet: Option<Wallet> = self.db.get_value(build_key(WALLET_KEY_BPN, &bpn)).await?;
        Ok(wallet)
    }

    async fn get_wallet_by_did(&self, did: String) -> Result<Option<Wallet>, IdentityError> {
        match self.bpn_by(WALLET_KEY_DID, &did).await? {
            Some(bpn) => self.get_wallet_by_bpn(bpn).await,
            None => Ok(None),
        }
    }

    async fn get_wallet_by_agent_id(
        &self,
        wallet_id: String,
    ) -> Result<Option<Wallet>, IdentityError> {
        match self.bpn_by(WALLET_KEY_AGENT, &wallet_id).await? {
            Some(bpn) => self.get_wallet_by_bpn(bpn).await,
            None => Ok(None),
        }
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>, IdentityError> {
        let index = DbIdSet::load(&self.db, self.index_key()).await?;
        let keys = index
            .ids()
            .iter()
            .map(|bpn| build_key(WALLET_KEY_BPN, bpn))
            .collect();

        let mut wallets: Vec<Wallet> = self.db.get_values(keys).await?;
        wallets.sort_by_key(|wallet| wallet.created_at());
        Ok(wallets)
    }
}
