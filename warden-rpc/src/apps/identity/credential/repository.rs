use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::warn;
use rst_common::with_tokio::tokio::sync::Mutex;
use rstdev_storage::engine::rocksdb::db::DB;

use prople_warden_core::identity::types::IdentityError;
use prople_warden_core::identity::verifiable::credential::types::RepoBuilder;
use prople_warden_core::identity::verifiable::credential::Credential;

use crate::apps::{DbIdSet, DbRunner};
use crate::common::helpers::build_key;

const CREDENTIAL_KEY_ID: &str = "credential_id";
const CREDENTIAL_KEY_HOLDER: &str = "credential_holder";

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

    fn build_id_key(&self, id: &str) -> String {
        build_key(CREDENTIAL_KEY_ID, id)
    }

    fn build_holder_key(&self, did: &str) -> String {
        build_key(CREDENTIAL_KEY_HOLDER, did)
    }

    /// `index_holder` adds the credential to its holder index, returns false when it was
    /// already indexed
    async fn index_holder(&self, credential: &Credential) -> Result<bool, IdentityError> {
        let holder_key = self.build_holder_key(&credential.holder_did());
        let mut holder_index = DbIdSet::load(&self.db, holder_key.clone()).await?;
        if !holder_index.insert(credential.id()) {
            return Ok(false);
        }

        holder_index.store(&self.db, holder_key).await?;
        Ok(true)
    }
}

#[async_trait]
impl RepoBuilder for Repository {
    async fn save_credential(&self, credential: &Credential) -> Result<(), IdentityError> {
        let _write = self.write.lock().await;

        let id_key = self.build_id_key(&credential.id());
        let existing: Option<Credential> = self.db.get_value(id_key.clone()).await?;
        if let Some(stored) = existing {
            // a previous save may have stopped between the value and the index write
            if self.index_holder(&stored).await? {
                warn!(
                    "[credential:save] id: {} | holder index repaired",
                    stored.id()
                );
            }

            return Err(IdentityError::Conflict(format!(
                "credential already exists: {}",
                credential.id()
            )));
        }

        self.db.save_value(id_key, credential).await?;
        let _ = self.index_holder(credential).await?;

        Ok(())
    }

    async fn get_credential(&self, id: String) -> Result<Option<Credential>, IdentityError> {
        let credential: Option<Credential> = self.db.get_value(self.build_id_key(&id)).await?;
        Ok(credential)
    }

    async fn list_credentials_by_holder(
        &self,
        holder_did: String,
    ) -> Result<Vec<Credential>, IdentityError> {
        let holder_index = DbIdSet::load(&self.db, self.build_holder_key(&holder_did)).await?;
        let keys = holder_index
            .ids()
            .iter()
            .map(|id| self.build_id_key(id))
            .collect();

        let mut credentials: Vec<Credential> = self.db.get_values(keys).await?;
        credentials.sort_by_key(|credential| credential.issued_at());
        Ok(credentials)
    }

    async fn remove_credentials_by_holder(
        &self,
        holder_did: String,
    ) -> Result<usize, IdentityError> {
        let _write = self.write.lock().await;

        let holder_key = self.build_holder_key(&holder_did);
        let holder_index = DbIdSet::load(&self.db, holder_key.clone()).await?;
        for id in holder_index.ids() {
            self.db.remove(self.build_id_key(&id)).await?;
        }

        self.db.remove(holder_key).await?;
        Ok(holder_index.len())
    }
}
