use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_tokio::tokio::sync::Mutex;
use rstdev_storage::engine::rocksdb::db::DB;

use prople_warden_core::identity::revocation::types::RepoBuilder;
use prople_warden_core::identity::revocation::RevocationList;
use prople_warden_core::identity::types::IdentityError;

use crate::apps::{DbIdSet, DbRunner};
use crate::common::helpers::build_key;

const REVOCATION_KEY_LIST: &str = "revocation_list";
const REVOCATION_KEY_INDEX: &str = "revocation_index";

/// `Repository` persists status lists. Bit level serialization of allocation and
/// revocation happens in the revocation usecase, a save here always overwrites
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
        build_key(REVOCATION_KEY_INDEX, "all")
    }
}

#[async_trait]
impl RepoBuilder for Repository {
    async fn save_revocation_list(&self, list: &RevocationList) -> Result<(), IdentityError> {
        let _write = self.write.lock().await;

        self.db
            .save_value(build_key(REVOCATION_KEY_LIST, &list.profile_name()), list)
            .await?;

        let mut index = DbIdSet::load(&self.db, self.index_key()).await?;
        if index.insert(list.profile_name()) {
            index.store(&self.db, self.index_key()).await?;
        }

        Ok(())
    }

    async fn get_revocation_list(
        &self,
        name: String,
    ) -> Result<Option<RevocationList>, IdentityError> {
        let list: Option<RevocationList> = self
            .db
            .get_value(build_key(REVOCATION_KEY_LIST, &name))
            .await?;

        Ok(list)
    }

    async fn list_revocation_list_names(&self) -> Result<Vec<String>, IdentityError> {
        let index = DbIdSet::load(&self.db, self.index_key()).await?;
        Ok(index.ids())
    }
}
