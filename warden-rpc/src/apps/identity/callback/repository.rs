use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_tokio::tokio::sync::Mutex;
use rstdev_storage::engine::rocksdb::db::DB;

use prople_warden_core::identity::callback::types::RepoBuilder;
use prople_warden_core::identity::callback::PendingCallback;
use prople_warden_core::identity::types::IdentityError;

use crate::apps::{DbIdSet, DbRunner};
use crate::common::helpers::build_key;

const CALLBACK_KEY_THREAD: &str = "callback_thread";
const CALLBACK_KEY_INDEX: &str = "callback_index";

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
        build_key(CALLBACK_KEY_INDEX, "all")
    }
}

#[async_trait]
impl RepoBuilder for Repository {
    async fn save_callback(&self, callback: &PendingCallback) -> Result<(), IdentityError> {
        let _write = self.write.lock().await;

        self.db
            .save_value(build_key(CALLBACK_KEY_THREAD, &callback.thread_id()), callback)
            .await?;

        let mut index = DbIdSet::load(&self.db, self.index_key()).await?;
        if index.insert(callback.thread_id()) {
            index.store(&self.db, self.index_key()).await?;
        }

        Ok(())
    }

    async fn get_callback(
        &self,
        thread_id: String,
    ) -> Result<Option<PendingCallback>, IdentityError> {
        let callback: Option<PendingCallback> = self
            .db
            .get_value(build_key(CALLBACK_KEY_THREAD, &thread_id))
            .await?;

        Ok(callback)
    }

    async fn list_callbacks(&self) -> Result<Vec<PendingCallback>, IdentityError> {
        let index = DbIdSet::load(&self.db, self.index_key()).await?;
        let keys = index
            .ids()
            .iter()
            .map(|thread_id| build_key(CALLBACK_KEY_THREAD, thread_id))
            .collect();

        let callbacks: Vec<PendingCallback> = self.db.get_values(keys).await?;
        Ok(callbacks)
    }

    async fn remove_callback(&self, thread_id: String) -> Result<(), IdentityError> {
        let _write = self.write.lock().await;

        self.db
            .remove(build_key(CALLBACK_KEY_THREAD, &thread_id))
            .await?;

        let mut index = DbIdSet::load(&self.db, self.index_key()).await?;
        if index.remove(&thread_id) {
            index.store(&self.db, self.index_key()).await?;
        }

        Ok(())
    }
}
