use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_tokio::tokio::sync::Mutex;
use rstdev_storage::engine::rocksdb::db::DB;

use prople_warden_core::identity::connection::types::RepoBuilder;
use prople_warden_core::identity::connection::Connection;
use prople_warden_core::identity::types::IdentityError;

use crate::apps::{DbIdSet, DbRunner};
use crate::common::helpers::build_key;

const CONNECTION_KEY_ID: &str = "connection_id";
const CONNECTION_KEY_DID: &str = "connection_did";

/// `Repository` indexes every connection under both of its ends, the owner did and
/// the counterpart did once the agent reported it
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

    async fn index(&self, did: &str, connection_id: String) -> Result<(), IdentityError> {
        let key = build_key(CONNECTION_KEY_DID, did);
        let mut set = DbIdSet::load(&self.db, key.clone()).await?;
        if set.insert(connection_id) {
            set.store(&self.db, key).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl RepoBuilder for Repository {
    async fn save_connection(&self, connection: &Connection) -> Result<(), IdentityError> {
        let _write = self.write.lock().await;

        self.db
            .save_value(
                build_key(CONNECTION_KEY_ID, &connection.connection_id()),
                connection,
            )
            .await?;

        self.index(&connection.owner_did(), connection.connection_id())
            .await?;

        if let Some(target) = connection.target_did() {
            self.index(&target, connection.connection_id()).await?;
        }

        Ok(())
    }

    async fn get_connection(
        &self,
        connection_id: String,
    ) -> Result<Option<Connection>, IdentityError> {
        let connection: Option<Connection> = self
            .db
            .get_value(build_key(CONNECTION_KEY_ID, &connection_id))
            .await?;

        Ok(connection)
    }

    async fn list_connections_by_did(
        &self,
        did: String,
    ) -> Result<Vec<Connection>, IdentityError> {
        let set = DbIdSet::load(&self.db, build_key(CONNECTION_KEY_DID, &did)).await?;
        let keys = set
            .ids()
            .iter()
            .map(|id| build_key(CONNECTION_KEY_ID, id))
            .collect();

        let connections: Vec<Connection> = self.db.get_values(keys).await?;
        Ok(connections
            .into_iter()
            .filter(|connection| connection.involves(&did))
            .collect())
    }

    async fn remove_connections_by_did(&self, did: String) -> Result<usize, IdentityError> {
        let _write = self.write.lock().await;

        let connections = self.list_connections_by_did(did.clone()).await?;
        for connection in connections.iter() {
            self.db
                .remove(build_key(CONNECTION_KEY_ID, &connection.connection_id()))
                .await?;

            let other_end = if connection.owner_did() == did {
                connection.target_did()
            } else {
                Some(connection.owner_did())
            };

            if let Some(other) = other_end {
                let key = build_key(CONNECTION_KEY_DID, &other);
                let mut set = DbIdSet::load(&self.db, key.clone()).await?;
                set.remove(&connection.connection_id());
                set.store(&self.db, key).await?;
            }
        }

        self.db.remove(build_key(CONNECTION_KEY_DID, &did)).await?;
        Ok(connections.len())
    }
}
