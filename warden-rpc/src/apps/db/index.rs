use std::collections::BTreeSet;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rstdev_storage::engine::rocksdb::db::DB;

use crate::apps::types::AppError;

use super::Runner;

/// `IdSet` is a secondary index stored under a single key, a sorted set of entity ids
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(crate = "self::serde")]
pub struct IdSet {
    ids: BTreeSet<String>,
}

impl IdSet {
    pub async fn load(db: &Runner<DB>, key: String) -> Result<Self, AppError> {
        let set: Option<IdSet> = db.get_value(key).await?;
        Ok(set.unwrap_or_default())
    }

    pub async fn store(&self, db: &Runner<DB>, key: String) -> Result<(), AppError> {
        if self.is_empty() {
            return db.remove(key).await;
        }

        db.save_value(key, self).await
    }

    /// returns false when the id was already indexed
    pub fn insert(&mut self, id: String) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
