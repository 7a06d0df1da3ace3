use rst_common::standard::serde::de::DeserializeOwned;
use rst_common::standard::serde::Serialize;
use rst_common::standard::serde_json;
use rst_common::with_tokio::tokio::task::spawn_blocking;

use rstdev_storage::engine::rocksdb::db::DB;
use rstdev_storage::types::Storage;

use crate::apps::types::AppError;

use super::types::{Instruction, OutputOpts};

/// `Runner` executes storage instructions against the configured column family.
///
/// RocksDB calls are blocking, every instruction runs through `spawn_blocking`.
#[derive(Clone)]
pub struct Runner<TStorage>
where
    TStorage: Storage<Instance = DB>,
{
    instance: TStorage,
    cf_name: String,
}

impl<TStorage> Runner<TStorage>
where
    TStorage: Storage<Instance = DB>,
{
    pub fn new(instance: TStorage, cf_name: String) -> Self {
        Self { instance, cf_name }
    }

    pub fn cf_name(&self) -> String {
        self.cf_name.to_owned()
    }
}

impl Runner<DB> {
    pub async fn exec(&self, instruction: Instruction) -> Result<OutputOpts, AppError> {
        let instance = self.instance.clone().get_instance();

        let db_instance = instance
            .db
            .clone()
            .ok_or(AppError::DbError("db instance is missing".to_string()))?;

        let cf_def = self.cf_name();

        match instruction {
            Instruction::SaveCf { key, value } => {
                spawn_blocking(move || {
                    let cf = db_instance
                        .cf_handle(cf_def.as_str())
                        .map(|val| val.to_owned())
                        .ok_or(AppError::DbError("cf handler failed".to_string()))?;

                    db_instance
                        .put_cf(cf, key, value)
                        .map_err(|err| AppError::DbError(err.to_string()))
                })
                .await
                .map_err(|err| AppError::DbError(err.to_string()))??;

                Ok(OutputOpts::None)
            }
            Instruction::GetCf { key } => {
                let value = spawn_blocking(move || {
                    let cf = db_instance
                        .cf_handle(cf_def.as_str())
                        .map(|val| val.to_owned())
                        .ok_or(AppError::DbError("cf handler failed".to_string()))?;

                    db_instance
                        .get_cf(cf, key)
                        .map_err(|err| AppError::DbError(err.to_string()))
                })
                .await
                .map_err(|err| AppError::DbError(err.to_string()))??;

                Ok(OutputOpts::SingleByte { value })
            }
            Instruction::MultiGetCf { keys } => {
                let values = spawn_blocking(move || {
                    let cf = db_instance
                        .cf_handle(cf_def.as_str())
                        .map(|val| val.to_owned())
                        .ok_or(AppError::DbError("cf handler failed".to_string()))?;

                    let cf_keys = keys.iter().map(|val| (cf, val));
                    Ok::<_, AppError>(db_instance.multi_get_cf(cf_keys))
                })
                .await
                .map_err(|err| AppError::DbError(err.to_string()))??
                .into_iter()
                .map(|val| val.map_err(|err| AppError::DbError(err.to_string())))
                .collect();

                Ok(OutputOpts::MultiBytes { values })
            }
            Instruction::RemoveCf { key } => {
                spawn_blocking(move || {
                    let cf = db_instance
                        .cf_handle(cf_def.as_str())
                        .map(|val| val.to_owned())
                        .ok_or(AppError::DbError("cf handler failed".to_string()))?;

                    db_instance
                        .delete_cf(cf, key)
                        .map_err(|err| AppError::DbError(err.to_string()))
                })
                .await
                .map_err(|err| AppError::DbError(err.to_string()))??;

                Ok(OutputOpts::None)
            }
        }
    }

    pub async fn get_value<T: DeserializeOwned>(&self, key: String) -> Result<Option<T>, AppError> {
        let output = self.exec(Instruction::GetCf { key }).await?;
        output
            .single()
            .map(|bytes| {
                serde_json::from_slice(&bytes).map_err(|err| AppError::CodecError(err.to_string()))
            })
            .transpose()
    }

    pub async fn get_values<T: DeserializeOwned>(
        &self,
        keys: Vec<String>,
    ) -> Result<Vec<T>, AppError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let output = self.exec(Instruction::MultiGetCf { keys }).await?;
        output
            .multi()?
            .iter()
            .map(|bytes| {
                serde_json::from_slice(bytes).map_err(|err| AppError::CodecError(err.to_string()))
            })
            .collect()
    }

    pub async fn save_value<T: Serialize>(&self, key: String, value: &T) -> Result<(), AppError> {
        let bytes =
            serde_json::to_vec(value).map_err(|err| AppError::CodecError(err.to_string()))?;

        self.exec(Instruction::SaveCf { key, value: bytes })
            .await
            .map(|_| ())
    }

    pub async fn remove(&self, key: String) -> Result<(), AppError> {
        self.exec(Instruction::RemoveCf { key }).await.map(|_| ())
    }
}
