use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

/// `RocksDBCommon` locates the database directory and the single column family used
/// by every repository
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct RocksDBCommon {
    pub(super) path: String,
    pub(super) cf_name: String,
}

impl RocksDBCommon {
    pub fn get(&self) -> (String, String) {
        (self.path.to_owned(), self.cf_name.to_owned())
    }
}

impl Default for RocksDBCommon {
    fn default() -> Self {
        Self {
            path: "./warden-db".to_string(),
            cf_name: "".to_string(),
        }
    }
}

impl ToValidate for RocksDBCommon {
    fn validate(&self) -> Result<(), CommonError> {
        if self.path.is_empty() {
            return Err(CommonError::ValidationError(
                "config: rocksdbcommon:path is missing".to_string(),
            ));
        }

        if self.cf_name.is_empty() {
            return Err(CommonError::ValidationError(
                "config: rocksdbcommon:cf_name is missing".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(crate = "self::serde")]
pub struct RocksDBOptions {
    pub(super) create_if_missing: bool,
    pub(super) create_missing_columns: bool,
    pub(super) set_error_if_exists: bool,
    pub(super) set_wal_dir: String,
}

impl RocksDBOptions {
    pub fn get_create_if_missing(&self) -> bool {
        self.create_if_missing
    }

    pub fn get_create_missing_columns(&self) -> bool {
        self.create_missing_columns
    }

    pub fn get_set_error_if_exists(&self) -> bool {
        self.set_error_if_exists
    }

    pub fn get_set_wal_dir(&self) -> String {
        self.set_wal_dir.to_owned()
    }
}

impl Default for RocksDBOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            create_missing_columns: true,
            set_error_if_exists: false,
            set_wal_dir: "".to_string(),
        }
    }
}

impl ToValidate for RocksDBOptions {
    fn validate(&self) -> Result<(), CommonError> {
        if self.set_wal_dir.is_empty() {
            return Err(CommonError::ValidationError(
                "config: rocksdboptions:wal_dir is missing".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct Storage {
    pub(super) common: RocksDBCommon,
    pub(super) db: RocksDBOptions,
}

impl Storage {
    pub fn common(&self) -> RocksDBCommon {
        self.common.to_owned()
    }

    pub fn options(&self) -> RocksDBOptions {
        self.db.to_owned()
    }
}

impl ToValidate for Storage {
    fn validate(&self) -> Result<(), CommonError> {
        self.common.validate()?;
        self.db.validate()
    }
}

/// `Database` holds the `[database.identity]` storage, the one wallets, credentials,
/// connections, callbacks and status lists share
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct Database {
    pub(super) identity: Storage,
}

impl Database {
    pub fn identity(&self) -> &Storage {
        &self.identity
    }
}

impl ToValidate for Database {
    fn validate(&self) -> Result<(), CommonError> {
        self.identity.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstdev_config::format::use_toml;
    use rstdev_config::parser::from_file;
    use rstdev_config::{types::ConfigError, Builder};

    use crate::common::helpers::{self, testdb};

    #[test]
    fn test_parse_database_config() -> Result<(), ConfigError> {
        let config_toml: Result<Database, ConfigError> =
            Builder::new(from_file(testdb::fixture_path("config_db.toml")))
                .fetch()?
                .parse(use_toml);

        assert!(!config_toml.is_err());

        let config_db = config_toml.unwrap();
        let (path, cf_name) = config_db.identity().common().get();
        assert_eq!(cf_name, "warden-cf");
        assert_eq!(path, "./warden-storage");

        let opts = config_db.identity().options();
        assert_eq!(opts.get_set_wal_dir(), "./warden-db-wal");
        assert!(opts.get_create_if_missing());
        assert!(opts.get_create_missing_columns());
        assert!(opts.get_set_error_if_exists());
        Ok(())
    }

    #[test]
    fn test_rocksdb_common_validation_failed() {
        let mut common_opts = RocksDBCommon::default();
        common_opts.path = "".to_string();

        let validation = helpers::validate(common_opts.clone());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("rocksdbcommon:path"));

        common_opts.path = "path".to_string();
        let validation = helpers::validate(common_opts);
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("rocksdbcommon:cf_name"))
    }

    #[test]
    fn test_rocksdb_options_validation_failed() {
        let validation = helpers::validate(RocksDBOptions::default());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("rocksdboptions:wal_dir"));
    }

    #[test]
    fn test_database_validation_failed() {
        let validation = helpers::validate(Database::default());
        assert!(matches!(
            validation.unwrap_err(),
            CommonError::ValidationError(_)
        ));
    }
}
