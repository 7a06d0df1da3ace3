use rst_common::with_errors::thiserror::{self, Error};

use prople_warden_core::identity::types::IdentityError;

#[derive(Debug, PartialEq, Error)]
pub enum CommonError {
    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("db error: {0}")]
    DbError(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("rpc error: {0}")]
    RpcError(String),
}

impl From<CommonError> for IdentityError {
    fn from(value: CommonError) -> Self {
        match value {
            CommonError::ValidationError(msg) => IdentityError::ValidationError(msg),
            CommonError::RpcError(msg) => IdentityError::Upstream(msg),
            CommonError::DbError(msg) | CommonError::ConfigError(msg) => {
                IdentityError::RepoError(msg)
            }
        }
    }
}

pub trait ToValidate {
    fn validate(&self) -> Result<(), CommonError>;
}
