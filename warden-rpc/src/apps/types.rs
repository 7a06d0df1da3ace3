use rst_common::with_errors::thiserror::{self, Error};

use prople_warden_core::identity::types::IdentityError;

#[derive(Debug, Error, PartialEq)]
pub enum AppError {
    #[error("dberror: {0}")]
    DbError(String),

    #[error("codec error: {0}")]
    CodecError(String),
}

impl From<AppError> for IdentityError {
    fn from(value: AppError) -> Self {
        IdentityError::RepoError(value.to_string())
    }
}
