use rst_common::standard::serde_json::json;
use rst_common::with_errors::thiserror::{self, Error};
use rst_common::with_http_tokio::axum::http::StatusCode;
use rst_common::with_http_tokio::axum::response::{IntoResponse, Response};
use rst_common::with_http_tokio::axum::Json;
use rst_common::with_logging::log::error;

use prople_warden_core::identity::types::{ErrorKind, IdentityError};

#[derive(Debug, Error)]
pub enum WardenError {
    #[error("rpc error: {0}")]
    RpcError(String),

    #[error("server error: {0}")]
    ServerError(String),

    #[error(transparent)]
    IdentityError(#[from] IdentityError),
}

impl WardenError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WardenError::IdentityError(err) => match err.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::VerificationFailed => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::UpstreamFailure => StatusCode::BAD_GATEWAY,
                ErrorKind::AsyncTaskFailure | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WardenError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("[wardend:response] {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prople_warden_core::identity::types::VerificationFailure;

    #[test]
    fn test_status_code_by_kind() {
        let table = vec![
            (IdentityError::ValidationError("bpn".to_string()), StatusCode::BAD_REQUEST),
            (IdentityError::Conflict("bpn".to_string()), StatusCode::CONFLICT),
            (IdentityError::NotFound("list".to_string()), StatusCode::NOT_FOUND),
            (
                IdentityError::Verification(VerificationFailure::MissingProof),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (IdentityError::Upstream("agent".to_string()), StatusCode::BAD_GATEWAY),
            (IdentityError::RepoError("db".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (input, expected) in table {
            let err = WardenError::from(input);
            assert_eq!(err.status_code(), expected);
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_server_error_status() {
        let err = WardenError::ServerError("bind".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
