use rst_common::with_errors::thiserror::{self, Error};

/// `ErrorKind` classifies every [`IdentityError`] into the error taxonomy used by
/// the outer surfaces (HTTP status mapping, retry decisions)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Conflict,
    NotFound,
    VerificationFailed,
    UpstreamFailure,
    AsyncTaskFailure,
    Internal,
}

/// `VerificationFailure` names the specific reason a credential or a presentation
/// has been rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerificationFailure {
    #[error("proof was missing")]
    MissingProof,

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("credential revoked: {0}")]
    Revoked(String),

    #[error("issuer mismatch: {0}")]
    IssuerMismatch(String),

    #[error("invalid status field {field}: {reason}")]
    InvalidStatusField { field: String, reason: String },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentityError {
    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no verification method: {0}")]
    NoVerificationMethod(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("verification failed: {0}")]
    Verification(#[from] VerificationFailure),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("async task error: {0}")]
    AsyncTask(String),

    #[error("repo error: {0}")]
    RepoError(String),

    #[error("json error: {0}")]
    JSONError(String),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::ValidationError(_) | IdentityError::NoVerificationMethod(_) => {
                ErrorKind::InvalidInput
            }
            IdentityError::Verification(VerificationFailure::InvalidStatusField { .. }) => {
                ErrorKind::InvalidInput
            }
            IdentityError::Verification(_) => ErrorKind::VerificationFailed,
            IdentityError::Conflict(_) => ErrorKind::Conflict,
            IdentityError::NotFound(_) => ErrorKind::NotFound,
            IdentityError::SigningFailed(_) | IdentityError::Upstream(_) => {
                ErrorKind::UpstreamFailure
            }
            IdentityError::AsyncTask(_) => ErrorKind::AsyncTaskFailure,
            IdentityError::RepoError(_) | IdentityError::JSONError(_) => ErrorKind::Internal,
        }
    }

    /// `verification_failure` returns the verification cause if this error is a rejection
    /// of a verified document
    pub fn verification_failure(&self) -> Option<VerificationFailure> {
        match self {
            IdentityError::Verification(failure) => Some(failure.to_owned()),
            _ => None,
        }
    }
}

/// `Transition` is the outcome of applying a protocol event to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// the state changed, side effects were (or will be) triggered
    Applied,

    /// the record already sits in the incoming state
    Replayed,

    /// the record is terminal, or the event would move it backward, or the state is unknown
    Ignored,

    /// a side effect failed, the record was left untouched so a redelivery can retry it
    Deferred,
}

/// `Context` carries the platform level settings threaded through the usecases
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    base_bpn: String,
    base_name: String,
    status_list_base_url: String,
    membership_organization: String,
    credential_validity_days: i64,
}

impl Context {
    pub fn new(
        base_bpn: String,
        base_name: String,
        status_list_base_url: String,
        membership_organization: String,
        credential_validity_days: i64,
    ) -> Self {
        Self {
            base_bpn,
            base_name,
            status_list_base_url: status_list_base_url.trim_end_matches('/').to_string(),
            membership_organization,
            credential_validity_days,
        }
    }

    pub fn base_bpn(&self) -> String {
        self.base_bpn.to_owned()
    }

    pub fn base_name(&self) -> String {
        self.base_name.to_owned()
    }

    pub fn membership_organization(&self) -> String {
        self.membership_organization.to_owned()
    }

    pub fn credential_validity_days(&self) -> i64 {
        self.credential_validity_days
    }

    pub fn status_list_base_url(&self) -> String {
        self.status_list_base_url.to_owned()
    }

    pub fn status_list_url(&self, list_name: &str) -> String {
        format!("{}/{}", self.status_list_base_url, list_name)
    }

    /// `local_list_name` returns the list name when the given url is served by this platform
    pub fn local_list_name(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.status_list_base_url);
        url.strip_prefix(prefix.as_str())
            .map(|name| name.trim_end_matches('/').to_string())
            .filter(|name| !name.is_empty() && !name.contains('/'))
    }
}

/// `Identifier` is the resolved form of a wallet identifier, either a `DID` or a `BPN`
#[derive(Debug, Clone, PartialEq)]
pub enum Identifier {
    Did(String),
    Bpn(String),
}

impl Identifier {
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        let value = input.trim();
        if value.is_empty() {
            return Err(IdentityError::ValidationError(
                "identifier was missing".to_string(),
            ));
        }

        if value.starts_with("did:") {
            let _ = validate_did(value)?;
            return Ok(Identifier::Did(value.to_string()));
        }

        Ok(Identifier::Bpn(value.to_string()))
    }
}

/// `validate_did` checks the `did:<method>:<method-specific-id>` shape
pub fn validate_did(did: &str) -> Result<(), IdentityError> {
    let parts: Vec<&str> = did.splitn(3, ':').collect();
    if parts.len() != 3 || parts[0] != "did" {
        return Err(IdentityError::ValidationError(format!(
            "malformed did: {did}"
        )));
    }

    let method_valid = !parts[1].is_empty()
        && parts[1]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

    if !method_valid || parts[2].is_empty() {
        return Err(IdentityError::ValidationError(format!(
            "malformed did: {did}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_test::table_test;

    #[test]
    fn test_parse_identifier() {
        let table = vec![
            ("did:web:localhost:BPNL000", Identifier::Did("did:web:localhost:BPNL000".to_string())),
            ("did:sov:WgWxqztrNooG92RXvxSTWv", Identifier::Did("did:sov:WgWxqztrNooG92RXvxSTWv".to_string())),
            ("BPNL000000000001", Identifier::Bpn("BPNL000000000001".to_string())),
            (" BPNL000000000002 ", Identifier::Bpn("BPNL000000000002".to_string())),
        ];

        for (validator, input, expected) in table_test!(table) {
            let identifier = Identifier::parse(input);
            assert!(!identifier.is_err());

            validator
                .given(input)
                .when("parse identifier")
                .then("resolve identifier kind")
                .assert_eq(expected, identifier.unwrap());
        }
    }

    #[test]
    fn test_parse_malformed_did() {
        let inputs = vec!["did:", "did::abc", "did:web:", "did:WEB:abc", ""];
        for input in inputs {
            let identifier = Identifier::parse(input);
            assert!(identifier.is_err());
            assert_eq!(identifier.unwrap_err().kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_error_kind() {
        let table = vec![
            (IdentityError::NoVerificationMethod("did".to_string()), ErrorKind::InvalidInput),
            (
                IdentityError::Verification(VerificationFailure::InvalidStatusField {
                    field: "statusPurpose".to_string(),
                    reason: "unknown".to_string(),
                }),
                ErrorKind::InvalidInput,
            ),
            (
                IdentityError::Verification(VerificationFailure::Revoked("0".to_string())),
                ErrorKind::VerificationFailed,
            ),
            (IdentityError::SigningFailed("err".to_string()), ErrorKind::UpstreamFailure),
            (IdentityError::Conflict("bpn".to_string()), ErrorKind::Conflict),
            (IdentityError::AsyncTask("task".to_string()), ErrorKind::AsyncTaskFailure),
        ];

        for (validator, input, expected) in table_test!(table) {
            validator
                .given(&format!("{:?}", input))
                .when("classify error")
                .then("map into taxonomy")
                .assert_eq(expected, input.kind());
        }
    }

    #[test]
    fn test_context_local_list_name() {
        let ctx = Context::new(
            "BPNL000000000000".to_string(),
            "Operator".to_string(),
            "https://warden.example/status/".to_string(),
            "Catena-X".to_string(),
            365,
        );

        assert_eq!(
            ctx.status_list_url("BPNL1"),
            "https://warden.example/status/BPNL1".to_string()
        );
        assert_eq!(
            ctx.local_list_name("https://warden.example/status/BPNL1"),
            Some("BPNL1".to_string())
        );
        assert_eq!(ctx.local_list_name("https://other.example/status/BPNL1"), None);
        assert_eq!(ctx.local_list_name("https://warden.example/status/"), None);
    }
}
