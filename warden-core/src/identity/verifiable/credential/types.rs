use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde_json::Value;

use crate::identity::types::IdentityError;
use crate::identity::verifiable::vc::VerifiableCredential;

use super::Credential;

/// `IssueParams` carries everything needed to build a credential
#[derive(Debug, Clone, PartialEq)]
pub struct IssueParams {
    pub issuer: String,
    pub holder: Option<String>,
    pub credential_type: String,
    pub claims: Value,
    pub issuance_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub revocable: bool,
}

/// `RepoBuilder` persists [`Credential`] records, a duplicate credential id must be
/// rejected with [`IdentityError::Conflict`]
#[async_trait]
pub trait RepoBuilder {
    async fn save_credential(&self, credential: &Credential) -> Result<(), IdentityError>;

    async fn get_credential(&self, id: String) -> Result<Option<Credential>, IdentityError>;

    async fn list_credentials_by_holder(
        &self,
        holder_did: String,
    ) -> Result<Vec<Credential>, IdentityError>;

    async fn remove_credentials_by_holder(&self, holder_did: String)
        -> Result<usize, IdentityError>;
}

#[async_trait]
pub trait CredentialAPI: Send + Sync {
    /// `prepare_credential` builds the unsigned document, allocating a status entry when
    /// the credential is revocable
    async fn prepare_credential(
        &self,
        params: IssueParams,
    ) -> Result<VerifiableCredential, IdentityError>;

    /// `issue_credential` signs a prepared credential with the issuer key and stores it
    /// into the holder wallet when that wallet is custodied by the platform
    async fn issue_credential(
        &self,
        params: IssueParams,
    ) -> Result<VerifiableCredential, IdentityError>;

    /// `store_credential` accepts a signed credential into a holder wallet, the subject
    /// must be the wallet itself. The document is stored as given
    async fn store_credential(
        &self,
        holder_identifier: String,
        credential: Value,
    ) -> Result<Credential, IdentityError>;

    async fn list_credentials(
        &self,
        holder_identifier: String,
        type_filter: Option<String>,
    ) -> Result<Vec<Credential>, IdentityError>;

    async fn revoke_credential(
        &self,
        issuer_identifier: String,
        credential_id: String,
    ) -> Result<(), IdentityError>;
}
