use rst_common::standard::async_trait::async_trait;

use crate::identity::types::{IdentityError, Identifier};

use super::Wallet;

/// `RepoBuilder` persists [`Wallet`] records. `save_wallet` must reject a duplicate
/// `bpn` or `did` with [`IdentityError::Conflict`]
#[async_trait]
pub trait RepoBuilder {
    async fn save_wallet(&self, wallet: &Wallet) -> Result<(), IdentityError>;
    async fn update_wallet(&self, wallet: &Wallet) -> Result<(), IdentityError>;
    async fn remove_wallet(&self, bpn: String) -> Result<(), IdentityError>;

    async fn get_wallet_by_bpn(&self, bpn: String) -> Result<Option<Wallet>, IdentityError>;
    async fn get_wallet_by_did(&self, did: String) -> Result<Option<Wallet>, IdentityError>;

    /// lookup by the agent side sub-wallet id carried by webhook deliveries
    async fn get_wallet_by_agent_id(
        &self,
        wallet_id: String,
    ) -> Result<Option<Wallet>, IdentityError>;

    async fn list_wallets(&self) -> Result<Vec<Wallet>, IdentityError>;
}

#[async_trait]
pub trait WalletAPI: Send + Sync {
    /// `create_wallet` provisions a platform managed wallet, the default credentials are
    /// issued in background after the wallet has been returned
    async fn create_wallet(&self, name: String, bpn: String) -> Result<Wallet, IdentityError>;

    /// `ensure_base_wallet` provisions the platform's own wallet once
    async fn ensure_base_wallet(&self) -> Result<Wallet, IdentityError>;

    async fn register_self_managed_wallet(
        &self,
        name: String,
        bpn: String,
        did: String,
        callback_url: Option<String>,
    ) -> Result<Wallet, IdentityError>;

    async fn delete_wallet(&self, identifier: String) -> Result<(), IdentityError>;

    async fn get_wallet(&self, identifier: String) -> Result<Wallet, IdentityError>;

    async fn list_wallets(&self) -> Result<Vec<Wallet>, IdentityError>;

    async fn update_service_endpoint(
        &self,
        identifier: String,
        endpoint: String,
    ) -> Result<(), IdentityError>;
}

/// `BootstrapAPI` issues the default credentials of a freshly provisioned wallet
#[async_trait]
pub trait BootstrapAPI: Send + Sync {
    /// returns `true` when the credentials were issued by this call, `false` when there was
    /// nothing pending anymore
    async fn issue_default_credentials(&self, bpn: String) -> Result<bool, IdentityError>;
}

/// `resolve_wallet` resolves a `BPN` or a `DID` into its [`Wallet`]
pub async fn resolve_wallet<TRepo>(repo: &TRepo, identifier: &str) -> Result<Wallet, IdentityError>
where
    TRepo: RepoBuilder + Send + Sync + ?Sized,
{
    let wallet = match Identifier::parse(identifier)? {
        Identifier::Did(did) => repo.get_wallet_by_did(did).await?,
        Identifier::Bpn(bpn) => repo.get_wallet_by_bpn(bpn).await?,
    };

    wallet.ok_or(IdentityError::NotFound(format!(
        "wallet {}",
        identifier.trim()
    )))
}
