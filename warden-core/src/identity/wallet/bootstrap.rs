use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{DateTime, Duration, Utc};
use rst_common::standard::serde_json::{json, Value};
use rst_common::with_logging::log::{debug, info};

use crate::identity::types::{Context, IdentityError};
use crate::identity::verifiable::credential::types::{CredentialAPI, IssueParams};
use crate::locks::KeyedLock;

use super::types::{BootstrapAPI, RepoBuilder};
use super::{Wallet, WalletKind};

pub const MEMBERSHIP_CREDENTIAL_TYPE: &str = "MembershipCredential";
pub const BPN_CREDENTIAL_TYPE: &str = "BpnCredential";
pub const MEMBERSHIP_STATUS_ACTIVE: &str = "Active";

/// `Bootstrap` issues the default credentials of a wallet from the base wallet.
///
/// Both triggers (wallet creation, first completed connection) end up here, the
/// per wallet lock and the pending flag make sure only the first one does the work.
pub struct Bootstrap<TRepo, TCredential>
where
    TRepo: RepoBuilder + Send + Sync,
    TCredential: CredentialAPI,
{
    repo: Arc<TRepo>,
    credentials: Arc<TCredential>,
    locks: KeyedLock,
    ctx: Context,
}

impl<TRepo, TCredential> Clone for Bootstrap<TRepo, TCredential>
where
    TRepo: RepoBuilder + Send + Sync,
    TCredential: CredentialAPI,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            credentials: self.credentials.clone(),
            locks: self.locks.clone(),
            ctx: self.ctx.clone(),
        }
    }
}

impl<TRepo, TCredential> Bootstrap<TRepo, TCredential>
where
    TRepo: RepoBuilder + Send + Sync,
    TCredential: CredentialAPI,
{
    pub fn new(repo: Arc<TRepo>, credentials: Arc<TCredential>, ctx: Context) -> Self {
        Self {
            repo,
            credentials,
            locks: KeyedLock::new(),
            ctx,
        }
    }

    fn expiration(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.ctx.credential_validity_days() {
            days if days > 0 => Some(now + Duration::days(days)),
            _ => None,
        }
    }

    /// issue one default credential unless a previous partial run already did
    async fn issue_once(
        &self,
        wallet: &Wallet,
        credential_type: &str,
        claims: Value,
        now: DateTime<Utc>,
    ) -> Result<(), IdentityError> {
        let existing = self
            .credentials
            .list_credentials(wallet.did(), Some(credential_type.to_string()))
            .await?;

        if !existing.is_empty() {
            debug!(
                "[bootstrap:issue_once] wallet: {} | {credential_type} already held",
                wallet.bpn()
            );
            return Ok(());
        }

        let _ = self
            .credentials
            .issue_credential(IssueParams {
                issuer: self.ctx.base_bpn(),
                holder: Some(wallet.did()),
                credential_type: credential_type.to_string(),
                claims,
                issuance_date: Some(now),
                expiration_date: self.expiration(now),
                revocable: true,
            })
            .await?;

        Ok(())
    }
}

#[async_trait]
impl<TRepo, TCredential> BootstrapAPI for Bootstrap<TRepo, TCredential>
where
    TRepo: RepoBuilder + Send + Sync,
    TCredential: CredentialAPI,
{
    async fn issue_default_credentials(&self, bpn: String) -> Result<bool, IdentityError> {
        let _guard = self.locks.lock(&bpn).await;

        let wallet = self
            .repo
            .get_wallet_by_bpn(bpn.clone())
            .await?
            .ok_or(IdentityError::NotFound(format!("wallet {bpn}")))?;

        if wallet.kind() == WalletKind::SelfManaged || !wallet.is_pending_membership_issuance() {
            debug!("[bootstrap:issue_default_credentials] wallet: {bpn} | nothing pending");
            return Ok(false);
        }

        let now = Utc::now();
        self.issue_once(
            &wallet,
            MEMBERSHIP_CREDENTIAL_TYPE,
            json!({
                "holderIdentifier": wallet.bpn(),
                "memberOf": self.ctx.membership_organization(),
                "status": MEMBERSHIP_STATUS_ACTIVE,
                "startTime": now.to_rfc3339(),
            }),
            now,
        )
        .await?;

        self.issue_once(&wallet, BPN_CREDENTIAL_TYPE, json!({"bpn": wallet.bpn()}), now)
            .await?;

        let mut updated = wallet;
        updated.set_membership_issued();
        self.repo.update_wallet(&updated).await?;

        info!("[bootstrap:issue_default_credentials] wallet: {bpn} | default credentials issued");
        Ok(true)
    }
}
