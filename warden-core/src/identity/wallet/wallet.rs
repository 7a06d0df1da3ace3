use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::standard::uuid::Uuid;

use crate::agent::types::{AgentAuth, SubIdentity};
use crate::identity::types::IdentityError;

/// `AgentKeys` is the key triple the agent issued for a managed sub-wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct AgentKeys {
    pub wallet_id: String,
    pub wallet_key: String,
    pub token: String,
}

impl From<SubIdentity> for AgentKeys {
    fn from(value: SubIdentity) -> Self {
        Self {
            wallet_id: value.wallet_id,
            wallet_key: value.wallet_key,
            token: value.token,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum WalletKind {
    Base,
    Managed,
    SelfManaged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Wallet {
    id: String,
    bpn: String,
    did: String,
    name: String,
    verification_key: Option<String>,
    revocation_list_name: String,
    pending_membership_issuance: bool,
    base: bool,
    keys: Option<AgentKeys>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Wallet {
    /// `new_base` builds the platform's own wallet, authenticated with the agent admin key
    pub fn new_base(name: String, bpn: String, did: String, verkey: String) -> Self {
        let mut wallet = Self::build(name, bpn, did);
        wallet.base = true;
        wallet.verification_key = Some(verkey);
        wallet
    }

    pub fn new_managed(
        name: String,
        bpn: String,
        did: String,
        verkey: String,
        keys: AgentKeys,
    ) -> Self {
        let mut wallet = Self::build(name, bpn, did);
        wallet.verification_key = Some(verkey);
        wallet.keys = Some(keys);
        wallet
    }

    /// a self-managed wallet holds its keys outside the platform, nothing is pending
    /// because its credentials travel through the protocol
    pub fn new_self_managed(name: String, bpn: String, did: String) -> Self {
        let mut wallet = Self::build(name, bpn, did);
        wallet.pending_membership_issuance = false;
        wallet
    }

    fn build(name: String, bpn: String, did: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            revocation_list_name: bpn.clone(),
            bpn,
            did,
            name,
            verification_key: None,
            pending_membership_issuance: true,
            base: false,
            keys: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> String {
        self.id.to_owned()
    }

    pub fn bpn(&self) -> String {
        self.bpn.to_owned()
    }

    pub fn did(&self) -> String {
        self.did.to_owned()
    }

    pub fn name(&self) -> String {
        self.name.to_owned()
    }

    pub fn verification_key(&self) -> Option<String> {
        self.verification_key.to_owned()
    }

    pub fn revocation_list_name(&self) -> String {
        self.revocation_list_name.to_owned()
    }

    pub fn keys(&self) -> Option<AgentKeys> {
        self.keys.to_owned()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_pending_membership_issuance(&self) -> bool {
        self.pending_membership_issuance
    }

    pub fn set_membership_issued(&mut self) {
        self.pending_membership_issuance = false;
        self.updated_at = Utc::now();
    }

    /// true iff the agent holds a key triple for this wallet
    pub fn is_managed(&self) -> bool {
        self.keys.is_some()
    }

    pub fn kind(&self) -> WalletKind {
        if self.base {
            return WalletKind::Base;
        }

        match self.keys {
            Some(_) => WalletKind::Managed,
            None => WalletKind::SelfManaged,
        }
    }

    /// `agent_auth` derives the agent credentials used to act on behalf of this wallet
    pub fn agent_auth(&self) -> Result<AgentAuth, IdentityError> {
        match (self.kind(), self.keys.as_ref()) {
            (WalletKind::Base, _) => Ok(AgentAuth::Base),
            (WalletKind::Managed, Some(keys)) => Ok(AgentAuth::Tenant {
                wallet_id: keys.wallet_id.to_owned(),
                token: keys.token.to_owned(),
            }),
            _ => Err(IdentityError::ValidationError(format!(
                "wallet {} is self managed, its keys are not held by the platform",
                self.bpn
            ))),
        }
    }
}

impl TryInto<Vec<u8>> for Wallet {
    type Error = IdentityError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for Wallet {
    type Error = IdentityError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> AgentKeys {
        AgentKeys {
            wallet_id: "wallet-id".to_string(),
            wallet_key: "wallet-key".to_string(),
            token: "token".to_string(),
        }
    }

    #[test]
    fn test_wallet_kinds() {
        let base = Wallet::new_base(
            "Operator".to_string(),
            "BPNL0".to_string(),
            "did:sov:base".to_string(),
            "verkey".to_string(),
        );
        assert_eq!(base.kind(), WalletKind::Base);
        assert_eq!(base.agent_auth().unwrap(), AgentAuth::Base);
        assert!(!base.is_managed());

        let managed = Wallet::new_managed(
            "Tenant".to_string(),
            "BPNL1".to_string(),
            "did:sov:tenant".to_string(),
            "verkey".to_string(),
            keys(),
        );
        assert_eq!(managed.kind(), WalletKind::Managed);
        assert!(managed.is_managed());
        assert!(managed.is_pending_membership_issuance());
        assert_eq!(managed.revocation_list_name(), "BPNL1".to_string());
        assert_eq!(
            managed.agent_auth().unwrap(),
            AgentAuth::Tenant {
                wallet_id: "wallet-id".to_string(),
                token: "token".to_string()
            }
        );

        let external = Wallet::new_self_managed(
            "External".to_string(),
            "BPNL2".to_string(),
            "did:web:external".to_string(),
        );
        assert_eq!(external.kind(), WalletKind::SelfManaged);
        assert!(!external.is_pending_membership_issuance());
        assert!(external.agent_auth().is_err());
    }
}
