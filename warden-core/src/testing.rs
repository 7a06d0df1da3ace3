use std::collections::HashMap;

use mockall::mock;
use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{json, Value};
use rst_common::with_tokio::tokio::sync::Mutex;

use crate::agent::types::{
    AgentAuth, AgentBuilder, AgentError, ConnectionRecord, DidDocument, DidInfo, ExchangeRecord,
    SignRequest, SignResponse, SubIdentity, VerificationMethod,
};
use crate::bpdm::BpdmBuilder;
use crate::identity::callback::types::{
    CallbackPayload, NotifierBuilder, RepoBuilder as CallbackRepoBuilder,
};
use crate::identity::callback::PendingCallback;
use crate::identity::connection::types::{
    ConnectionAPI, ConnectionEvent, RepoBuilder as ConnectionRepoBuilder,
};
use crate::identity::connection::Connection;
use crate::identity::revocation::types::{
    RPCBuilder, RepoBuilder as RevocationRepoBuilder, RevocationAPI, StatusEntry,
};
use crate::identity::revocation::RevocationList;
use crate::identity::types::{Context, IdentityError, Transition};
use crate::identity::verifiable::credential::types::{
    CredentialAPI, IssueParams, RepoBuilder as CredentialRepoBuilder,
};
use crate::identity::verifiable::credential::Credential;
use crate::identity::verifiable::VerifiableCredential;
use crate::identity::wallet::types::{BootstrapAPI, RepoBuilder as WalletRepoBuilder};
use crate::identity::wallet::Wallet;

pub fn generate_context() -> Context {
    Context::new(
        "BPNL000000000000".to_string(),
        "Operator".to_string(),
        "https://warden.example/status".to_string(),
        "Catena-X".to_string(),
        365,
    )
}

mock!(
    pub FakeAgent{}

    #[async_trait]
    impl AgentBuilder for FakeAgent {
        async fn create_sub_identity(&self, label: String) -> Result<SubIdentity, AgentError>;
        async fn remove_sub_identity(&self, wallet_id: String, wallet_key: String) -> Result<(), AgentError>;
        async fn create_did(&self, auth: AgentAuth) -> Result<DidInfo, AgentError>;
        async fn resolve_did(&self, did: String) -> Result<DidDocument, AgentError>;
        async fn register_did_on_ledger(&self, did: String, verkey: String, alias: String) -> Result<(), AgentError>;
        async fn sign_document(&self, auth: AgentAuth, request: SignRequest) -> Result<SignResponse, AgentError>;
        async fn verify_document(&self, document: Value) -> Result<bool, AgentError>;
        async fn update_service_endpoint(&self, auth: AgentAuth, did: String, endpoint: String) -> Result<(), AgentError>;
        async fn send_connection_request(&self, auth: AgentAuth, their_did: String, alias: Option<String>) -> Result<ConnectionRecord, AgentError>;
        async fn accept_connection_request(&self, auth: AgentAuth, connection_id: String) -> Result<ConnectionRecord, AgentError>;
        async fn send_credential_offer(&self, auth: AgentAuth, connection_id: String, credential: Value) -> Result<ExchangeRecord, AgentError>;
        async fn accept_credential_offer(&self, auth: AgentAuth, cred_ex_id: String) -> Result<ExchangeRecord, AgentError>;
        async fn accept_issued_credential(&self, auth: AgentAuth, cred_ex_id: String) -> Result<ExchangeRecord, AgentError>;
        async fn set_endorser_metadata(&self, auth: AgentAuth, connection_id: String) -> Result<(), AgentError>;
    }
);

mock!(
    pub FakeNotifier{}

    #[async_trait]
    impl NotifierBuilder for FakeNotifier {
        async fn notify(&self, url: String, payload: CallbackPayload) -> Result<(), IdentityError>;
    }
);

mock!(
    pub FakeBootstrap{}

    #[async_trait]
    impl BootstrapAPI for FakeBootstrap {
        async fn issue_default_credentials(&self, bpn: String) -> Result<bool, IdentityError>;
    }
);

mock!(
    pub FakeBpdm{}

    #[async_trait]
    impl BpdmBuilder for FakeBpdm {
        async fn pull_and_update_credentials(&self, bpn: Option<String>) -> Result<(), IdentityError>;
        async fn issue_and_send_credentials(&self, wallet_did: String, connection_id: String) -> Result<(), IdentityError>;
    }
);

mock!(
    pub FakeStatusListRpc{}

    #[async_trait]
    impl RPCBuilder for FakeStatusListRpc {
        async fn fetch_status_list_credential(&self, url: String) -> Result<Value, IdentityError>;
    }
);

mock!(
    pub FakeRevocation{}

    #[async_trait]
    impl RevocationAPI for FakeRevocation {
        async fn register_list(&self, profile: String) -> Result<String, IdentityError>;
        async fn add_status_entry(&self, profile: String) -> Result<StatusEntry, IdentityError>;
        async fn revoke(&self, profile: String, index: usize) -> Result<(), IdentityError>;
        async fn issue_status_list_credentials(&self, profile: Option<String>, force: bool) -> Result<Vec<String>, IdentityError>;
        async fn get_status_list_credential_of_managed_wallet(&self, list_name: String) -> Result<VerifiableCredential, IdentityError>;
        async fn get_status_list_credential_of_url(&self, url: String) -> Result<VerifiableCredential, IdentityError>;
    }
);

mock!(
    pub FakeConnection{}

    #[async_trait]
    impl ConnectionAPI for FakeConnection {
        async fn connect(&self, owner_identifier: String, target_did: String, callback_url: Option<String>) -> Result<Connection, IdentityError>;
        async fn accept(&self, owner_identifier: String, connection_id: String) -> Result<Connection, IdentityError>;
        async fn handle_event(&self, agent_wallet_id: Option<String>, event: ConnectionEvent) -> Result<Transition, IdentityError>;
        async fn list_connections(&self, identifier: String) -> Result<Vec<Connection>, IdentityError>;
        async fn find_completed_connection(&self, owner_did: String, target_did: String) -> Result<Option<Connection>, IdentityError>;
    }
);

mock!(
    pub FakeCredential{}

    #[async_trait]
    impl CredentialAPI for FakeCredential {
        async fn prepare_credential(&self, params: IssueParams) -> Result<VerifiableCredential, IdentityError>;
        async fn issue_credential(&self, params: IssueParams) -> Result<VerifiableCredential, IdentityError>;
        async fn store_credential(&self, holder_identifier: String, credential: Value) -> Result<Credential, IdentityError>;
        async fn list_credentials(&self, holder_identifier: String, type_filter: Option<String>) -> Result<Vec<Credential>, IdentityError>;
        async fn revoke_credential(&self, issuer_identifier: String, credential_id: String) -> Result<(), IdentityError>;
    }
);

/// `signing_agent` answers like a healthy agent: every did resolves to one key, every
/// document gets a proof and every proof verifies
pub fn signing_agent() -> MockFakeAgent {
    let mut agent = MockFakeAgent::new();
    agent.expect_resolve_did().returning(|did| {
        Ok(DidDocument {
            id: did.clone(),
            verification_method: vec![VerificationMethod {
                id: format!("{did}#key-1"),
                method_type: "Ed25519VerificationKey2018".to_string(),
                controller: did,
                public_key_base58: None,
            }],
            service: vec![],
        })
    });

    agent.expect_sign_document().returning(|_, request| {
        let mut document = request.document.clone();
        document["proof"] = json!({
            "type": "Ed25519Signature2018",
            "verificationMethod": request.verification_method,
            "proofPurpose": "assertionMethod",
            "jws": "eyJhbGciOiJFZERTQSJ9..signature",
        });

        Ok(SignResponse {
            signed_doc: Some(document),
            error: None,
        })
    });

    agent.expect_verify_document().returning(|_| Ok(true));
    agent
}

/// `MemoryStore` implements every repository over plain maps, with the same conflict
/// rules as the persistent store
#[derive(Default)]
pub struct MemoryStore {
    wallets: Mutex<HashMap<String, Wallet>>,
    credentials: Mutex<HashMap<String, Credential>>,
    connections: Mutex<HashMap<String, Connection>>,
    callbacks: Mutex<HashMap<String, PendingCallback>>,
    lists: Mutex<HashMap<String, RevocationList>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletRepoBuilder for MemoryStore {
    async fn save_wallet(&self, wallet: &Wallet) -> Result<(), IdentityError> {
        let mut wallets = self.wallets.lock().await;
        if wallets
            .values()
            .any(|existing| existing.bpn() == wallet.bpn() || existing.did() == wallet.did())
        {
            return Err(IdentityError::Conflict(format!("wallet {}", wallet.bpn())));
        }

        wallets.insert(wallet.bpn(), wallet.clone());
        Ok(())
    }

    async fn update_wallet(&self, wallet: &Wallet) -> Result<(), IdentityError> {
        let mut wallets = self.wallets.lock().await;
        if !wallets.contains_key(&wallet.bpn()) {
            return Err(IdentityError::NotFound(format!("wallet {}", wallet.bpn())));
        }

        wallets.insert(wallet.bpn(), wallet.clone());
        Ok(())
    }

    async fn remove_wallet(&self, bpn: String) -> Result<(), IdentityError> {
        let _ = self.wallets.lock().await.remove(&bpn);
        Ok(())
    }

    async fn get_wallet_by_bpn(&self, bpn: String) -> Result<Option<Wallet>, IdentityError> {
        Ok(self.wallets.lock().await.get(&bpn).cloned())
    }

    async fn get_wallet_by_did(&self, did: String) -> Result<Option<Wallet>, IdentityError> {
        let wallets = self.wallets.lock().await;
        Ok(wallets.values().find(|wallet| wallet.did() == did).cloned())
    }

    async fn get_wallet_by_agent_id(
        &self,
        wallet_id: String,
    ) -> Result<Option<Wallet>, IdentityError> {
        let wallets = self.wallets.lock().await;
        Ok(wallets
            .values()
            .find(|wallet| {
                wallet
                    .keys()
                    .map(|keys| keys.wallet_id == wallet_id)
                    .unwrap_or(false)
            })
            .cloned())
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>, IdentityError> {
        let mut wallets: Vec<Wallet> = self.wallets.lock().await.values().cloned().collect();
        wallets.sort_by_key(|wallet| wallet.created_at());
        Ok(wallets)
    }
}

#[async_trait]
impl CredentialRepoBuilder for MemoryStore {
    async fn save_credential(&self, credential: &Credential) -> Result<(), IdentityError> {
        let mut credentials = self.credentials.lock().await;
        if credentials.contains_key(&credential.id()) {
            return Err(IdentityError::Conflict(format!(
                "credential {}",
                credential.id()
            )));
        }

        credentials.insert(credential.id(), credential.clone());
        Ok(())
    }

    async fn get_credential(&self, id: String) -> Result<Option<Credential>, IdentityError> {
        Ok(self.credentials.lock().await.get(&id).cloned())
    }

    async fn list_credentials_by_holder(
        &self,
        holder_did: String,
    ) -> Result<Vec<Credential>, IdentityError> {
        let credentials = self.credentials.lock().await;
        Ok(credentials
            .values()
            .filter(|credential| credential.holder_did() == holder_did)
            .cloned()
            .collect())
    }

    async fn remove_credentials_by_holder(
        &self,
        holder_did: String,
    ) -> Result<usize, IdentityError> {
        let mut credentials = self.credentials.lock().await;
        let before = credentials.len();
        credentials.retain(|_, credential| credential.holder_did() != holder_did);
        Ok(before - credentials.len())
    }
}

#[async_trait]
impl ConnectionRepoBuilder for MemoryStore {
    async fn save_connection(&self, connection: &Connection) -> Result<(), IdentityError> {
        let _ = self
            .connections
            .lock()
            .await
            .insert(connection.connection_id(), connection.clone());
        Ok(())
    }

    async fn get_connection(
        &self,
        connection_id: String,
    ) -> Result<Option<Connection>, IdentityError> {
        Ok(self.connections.lock().await.get(&connection_id).cloned())
    }

    async fn list_connections_by_did(
        &self,
        did: String,
    ) -> Result<Vec<Connection>, IdentityError> {
        let connections = self.connections.lock().await;
        Ok(connections
            .values()
            .filter(|connection| connection.involves(&did))
            .cloned()
            .collect())
    }

    async fn remove_connections_by_did(&self, did: String) -> Result<usize, IdentityError> {
        let mut connections = self.connections.lock().await;
        let before = connections.len();
        connections.retain(|_, connection| !connection.involves(&did));
        Ok(before - connections.len())
    }
}

#[async_trait]
impl CallbackRepoBuilder for MemoryStore {
    async fn save_callback(&self, callback: &PendingCallback) -> Result<(), IdentityError> {
        let _ = self
            .callbacks
            .lock()
            .await
            .insert(callback.thread_id(), callback.clone());
        Ok(())
    }

    async fn get_callback(
        &self,
        thread_id: String,
    ) -> Result<Option<PendingCallback>, IdentityError> {
        Ok(self.callbacks.lock().await.get(&thread_id).cloned())
    }

    async fn list_callbacks(&self) -> Result<Vec<PendingCallback>, IdentityError> {
        Ok(self.callbacks.lock().await.values().cloned().collect())
    }

    async fn remove_callback(&self, thread_id: String) -> Result<(), IdentityError> {
        let _ = self.callbacks.lock().await.remove(&thread_id);
        Ok(())
    }
}

#[async_trait]
impl RevocationRepoBuilder for MemoryStore {
    async fn save_revocation_list(&self, list: &RevocationList) -> Result<(), IdentityError> {
        let _ = self
            .lists
            .lock()
            .await
            .insert(list.profile_name(), list.clone());
        Ok(())
    }

    async fn get_revocation_list(
        &self,
        name: String,
    ) -> Result<Option<RevocationList>, IdentityError> {
        Ok(self.lists.lock().await.get(&name).cloned())
    }

    async fn list_revocation_list_names(&self) -> Result<Vec<String>, IdentityError> {
        let mut names: Vec<String> = self.lists.lock().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
