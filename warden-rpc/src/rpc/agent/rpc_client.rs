use reqwest::RequestBuilder;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{json, Value};
use rst_common::standard::uuid::Uuid;
use rst_common::with_logging::log::debug;

use prople_warden_core::agent::types::{
    AgentAuth, AgentBuilder, AgentError, ConnectionRecord, DidDocument, DidInfo, ExchangeRecord,
    SignRequest, SignResponse, SubIdentity,
};

use crate::rpc::shared::{call, call_empty, HttpClient};

use super::rpc_param::{
    qualify_did, unqualify_did, CreateDidResponse, CreateWalletRequest, CreateWalletResponse,
    ResolveDidResponse, VerifyResponse, DID_METHOD, ENDORSER_JOB, ENDPOINT_TYPE,
    KEY_MANAGEMENT_MODE, KEY_TYPE, PROOF_PURPOSE, PROOF_TYPE, WALLET_TYPE,
};

const API_KEY_HEADER: &str = "X-API-Key";

/// `RpcClient` talks to the identity agent admin API. Base wallet calls carry the admin
/// key only, tenant calls add the sub-wallet bearer token
#[derive(Clone)]
pub struct RpcClient {
    http: HttpClient,
    api_key: String,
}

impl RpcClient {
    pub fn new(http: HttpClient, api_key: String) -> Self {
        Self { http, api_key }
    }

    fn authorize(&self, request: RequestBuilder, auth: &AgentAuth) -> RequestBuilder {
        let request = request.header(API_KEY_HEADER, self.api_key.as_str());
        match auth {
            AgentAuth::Base => request,
            AgentAuth::Tenant { token, .. } => request.bearer_auth(token),
        }
    }

    /// the base58 public key behind a verification method, the agent signs by verkey
    async fn verkey_of(&self, verification_method: &str) -> Result<String, AgentError> {
        let did = verification_method
            .split('#')
            .next()
            .unwrap_or(verification_method);

        let doc = self.resolve_did(did.to_string()).await?;
        doc.verification_method
            .iter()
            .find(|method| method.id == verification_method)
            .and_then(|method| method.public_key_base58.to_owned())
            .ok_or(AgentError::UnserializeError(format!(
                "no public key for verification method: {}",
                verification_method
            )))
    }
}

#[async_trait]
impl AgentBuilder for RpcClient {
    async fn create_sub_identity(&self, label: String) -> Result<SubIdentity, AgentError> {
        let wallet_key = Uuid::new_v4().simple().to_string();
        let payload = CreateWalletRequest {
            label: label.clone(),
            wallet_name: format!("{}-{}", label, Uuid::new_v4().simple()),
            wallet_key: wallet_key.clone(),
            wallet_type: WALLET_TYPE.to_string(),
            key_management_mode: KEY_MANAGEMENT_MODE.to_string(),
        };

        let request = self.authorize(self.http.post("/multitenancy/wallet"), &AgentAuth::Base);
        let response: CreateWalletResponse = call(request.json(&payload)).await?;

        debug!("[agent:create_sub_identity] wallet_id: {}", response.wallet_id);
        Ok(SubIdentity {
            wallet_id: response.wallet_id,
            wallet_key,
            token: response.token,
        })
    }

    async fn remove_sub_identity(
        &self,
        wallet_id: String,
        wallet_key: String,
    ) -> Result<(), AgentError> {
        let path = format!("/multitenancy/wallet/{}/remove", wallet_id);
        let request = self.authorize(self.http.post(&path), &AgentAuth::Base);

        call_empty(request.json(&json!({ "wallet_key": wallet_key })))
            .await
            .map_err(AgentError::from)
    }

    async fn create_did(&self, auth: AgentAuth) -> Result<DidInfo, AgentError> {
        let request = self.authorize(self.http.post("/wallet/did/create"), &auth);
        let response: CreateDidResponse = call(request.json(&json!({
            "method": DID_METHOD,
            "options": { "key_type": KEY_TYPE },
        })))
        .await?;

        Ok(DidInfo {
            did: qualify_did(&response.result.did),
            verkey: response.result.verkey,
        })
    }

    async fn resolve_did(&self, did: String) -> Result<DidDocument, AgentError> {
        let path = format!("/resolver/resolve/{}", did);
        let request = self.authorize(self.http.get(&path), &AgentAuth::Base);
        let response: ResolveDidResponse = call(request).await?;

        Ok(response.did_document)
    }

    async fn register_did_on_ledger(
        &self,
        did: String,
        verkey: String,
        alias: String,
    ) -> Result<(), AgentError> {
        let nym = unqualify_did(&did);
        let request = self
            .authorize(self.http.post("/ledger/register-nym"), &AgentAuth::Base)
            .query(&[
                ("did", nym.as_str()),
                ("verkey", verkey.as_str()),
                ("alias", alias.as_str()),
            ]);

        call_empty(request).await.map_err(AgentError::from)
    }

    async fn sign_document(
        &self,
        auth: AgentAuth,
        request: SignRequest,
    ) -> Result<SignResponse, AgentError> {
        let verkey = self.verkey_of(&request.verification_method).await?;
        let payload = json!({
            "doc": {
                "credential": request.document,
                "options": {
                    "type": PROOF_TYPE,
                    "proofPurpose": PROOF_PURPOSE,
                    "verificationMethod": request.verification_method,
                },
            },
            "verkey": verkey,
        });

        let builder = self.authorize(self.http.post("/jsonld/sign"), &auth);
        let response: SignResponse = call(builder.json(&payload)).await?;
        Ok(response)
    }

    async fn verify_document(&self, document: Value) -> Result<bool, AgentError> {
        let request = self.authorize(self.http.post("/jsonld/verify"), &AgentAuth::Base);
        let response: VerifyResponse = call(request.json(&json!({ "doc": document }))).await?;

        if let Some(reason) = response.error.as_ref() {
            debug!("[agent:verify_document] rejected: {}", reason);
        }

        Ok(response.valid)
    }

    async fn update_service_endpoint(
        &self,
        auth: AgentAuth,
        did: String,
        endpoint: String,
    ) -> Result<(), AgentError> {
        let request = self.authorize(self.http.post("/wallet/set-did-endpoint"), &auth);
        call_empty(request.json(&json!({
            "did": unqualify_did(&did),
            "endpoint": endpoint,
            "endpoint_type": ENDPOINT_TYPE,
        })))
        .await
        .map_err(AgentError::from)
    }

    async fn send_connection_request(
        &self,
        auth: AgentAuth,
        their_did: String,
        alias: Option<String>,
    ) -> Result<ConnectionRecord, AgentError> {
        let mut query = vec![
            ("their_public_did", their_did),
            ("use_public_did", "true".to_string()),
        ];
        if let Some(alias) = alias {
            query.push(("alias", alias));
        }

        let request = self
            .authorize(self.http.post("/didexchange/create-request"), &auth)
            .query(&query);

        call(request).await.map_err(AgentError::from)
    }

    async fn accept_connection_request(
        &self,
        auth: AgentAuth,
        connection_id: String,
    ) -> Result<ConnectionRecord, AgentError> {
        let path = format!("/didexchange/{}/accept-request", connection_id);
        let request = self.authorize(self.http.post(&path), &auth);

        call(request).await.map_err(AgentError::from)
    }

    async fn send_credential_offer(
        &self,
        auth: AgentAuth,
        connection_id: String,
        credential: Value,
    ) -> Result<ExchangeRecord, AgentError> {
        let payload = json!({
            "connection_id": connection_id,
            "auto_issue": true,
            "auto_remove": false,
            "filter": {
                "ld_proof": {
                    "credential": credential,
                    "options": { "proofType": PROOF_TYPE },
                },
            },
        });

        let request = self.authorize(self.http.post("/issue-credential-2.0/send-offer"), &auth);
        call(request.json(&payload)).await.map_err(AgentError::from)
    }

    async fn accept_credential_offer(
        &self,
        auth: AgentAuth,
        cred_ex_id: String,
    ) -> Result<ExchangeRecord, AgentError> {
        let path = format!("/issue-credential-2.0/records/{}/send-request", cred_ex_id);
        let request = self.authorize(self.http.post(&path), &auth);

        call(request.json(&json!({}))).await.map_err(AgentError::from)
    }

    async fn accept_issued_credential(
        &self,
        auth: AgentAuth,
        cred_ex_id: String,
    ) -> Result<ExchangeRecord, AgentError> {
        let path = format!("/issue-credential-2.0/records/{}/store", cred_ex_id);
        let request = self.authorize(self.http.post(&path), &auth);

        call(request.json(&json!({}))).await.map_err(AgentError::from)
    }

    async fn set_endorser_metadata(
        &self,
        auth: AgentAuth,
        connection_id: String,
    ) -> Result<(), AgentError> {
        let role_path = format!("/transactions/{}/set-endorser-role", connection_id);
        let request = self
            .authorize(self.http.post(&role_path), &auth)
            .query(&[("transaction_my_job", ENDORSER_JOB)]);
        call_empty(request).await?;

        let connection_path = format!("/connections/{}", connection_id);
        let connection: ConnectionRecord =
            call(self.authorize(self.http.get(&connection_path), &auth)).await?;

        let endorser_did = connection.their_did.ok_or(AgentError::UnserializeError(format!(
            "connection {} has no counterpart did",
            connection_id
        )))?;

        let info_path = format!("/transactions/{}/set-endorser-info", connection_id);
        let endorser_nym = unqualify_did(&endorser_did);
        let request = self
            .authorize(self.http.post(&info_path), &auth)
            .query(&[("endorser_did", endorser_nym.as_str())]);

        call_empty(request).await.map_err(AgentError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockito::{Matcher, Server, ServerGuard};
    use rst_common::with_tokio::tokio;

    async fn generate_client() -> (ServerGuard, RpcClient) {
        let server = Server::new_async().await;
        let http = HttpClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let client = RpcClient::new(http, "admin-key".to_string());
        (server, client)
    }

    fn tenant() -> AgentAuth {
        AgentAuth::Tenant {
            wallet_id: "wallet-1".to_string(),
            token: "tenant-token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_sub_identity() {
        let (mut server, client) = generate_client().await;
        let mock = server
            .mock("POST", "/multitenancy/wallet")
            .match_header("x-api-key", "admin-key")
            .match_body(Matcher::PartialJson(json!({
                "label": "BPNL000000000001",
                "key_management_mode": "managed",
            })))
            .with_status(200)
            .with_body(r#"{"wallet_id":"wallet-1","token":"tenant-token","settings":{}}"#)
            .create_async()
            .await;

        let sub = client
            .create_sub_identity("BPNL000000000001".to_string())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(sub.wallet_id, "wallet-1");
        assert_eq!(sub.token, "tenant-token");
        assert!(!sub.wallet_key.is_empty());
    }

    #[tokio::test]
    async fn test_create_did_qualifies_nym() {
        let (mut server, client) = generate_client().await;
        let mock = server
            .mock("POST", "/wallet/did/create")
            .match_header("authorization", "Bearer tenant-token")
            .with_status(200)
            .with_body(r#"{"result":{"did":"WgWxqztrNooG92RXvxSTWv","verkey":"verkey-1"}}"#)
            .create_async()
            .await;

        let info = client.create_did(tenant()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(info.did, "did:sov:WgWxqztrNooG92RXvxSTWv");
        assert_eq!(info.verkey, "verkey-1");
    }

    #[tokio::test]
    async fn test_sign_document_resolves_verkey() {
        let (mut server, client) = generate_client().await;
        let resolve = server
            .mock("GET", "/resolver/resolve/did:sov:issuer")
            .with_status(200)
            .with_body(
                json!({
                    "did_document": {
                        "id": "did:sov:issuer",
                        "verificationMethod": [{
                            "id": "did:sov:issuer#key-1",
                            "type": "Ed25519VerificationKey2018",
                            "controller": "did:sov:issuer",
                            "publicKeyBase58": "issuer-verkey",
                        }],
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let sign = server
            .mock("POST", "/jsonld/sign")
            .match_body(Matcher::PartialJson(json!({
                "verkey": "issuer-verkey",
                "doc": {"options": {"verificationMethod": "did:sov:issuer#key-1"}},
            })))
            .with_status(200)
            .with_body(r#"{"signed_doc":{"id":"urn:uuid:1","proof":{"jws":"sig"}}}"#)
            .create_async()
            .await;

        let response = client
            .sign_document(
                AgentAuth::Base,
                SignRequest {
                    document: json!({"id": "urn:uuid:1"}),
                    verification_method: "did:sov:issuer#key-1".to_string(),
                },
            )
            .await
            .unwrap();

        resolve.assert_async().await;
        sign.assert_async().await;
        assert_eq!(response.signed_doc.unwrap()["proof"]["jws"], json!("sig"));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_sign_document_unknown_method() {
        let (mut server, client) = generate_client().await;
        let _resolve = server
            .mock("GET", "/resolver/resolve/did:sov:issuer")
            .with_status(200)
            .with_body(r#"{"did_document":{"id":"did:sov:issuer","verificationMethod":[]}}"#)
            .create_async()
            .await;

        let response = client
            .sign_document(
                AgentAuth::Base,
                SignRequest {
                    document: json!({}),
                    verification_method: "did:sov:issuer#key-9".to_string(),
                },
            )
            .await;

        assert!(matches!(response, Err(AgentError::UnserializeError(_))));
    }

    #[tokio::test]
    async fn test_verify_document_rejected() {
        let (mut server, client) = generate_client().await;
        let _mock = server
            .mock("POST", "/jsonld/verify")
            .with_status(200)
            .with_body(r#"{"valid":false,"error":"signature mismatch"}"#)
            .create_async()
            .await;

        let valid = client.verify_document(json!({"proof": {}})).await.unwrap();
        assert!(!valid);
    }

    #[tokio::test]
    async fn test_send_connection_request() {
        let (mut server, client) = generate_client().await;
        let mock = server
            .mock("POST", "/didexchange/create-request")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("their_public_did".into(), "did:web:partner".into()),
                Matcher::UrlEncoded("alias".into(), "Partner".into()),
            ]))
            .match_header("authorization", "Bearer tenant-token")
            .with_status(200)
            .with_body(r#"{"connection_id":"conn-1","rfc23_state":"request-sent"}"#)
            .create_async()
            .await;

        let record = client
            .send_connection_request(
                tenant(),
                "did:web:partner".to_string(),
                Some("Partner".to_string()),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(record.connection_id, "conn-1");
        assert_eq!(record.rfc23_state, "request-sent");
        assert!(record.their_did.is_none());
    }

    #[tokio::test]
    async fn test_send_credential_offer_error_status() {
        let (mut server, client) = generate_client().await;
        let _mock = server
            .mock("POST", "/issue-credential-2.0/send-offer")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let result = client
            .send_credential_offer(tenant(), "conn-1".to_string(), json!({}))
            .await;

        assert_eq!(
            result.unwrap_err(),
            AgentError::ResponseError {
                status: 401,
                message: "unauthorized".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_set_endorser_metadata() {
        let (mut server, client) = generate_client().await;
        let role = server
            .mock("POST", "/transactions/conn-1/set-endorser-role")
            .match_query(Matcher::UrlEncoded(
                "transaction_my_job".into(),
                "TRANSACTION_AUTHOR".into(),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let _connection = server
            .mock("GET", "/connections/conn-1")
            .with_status(200)
            .with_body(
                r#"{"connection_id":"conn-1","rfc23_state":"completed","their_did":"did:sov:Base1"}"#,
            )
            .create_async()
            .await;

        let info = server
            .mock("POST", "/transactions/conn-1/set-endorser-info")
            .match_query(Matcher::UrlEncoded("endorser_did".into(), "Base1".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let result = client
            .set_endorser_metadata(tenant(), "conn-1".to_string())
            .await;

        assert!(result.is_ok());
        role.assert_async().await;
        info.assert_async().await;
    }
}
