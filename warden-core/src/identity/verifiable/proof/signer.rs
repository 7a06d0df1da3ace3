use std::sync::Arc;

use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::debug;

use crate::agent::types::{AgentBuilder, SignRequest};
use crate::identity::types::IdentityError;
use crate::identity::wallet::Wallet;

/// `Signer` delegates document signing to the identity agent with the signing key
/// reference of a wallet
pub struct Signer<TAgent>
where
    TAgent: AgentBuilder + Send + Sync,
{
    agent: Arc<TAgent>,
}

impl<TAgent> Clone for Signer<TAgent>
where
    TAgent: AgentBuilder + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            agent: self.agent.clone(),
        }
    }
}

impl<TAgent> Signer<TAgent>
where
    TAgent: AgentBuilder + Send + Sync,
{
    pub fn new(agent: Arc<TAgent>) -> Self {
        Self { agent }
    }

    pub async fn sign(&self, wallet: &Wallet, document: Value) -> Result<Value, IdentityError> {
        let method = self.verification_method(wallet).await?;
        self.sign_with_method(wallet, method, document).await
    }

    /// `verification_method` resolves the signing key reference of a wallet, the first
    /// method of its did document
    pub async fn verification_method(&self, wallet: &Wallet) -> Result<String, IdentityError> {
        let _ = wallet.agent_auth()?;

        let doc = self.agent.resolve_did(wallet.did()).await?;
        let method = doc
            .verification_method
            .first()
            .map(|method| method.id.to_owned())
            .ok_or(IdentityError::NoVerificationMethod(wallet.did()))?;

        debug!("[signer] did: {} | method: {method}", wallet.did());
        Ok(method)
    }

    pub async fn sign_with_method(
        &self,
        wallet: &Wallet,
        method: String,
        document: Value,
    ) -> Result<Value, IdentityError> {
        let auth = wallet.agent_auth()?;
        let response = self
            .agent
            .sign_document(
                auth,
                SignRequest {
                    document,
                    verification_method: method,
                },
            )
            .await?;

        match response.signed_doc {
            Some(signed) => Ok(signed),
            None => Err(IdentityError::SigningFailed(response.error.unwrap_or(
                "agent returned no signed document".to_string(),
            ))),
        }
    }
}
