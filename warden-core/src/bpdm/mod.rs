use rst_common::standard::async_trait::async_trait;

use crate::identity::types::IdentityError;

/// `BpdmBuilder` exposes the only two entry points consumed from the business partner
/// data pipeline
#[async_trait]
pub trait BpdmBuilder {
    /// pull the latest partner data and refresh the derived credentials of one wallet,
    /// or of every wallet when `bpn` is `None`
    async fn pull_and_update_credentials(&self, bpn: Option<String>) -> Result<(), IdentityError>;

    /// issue and send the partner credentials of a self-managed wallet through an
    /// existing completed connection
    async fn issue_and_send_credentials(
        &self,
        wallet_did: String,
        connection_id: String,
    ) -> Result<(), IdentityError>;
}
