use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

use crate::agent::types::ExchangeRecord;
use crate::identity::types::{IdentityError, Transition};

/// `Lane` tells which side of an exchange a state belongs to. Both sides may live on the
/// same agent and share one thread id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Issuer,
    Holder,
}

/// `ExchangeState` is the closed set of credential exchange states.
///
/// - issuer: `OfferSent -> RequestReceived -> CredentialIssued -> Done`
/// - holder: `OfferReceived -> RequestSent -> CredentialReceived -> Done`
///
/// `Declined` and `Abandoned` are reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum ExchangeState {
    OfferSent,
    OfferReceived,
    RequestSent,
    RequestReceived,
    CredentialIssued,
    CredentialReceived,
    Done,
    Declined,
    Abandoned,
}

impl ExchangeState {
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "offer-sent" => Some(ExchangeState::OfferSent),
            "offer-received" => Some(ExchangeState::OfferReceived),
            "request-sent" => Some(ExchangeState::RequestSent),
            "request-received" => Some(ExchangeState::RequestReceived),
            "credential-issued" => Some(ExchangeState::CredentialIssued),
            "credential-received" => Some(ExchangeState::CredentialReceived),
            "done" | "credential-acked" | "stored" => Some(ExchangeState::Done),
            "declined" => Some(ExchangeState::Declined),
            "abandoned" => Some(ExchangeState::Abandoned),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeState::OfferSent => "offer-sent",
            ExchangeState::OfferReceived => "offer-received",
            ExchangeState::RequestSent => "request-sent",
            ExchangeState::RequestReceived => "request-received",
            ExchangeState::CredentialIssued => "credential-issued",
            ExchangeState::CredentialReceived => "credential-received",
            ExchangeState::Done => "done",
            ExchangeState::Declined => "declined",
            ExchangeState::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExchangeState::Done | ExchangeState::Declined | ExchangeState::Abandoned
        )
    }

    /// `lane` is `None` for the terminal states, they are shared by both sides
    pub fn lane(&self) -> Option<Lane> {
        match self {
            ExchangeState::OfferSent
            | ExchangeState::RequestReceived
            | ExchangeState::CredentialIssued => Some(Lane::Issuer),
            ExchangeState::OfferReceived
            | ExchangeState::RequestSent
            | ExchangeState::CredentialReceived => Some(Lane::Holder),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ExchangeState::OfferSent | ExchangeState::OfferReceived => 0,
            ExchangeState::RequestReceived | ExchangeState::RequestSent => 1,
            ExchangeState::CredentialIssued | ExchangeState::CredentialReceived => 2,
            ExchangeState::Done | ExchangeState::Declined | ExchangeState::Abandoned => 3,
        }
    }

    /// `transition` applies the exchange sub-machine rules to one lane: forward moves are
    /// applied, backward moves and anything after a terminal state are ignored
    pub fn transition(from: Option<ExchangeState>, to: ExchangeState) -> Transition {
        let from = match from {
            None => return Transition::Applied,
            Some(state) => state,
        };

        if from == to {
            return Transition::Replayed;
        }

        if from.is_terminal() {
            return Transition::Ignored;
        }

        match (from.lane(), to.lane()) {
            (Some(current), Some(next)) if current != next => Transition::Ignored,
            _ if to.rank() > from.rank() => Transition::Applied,
            _ => Transition::Ignored,
        }
    }
}

/// `CredentialExchangeEvent` is the body of an `issue_credential_v2_0` webhook delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct CredentialExchangeEvent {
    pub cred_ex_id: String,
    pub thread_id: String,
    pub state: String,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub connection_id: Option<String>,

    #[serde(default)]
    pub cred_issue: Option<Value>,
}

impl CredentialExchangeEvent {
    /// the lane of the event, terminal states fall back to the reported role
    pub fn lane(&self, state: ExchangeState) -> Lane {
        match state.lane() {
            Some(lane) => lane,
            None => match self.role.as_deref() {
                Some("holder") => Lane::Holder,
                _ => Lane::Issuer,
            },
        }
    }

    /// `attached_credential` decodes the first credential attachment, either inline json
    /// or base64 encoded json. The document is returned untouched
    pub fn attached_credential(&self) -> Result<Option<Value>, IdentityError> {
        let data = match self
            .cred_issue
            .as_ref()
            .and_then(|issue| issue.get("credentials~attach"))
            .and_then(|attachments| attachments.get(0))
            .and_then(|attachment| attachment.get("data"))
        {
            Some(data) => data,
            None => return Ok(None),
        };

        if let Some(inline) = data.get("json") {
            return Ok(Some(inline.to_owned()));
        }

        let encoded = match data.get("base64").and_then(|val| val.as_str()) {
            Some(encoded) => encoded,
            None => return Ok(None),
        };

        let bytes = STANDARD
            .decode(encoded)
            .or_else(|_| URL_SAFE.decode(encoded))
            .map_err(|err| {
                IdentityError::ValidationError(format!("credential attachment: {err}"))
            })?;

        serde_json::from_slice::<Value>(&bytes)
            .map(Some)
            .map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

/// `OfferParams` carries an offer towards a self-managed holder
#[derive(Debug, Clone, PartialEq)]
pub struct OfferParams {
    pub issuer: String,
    pub holder: String,
    pub credential_type: String,
    pub claims: Value,
    pub expiration_date: Option<DateTime<Utc>>,
    pub revocable: bool,
    pub callback_url: Option<String>,
}

#[async_trait]
pub trait ExchangeAPI: Send + Sync {
    /// `offer_credential` sends a credential offer through the completed connection between
    /// the issuer and a self-managed holder
    async fn offer_credential(&self, params: OfferParams) -> Result<ExchangeRecord, IdentityError>;

    async fn handle_event(
        &self,
        agent_wallet_id: Option<String>,
        event: CredentialExchangeEvent,
    ) -> Result<Transition, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json::json;
    use table_test::table_test;

    #[test]
    fn test_transition_table() {
        use ExchangeState::*;

        let table = vec![
            ((None, OfferReceived), Transition::Applied),
            ((Some(OfferSent), RequestReceived), Transition::Applied),
            ((Some(RequestReceived), CredentialIssued), Transition::Applied),
            ((Some(CredentialIssued), Done), Transition::Applied),
            ((Some(OfferReceived), RequestSent), Transition::Applied),
            ((Some(RequestSent), CredentialReceived), Transition::Applied),
            ((Some(OfferSent), Declined), Transition::Applied),
            ((Some(CredentialIssued), CredentialIssued), Transition::Replayed),
            ((Some(Done), Done), Transition::Replayed),
            ((Some(CredentialIssued), RequestReceived), Transition::Ignored),
            ((Some(Done), Abandoned), Transition::Ignored),
            ((Some(Declined), OfferSent), Transition::Ignored),
            ((Some(OfferSent), OfferReceived), Transition::Ignored),
        ];

        for (validator, (from, to), expected) in table_test!(table) {
            validator
                .given(&format!("{:?} -> {:?}", from, to))
                .when("apply transition")
                .then(&format!("{:?}", expected))
                .assert_eq(expected, ExchangeState::transition(from, to));
        }
    }

    #[test]
    fn test_parse_states() {
        assert_eq!(ExchangeState::parse("offer_received"), Some(ExchangeState::OfferReceived));
        assert_eq!(ExchangeState::parse("credential-acked"), Some(ExchangeState::Done));
        assert_eq!(ExchangeState::parse("deleted"), None);
    }

    fn event_with(cred_issue: Option<Value>) -> CredentialExchangeEvent {
        CredentialExchangeEvent {
            cred_ex_id: "cx-1".to_string(),
            thread_id: "th-1".to_string(),
            state: "credential-issued".to_string(),
            role: Some("issuer".to_string()),
            connection_id: None,
            cred_issue,
        }
    }

    fn sample_credential() -> Value {
        json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "id": "urn:uuid:cred-1",
            "type": ["VerifiableCredential", "BpnCredential"],
            "issuer": "did:sov:base",
            "credentialSubject": {"id": "did:web:external", "bpn": "BPNL000000000002"}
        })
    }

    #[test]
    fn test_attached_credential_base64() {
        let encoded = STANDARD.encode(serde_json::to_vec(&sample_credential()).unwrap());
        let event = event_with(Some(json!({
            "credentials~attach": [{"data": {"base64": encoded}}]
        })));

        let credential = event.attached_credential().unwrap().unwrap();
        assert_eq!(credential, sample_credential());
    }

    #[test]
    fn test_attached_credential_inline_and_missing() {
        let event = event_with(Some(json!({
            "credentials~attach": [{"data": {"json": sample_credential()}}]
        })));
        assert!(event.attached_credential().unwrap().is_some());

        assert!(event_with(None).attached_credential().unwrap().is_none());

        let broken = event_with(Some(json!({
            "credentials~attach": [{"data": {"base64": "%%%"}}]
        })));
        assert!(broken.attached_credential().is_err());
    }

    #[test]
    fn test_terminal_lane_from_role() {
        let mut event = event_with(None);
        assert_eq!(event.lane(ExchangeState::Done), Lane::Issuer);

        event.role = Some("holder".to_string());
        assert_eq!(event.lane(ExchangeState::Done), Lane::Holder);
        assert_eq!(event.lane(ExchangeState::OfferSent), Lane::Issuer);
    }
}
