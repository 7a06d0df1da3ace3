use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::identity::types::{IdentityError, Transition};

use super::Connection;

/// `Rfc23State` is the closed set of connection states.
///
/// Two lanes share the `Invitation` and `Completed` ends:
/// - requester: `Invitation -> RequestSent -> ResponseReceived -> Completed`
/// - responder: `Invitation -> RequestReceived -> ResponseSent -> Completed`
///
/// `Abandoned` is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde", rename_all = "kebab-case")]
pub enum Rfc23State {
    Invitation,
    RequestSent,
    RequestReceived,
    ResponseSent,
    ResponseReceived,
    Completed,
    Abandoned,
}

impl Rfc23State {
    /// `parse` accepts the agent spelling, hyphenated or underscored. Unknown states yield `None`
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "start" | "invitation" | "invitation-sent" | "invitation-received" => {
                Some(Rfc23State::Invitation)
            }
            "request-sent" => Some(Rfc23State::RequestSent),
            "request-received" => Some(Rfc23State::RequestReceived),
            "response-sent" => Some(Rfc23State::ResponseSent),
            "response-received" => Some(Rfc23State::ResponseReceived),
            "completed" => Some(Rfc23State::Completed),
            "abandoned" => Some(Rfc23State::Abandoned),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rfc23State::Invitation => "invitation",
            Rfc23State::RequestSent => "request-sent",
            Rfc23State::RequestReceived => "request-received",
            Rfc23State::ResponseSent => "response-sent",
            Rfc23State::ResponseReceived => "response-received",
            Rfc23State::Completed => "completed",
            Rfc23State::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Rfc23State::Completed | Rfc23State::Abandoned)
    }

    /// `transition` is the exhaustive transition table of the connection sub-machine
    pub fn transition(from: Option<Rfc23State>, to: Rfc23State) -> Transition {
        use Rfc23State::*;

        let from = match from {
            None => return Transition::Applied,
            Some(state) => state,
        };

        if from == to {
            return Transition::Replayed;
        }

        match (from, to) {
            (Completed, _) | (Abandoned, _) => Transition::Ignored,
            (_, Abandoned) => Transition::Applied,

            (Invitation, RequestSent)
            | (Invitation, RequestReceived)
            | (Invitation, ResponseSent)
            | (Invitation, ResponseReceived)
            | (Invitation, Completed) => Transition::Applied,

            (RequestSent, ResponseReceived) | (RequestSent, Completed) => Transition::Applied,
            (RequestReceived, ResponseSent) | (RequestReceived, Completed) => Transition::Applied,
            (ResponseSent, Completed) | (ResponseReceived, Completed) => Transition::Applied,

            (_, Invitation)
            | (RequestSent, RequestReceived)
            | (RequestSent, ResponseSent)
            | (RequestReceived, RequestSent)
            | (RequestReceived, ResponseReceived)
            | (ResponseSent, RequestSent)
            | (ResponseSent, RequestReceived)
            | (ResponseSent, ResponseReceived)
            | (ResponseReceived, RequestSent)
            | (ResponseReceived, RequestReceived)
            | (ResponseReceived, ResponseSent) => Transition::Ignored,

            (RequestSent, RequestSent)
            | (RequestReceived, RequestReceived)
            | (ResponseSent, ResponseSent)
            | (ResponseReceived, ResponseReceived) => Transition::Replayed,
        }
    }
}

/// `ConnectionEvent` is the body of a `connections` webhook delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ConnectionEvent {
    pub connection_id: String,
    pub rfc23_state: String,

    #[serde(default)]
    pub their_did: Option<String>,

    #[serde(default)]
    pub their_label: Option<String>,

    #[serde(default)]
    pub their_role: Option<String>,

    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default)]
    pub my_did: Option<String>,
}

pub const ENDORSER_MARKER: &str = "endorser";

impl ConnectionEvent {
    /// the counterpart is an endorser when its role or the connection alias says so
    pub fn is_endorser_relationship(&self) -> bool {
        [&self.their_role, &self.alias]
            .iter()
            .filter_map(|val| val.as_ref())
            .any(|val| val.to_ascii_lowercase().contains(ENDORSER_MARKER))
    }
}

#[async_trait]
pub trait RepoBuilder {
    async fn save_connection(&self, connection: &Connection) -> Result<(), IdentityError>;

    async fn get_connection(
        &self,
        connection_id: String,
    ) -> Result<Option<Connection>, IdentityError>;

    /// connections where the did is either the owner or the target
    async fn list_connections_by_did(&self, did: String)
        -> Result<Vec<Connection>, IdentityError>;

    async fn remove_connections_by_did(&self, did: String) -> Result<usize, IdentityError>;
}

#[async_trait]
pub trait ConnectionAPI: Send + Sync {
    /// `connect` sends a connection request from the owner wallet to an external did
    async fn connect(
        &self,
        owner_identifier: String,
        target_did: String,
        callback_url: Option<String>,
    ) -> Result<Connection, IdentityError>;

    async fn accept(
        &self,
        owner_identifier: String,
        connection_id: String,
    ) -> Result<Connection, IdentityError>;

    /// `handle_event` applies a webhook delivery. `agent_wallet_id` comes from the wallet
    /// header, `None` means the base wallet
    async fn handle_event(
        &self,
        agent_wallet_id: Option<String>,
        event: ConnectionEvent,
    ) -> Result<Transition, IdentityError>;

    async fn list_connections(&self, identifier: String)
        -> Result<Vec<Connection>, IdentityError>;

    async fn find_completed_connection(
        &self,
        owner_did: String,
        target_did: String,
    ) -> Result<Option<Connection>, IdentityError>;
}
