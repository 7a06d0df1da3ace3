use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::identity::connection::types::Rfc23State;
use crate::identity::exchange::types::ExchangeState;
use crate::identity::types::IdentityError;

use super::PendingCallback;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde", rename_all = "snake_case")]
pub enum CallbackTopic {
    Connection,
    Credential,
}

impl CallbackTopic {
    /// `is_terminal_state` reads a protocol state of this topic, unknown states are not terminal
    pub fn is_terminal_state(&self, state: &str) -> bool {
        match self {
            CallbackTopic::Connection => Rfc23State::parse(state)
                .map(|state| state.is_terminal())
                .unwrap_or(false),
            CallbackTopic::Credential => ExchangeState::parse(state)
                .map(|state| state.is_terminal())
                .unwrap_or(false),
        }
    }
}

/// `CallbackPayload` is the body posted to a caller supplied callback url
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct CallbackPayload {
    pub thread_id: String,
    pub topic: CallbackTopic,
    pub state: String,
}

#[async_trait]
pub trait RepoBuilder {
    async fn save_callback(&self, callback: &PendingCallback) -> Result<(), IdentityError>;

    async fn get_callback(
        &self,
        thread_id: String,
    ) -> Result<Option<PendingCallback>, IdentityError>;

    async fn list_callbacks(&self) -> Result<Vec<PendingCallback>, IdentityError>;

    async fn remove_callback(&self, thread_id: String) -> Result<(), IdentityError>;
}

/// `NotifierBuilder` delivers a terminal state to a callback url, best effort. Deliveries
/// run in the background, never on the caller's path
#[async_trait]
pub trait NotifierBuilder {
    async fn notify(&self, url: String, payload: CallbackPayload) -> Result<(), IdentityError>;
}

#[async_trait]
pub trait CallbackAPI: Send + Sync {
    /// `open` attaches a callback url to a thread. A record already created by a faster
    /// webhook keeps its state, a terminal one is notified right away
    async fn open(
        &self,
        thread_id: String,
        topic: CallbackTopic,
        callback_url: Option<String>,
        state: String,
    ) -> Result<PendingCallback, IdentityError>;

    async fn get(&self, thread_id: String) -> Result<Option<PendingCallback>, IdentityError>;

    /// `update_state` records the latest protocol state of a thread, a record unknown so far
    /// is created without callback url. A terminal record is never updated again
    async fn update_state(
        &self,
        thread_id: String,
        topic: CallbackTopic,
        state: String,
        terminal: bool,
    ) -> Result<PendingCallback, IdentityError>;

    /// `purge` removes terminal records untouched for longer than `retention_secs`
    async fn purge(&self, retention_secs: i64) -> Result<usize, IdentityError>;
}
