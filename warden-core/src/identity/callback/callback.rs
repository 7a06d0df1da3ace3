use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use crate::identity::types::IdentityError;

use super::types::{CallbackPayload, CallbackTopic};

/// `PendingCallback` tracks one in-flight asynchronous exchange, keyed by its thread id.
///
/// Terminal records are kept until purged so a redelivered terminal event is still
/// recognised as a replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct PendingCallback {
    thread_id: String,
    topic: CallbackTopic,
    callback_url: Option<String>,
    state: String,
    terminal: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PendingCallback {
    pub fn new(
        thread_id: String,
        topic: CallbackTopic,
        callback_url: Option<String>,
        state: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            thread_id,
            topic,
            callback_url: callback_url.filter(|url| !url.trim().is_empty()),
            state,
            terminal: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn thread_id(&self) -> String {
        self.thread_id.to_owned()
    }

    pub fn topic(&self) -> CallbackTopic {
        self.topic
    }

    pub fn callback_url(&self) -> Option<String> {
        self.callback_url.to_owned()
    }

    pub fn state(&self) -> String {
        self.state.to_owned()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_callback_url(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|url| !url.trim().is_empty()) {
            self.callback_url = Some(url);
        }
    }

    pub fn update_state(&mut self, state: String, terminal: bool) {
        self.state = state;
        self.terminal = terminal;
        self.updated_at = Utc::now();
    }

    pub fn to_payload(&self) -> CallbackPayload {
        CallbackPayload {
            thread_id: self.thread_id.to_owned(),
            topic: self.topic,
            state: self.state.to_owned(),
        }
    }
}

impl TryInto<Vec<u8>> for PendingCallback {
    type Error = IdentityError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for PendingCallback {
    type Error = IdentityError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}
