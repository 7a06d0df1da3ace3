use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use crate::identity::types::IdentityError;

use super::types::Rfc23State;

/// `Connection` is one pairwise connection, mutated only by protocol events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Connection {
    connection_id: String,
    owner_did: String,
    target_did: Option<String>,
    rfc23_state: Rfc23State,
    updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(
        connection_id: String,
        owner_did: String,
        target_did: Option<String>,
        state: Rfc23State,
    ) -> Self {
        Self {
            connection_id,
            owner_did,
            target_did,
            rfc23_state: state,
            updated_at: Utc::now(),
        }
    }

    pub fn connection_id(&self) -> String {
        self.connection_id.to_owned()
    }

    pub fn owner_did(&self) -> String {
        self.owner_did.to_owned()
    }

    pub fn target_did(&self) -> Option<String> {
        self.target_did.to_owned()
    }

    pub fn state(&self) -> Rfc23State {
        self.rfc23_state
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn involves(&self, did: &str) -> bool {
        self.owner_did == did || self.target_did.as_deref() == Some(did)
    }

    pub fn set_state(&mut self, state: Rfc23State) {
        self.rfc23_state = state;
        self.updated_at = Utc::now();
    }

    pub fn set_target_did(&mut self, did: Option<String>) {
        if did.is_some() {
            self.target_did = did;
        }
    }
}

impl TryInto<Vec<u8>> for Connection {
    type Error = IdentityError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for Connection {
    type Error = IdentityError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}
