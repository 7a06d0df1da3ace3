use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, json};

use crate::identity::types::IdentityError;
use crate::identity::verifiable::vc::{VerifiableCredential, CONTEXT_STATUS_LIST_2021};

use super::bitstring::Bitstring;
use super::types::{STATUS_LIST_CREDENTIAL_TYPE, STATUS_LIST_SUBJECT_TYPE, STATUS_PURPOSE_REVOCATION};

/// `RevocationList` is the status list of one wallet profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct RevocationList {
    profile_name: String,
    bitstring: Bitstring,
    next_index: usize,
    last_issued_credential: Option<VerifiableCredential>,
    dirty: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RevocationList {
    /// a new list starts dirty, it has never been issued
    pub fn new(profile_name: String) -> Self {
        let now = Utc::now();
        Self {
            profile_name,
            bitstring: Bitstring::new(),
            next_index: 0,
            last_issued_credential: None,
            dirty: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile_name(&self) -> String {
        self.profile_name.to_owned()
    }

    pub fn bitstring(&self) -> &Bitstring {
        &self.bitstring
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_issued_credential(&self) -> Option<VerifiableCredential> {
        self.last_issued_credential.to_owned()
    }

    /// `allocate_index` hands out the next unused index, never reusing one
    pub fn allocate_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        self.updated_at = Utc::now();
        index
    }

    pub fn revoke(&mut self, index: usize) -> Result<(), IdentityError> {
        if index >= self.next_index {
            return Err(IdentityError::ValidationError(format!(
                "index {index} was never allocated for {}",
                self.profile_name
            )));
        }

        self.bitstring.set(index);
        self.dirty = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `set_issued` stores a freshly signed credential built from `issued_bits`, the list
    /// stays dirty when its bits moved on since the snapshot was taken
    pub fn set_issued(&mut self, credential: VerifiableCredential, issued_bits: &Bitstring) {
        self.dirty = self.bitstring != *issued_bits;
        self.last_issued_credential = Some(credential);
        self.updated_at = Utc::now();
    }
}

/// `build_status_list_credential` builds the unsigned credential wrapping an encoded bitstring
pub fn build_status_list_credential(
    issuer_did: String,
    list_url: String,
    bits: &Bitstring,
) -> Result<VerifiableCredential, IdentityError> {
    let subject = json!({
        "id": format!("{}#list", list_url),
        "type": STATUS_LIST_SUBJECT_TYPE,
        "statusPurpose": STATUS_PURPOSE_REVOCATION,
        "encodedList": bits.encode()?,
    });

    let mut credential = VerifiableCredential::new(
        list_url,
        issuer_did,
        vec![STATUS_LIST_CREDENTIAL_TYPE.to_string()],
        subject,
    );
    credential.add_context(CONTEXT_STATUS_LIST_2021);
    credential.issuance_date = Some(Utc::now());

    Ok(credential)
}

/// `decode_status_list_credential` extracts the bitstring carried by a status list credential
pub fn decode_status_list_credential(
    credential: &VerifiableCredential,
) -> Result<Bitstring, IdentityError> {
    let encoded = credential
        .credential_subject
        .get("encodedList")
        .and_then(|val| val.as_str())
        .ok_or(IdentityError::ValidationError(
            "status list credential has no encodedList".to_string(),
        ))?;

    Bitstring::decode(encoded)
}

impl TryInto<Vec<u8>> for RevocationList {
    type Error = IdentityError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for RevocationList {
    type Error = IdentityError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| IdentityError::JSONError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_monotonic() {
        let mut list = RevocationList::new("BPNL1".to_string());
        assert!(list.is_dirty());
        assert_eq!(list.allocate_index(), 0);
        assert_eq!(list.allocate_index(), 1);
        assert_eq!(list.next_index(), 2);
    }

    #[test]
    fn test_revoke_unallocated() {
        let mut list = RevocationList::new("BPNL1".to_string());
        assert!(list.revoke(0).is_err());

        let _ = list.allocate_index();
        assert!(list.revoke(0).is_ok());
        assert!(list.bitstring().get(0));
    }

    #[test]
    fn test_set_issued_tracks_dirty() {
        let mut list = RevocationList::new("BPNL1".to_string());
        let _ = list.allocate_index();
        let snapshot = list.bitstring().clone();

        let credential = build_status_list_credential(
            "did:web:issuer".to_string(),
            "https://warden.example/status/BPNL1".to_string(),
            &snapshot,
        )
        .unwrap();

        list.set_issued(credential.clone(), &snapshot);
        assert!(!list.is_dirty());

        let _ = list.revoke(0);
        assert!(list.is_dirty());

        list.set_issued(credential, &snapshot);
        assert!(list.is_dirty());
    }

    #[test]
    fn test_status_list_credential_roundtrip() {
        let mut bits = Bitstring::new();
        bits.set(0);
        bits.set(42);

        let credential = build_status_list_credential(
            "did:web:issuer".to_string(),
            "https://warden.example/status/BPNL1".to_string(),
            &bits,
        )
        .unwrap();

        assert!(credential.has_type(STATUS_LIST_CREDENTIAL_TYPE));
        assert_eq!(
            credential.id,
            Some("https://warden.example/status/BPNL1".to_string())
        );

        let decoded = decode_status_list_credential(&credential).unwrap();
        assert_eq!(decoded, bits);
    }

    #[test]
    fn test_entity_bytes_roundtrip() {
        let mut list = RevocationList::new("BPNL1".to_string());
        let _ = list.allocate_index();
        let _ = list.revoke(0);

        let bytes: Vec<u8> = list.clone().try_into().unwrap();
        let back = RevocationList::try_from(bytes).unwrap();
        assert_eq!(back, list);
    }
}
