use std::io::{Read, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use rst_common::standard::serde::de::Error as DeError;
use rst_common::standard::serde::ser::Error as SerError;
use rst_common::standard::serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identity::types::IdentityError;

/// 16KB, the minimum list size that keeps holders private inside the crowd
pub const DEFAULT_CAPACITY_BYTES: usize = 16 * 1024;

/// upper bound of a decompressed list, 16MB or about 134 million entries
pub const MAX_LIST_BYTES: usize = 16 * 1024 * 1024;

/// `Bitstring` is the revocation bit vector of one status list.
///
/// Bit `i` lives in byte `i / 8` under the mask `0x80 >> (i % 8)`. The encoded form is
/// the gzip compressed bytes as unpadded base64url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitstring {
    bytes: Vec<u8>,
}

impl Bitstring {
    pub fn new() -> Self {
        Self::with_capacity_bytes(DEFAULT_CAPACITY_BYTES)
    }

    pub fn with_capacity_bytes(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len.max(1)],
        }
    }

    /// number of addressable bits
    pub fn capacity(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn get(&self, index: usize) -> bool {
        self.bytes
            .get(index / 8)
            .map(|byte| byte & (0x80 >> (index % 8)) != 0)
            .unwrap_or(false)
    }

    pub fn set(&mut self, index: usize) {
        while index >= self.capacity() {
            let len = self.bytes.len();
            self.bytes.resize(len * 2, 0);
        }

        self.bytes[index / 8] |= 0x80 >> (index % 8);
    }

    pub fn set_indexes(&self) -> Vec<usize> {
        (0..self.capacity()).filter(|idx| self.get(*idx)).collect()
    }

    pub fn encode(&self) -> Result<String, IdentityError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&self.bytes)
            .map_err(|err| IdentityError::ValidationError(format!("bitstring encode: {err}")))?;

        let compressed = encoder
            .finish()
            .map_err(|err| IdentityError::ValidationError(format!("bitstring encode: {err}")))?;

        Ok(URL_SAFE_NO_PAD.encode(compressed))
    }

    pub fn decode(encoded: &str) -> Result<Self, IdentityError> {
        let compressed = URL_SAFE_NO_PAD
            .decode(encoded.trim().trim_end_matches('='))
            .map_err(|err| IdentityError::ValidationError(format!("bitstring decode: {err}")))?;

        // one byte over the cap is enough to tell an oversized list apart
        let mut bytes = Vec::new();
        let _ = GzDecoder::new(compressed.as_slice())
            .take(MAX_LIST_BYTES as u64 + 1)
            .read_to_end(&mut bytes)
            .map_err(|err| IdentityError::ValidationError(format!("bitstring decode: {err}")))?;

        if bytes.len() > MAX_LIST_BYTES {
            return Err(IdentityError::ValidationError(format!(
                "bitstring decode: list larger than {MAX_LIST_BYTES} bytes"
            )));
        }

        if bytes.is_empty() {
            return Err(IdentityError::ValidationError(
                "bitstring decode: empty list".to_string(),
            ));
        }

        Ok(Self { bytes })
    }
}

impl Default for Bitstring {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Bitstring {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = self.encode().map_err(S::Error::custom)?;
        serializer.serialize_str(encoded.as_str())
    }
}

impl<'de> Deserialize<'de> for Bitstring {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = <String as Deserialize>::deserialize(deserializer)?;
        Bitstring::decode(encoded.as_str()).map_err(D::Error::custom)
    }
}
