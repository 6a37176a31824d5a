//! Wire encodings for binary fields.
//!
//! Every binary field has exactly one encoding. Decoding names the field and
//! the alphabet that was expected, so a hex string fed to a base64 decoder
//! surfaces as an encoding error instead of a failed integrity check later.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Text encoding for a binary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Lowercase hexadecimal.
    Hex,
    /// Standard base64 with padding.
    Base64,
}

impl Encoding {
    /// Encode bytes.
    pub fn encode(self, data: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(data),
            Self::Base64 => base64::engine::general_purpose::STANDARD.encode(data),
        }
    }

    /// Decode a field, reporting the field name on failure.
    pub fn decode(self, field: &'static str, data: &str) -> CryptoResult<Vec<u8>> {
        let result = match self {
            Self::Hex => hex::decode(data.trim()).map_err(|e| e.to_string()),
            Self::Base64 => base64::engine::general_purpose::STANDARD
                .decode(data.trim())
                .map_err(|e| e.to_string()),
        };
        result.map_err(|reason| CryptoError::Encoding {
            field,
            encoding: self,
            reason,
        })
    }

    /// Decode a field that must have an exact length.
    pub fn decode_array<const N: usize>(
        self,
        field: &'static str,
        data: &str,
    ) -> CryptoResult<[u8; N]> {
        let bytes = self.decode(field, data)?;
        bytes.try_into().map_err(|v: Vec<u8>| CryptoError::Encoding {
            field,
            encoding: self,
            reason: format!("expected {} bytes, got {}", N, v.len()),
        })
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex => f.write_str("hex"),
            Self::Base64 => f.write_str("base64"),
        }
    }
}

impl FromStr for Encoding {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "base64" => Ok(Self::Base64),
            other => Err(CryptoError::InvalidInput(format!(
                "unknown encoding '{}'",
                other
            ))),
        }
    }
}

/// Serde adapter storing `Vec<u8>` as a base64 string.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Encoding;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Encoding::Base64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        Encoding::Base64
            .decode("bytes", &s)
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter storing `[u8; N]` as a base64 string.
pub mod base64_array {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Encoding;

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Encoding::Base64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        Encoding::Base64
            .decode_array("bytes", &s)
            .map_err(serde::de::Error::custom)
    }
}
