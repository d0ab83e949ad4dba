// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2022 JET PROTOCOL HOLDINGS, LLC.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::fmt;

use serde::{Deserialize, Serialize};
use solana_sdk::packet::PACKET_DATA_SIZE;

/// Byte-to-text encodings understood by the artifact format.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Base58,
    Base64,
}

impl TextEncoding {
    /// Largest payload this encoding will accept. Base58 is quadratic in
    /// the input length, so it is limited to what fits in one packet.
    pub fn max_len(&self) -> Option<usize> {
        match self {
            TextEncoding::Base58 => Some(PACKET_DATA_SIZE),
            TextEncoding::Base64 => None,
        }
    }

    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Base58 => bs58::encode(bytes).into_string(),
            TextEncoding::Base64 => base64::encode(bytes),
        }
    }

    /// Decode `text`, returning the decoder's complaint on failure.
    ///
    /// Only the text [`TextEncoding::encode`] would produce is accepted, so
    /// decoding and encoding again always gives back the same string.
    pub fn decode(&self, text: &str) -> Result<Vec<u8>, String> {
        let bytes = match self {
            TextEncoding::Base58 => bs58::decode(text).into_vec().map_err(|e| e.to_string())?,
            TextEncoding::Base64 => base64::decode(text).map_err(|e| e.to_string())?,
        };
        if self.encode(&bytes) != text {
            return Err(format!("non-canonical {self} text"));
        }
        Ok(bytes)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Base58 => f.write_str("base58"),
            TextEncoding::Base64 => f.write_str("base64"),
        }
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base58" | "bs58" => Ok(TextEncoding::Base58),
            "base64" | "b64" => Ok(TextEncoding::Base64),
            other => Err(format!("unknown encoding: {other}")),
        }
    }
}

/// The encodings used for one artifact: addresses (program ids and account
/// keys) and instruction payloads are chosen separately.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Encoding {
    pub address: TextEncoding,
    pub data: TextEncoding,
}

impl Encoding {
    pub fn new(address: TextEncoding, data: TextEncoding) -> Self {
        Self { address, data }
    }
}

impl Default for Encoding {
    /// Base58 addresses and base64 payloads, matching what wallets and
    /// explorers display.
    fn default() -> Self {
        Self {
            address: TextEncoding::Base58,
            data: TextEncoding::Base64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(TextEncoding::Base64.encode(b"hello"), "aGVsbG8=");
        assert_eq!(TextEncoding::Base58.encode(&[0, 0, 1]), "112");
        assert_eq!(TextEncoding::Base58.encode(&[]), "");
    }

    #[test]
    fn rejects_garbage() {
        assert!(TextEncoding::Base58.decode("0OIl").is_err());
        assert!(TextEncoding::Base64.decode("not base64!").is_err());
    }

    #[test]
    fn rejects_non_canonical_text() {
        assert_eq!(TextEncoding::Base64.decode("AQI="), Ok(vec![1, 2]));
        assert!(TextEncoding::Base64.decode("AQI").is_err());
        assert!(TextEncoding::Base64.decode("AQJ=").is_err());
        assert_eq!(TextEncoding::Base58.decode("112"), Ok(vec![0, 0, 1]));
    }

    #[test]
    fn parses_names() {
        assert_eq!("BASE58".parse::<TextEncoding>(), Ok(TextEncoding::Base58));
        assert_eq!("b64".parse::<TextEncoding>(), Ok(TextEncoding::Base64));
        assert!("hex".parse::<TextEncoding>().is_err());
    }
}
