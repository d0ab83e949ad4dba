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

use thiserror::Error;

use crate::encoding::TextEncoding;

/// Raised when a batch cannot be represented in the requested text encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("instruction {instruction}: {len} byte payload exceeds the {max} byte limit for {encoding}")]
    PayloadTooLarge {
        instruction: usize,
        encoding: TextEncoding,
        len: usize,
        max: usize,
    },
}

/// Raised when serialized input cannot be turned back into instructions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    #[error("instruction {instruction}: invalid {encoding} in {field}: {reason}")]
    InvalidText {
        instruction: usize,
        field: String,
        encoding: TextEncoding,
        reason: String,
    },

    #[error("instruction {instruction}: {field} decodes to {len} bytes, expected 32")]
    InvalidAddressLength {
        instruction: usize,
        field: String,
        len: usize,
    },

    #[error("instruction {instruction}, key {key}: missing required flag `{flag}`")]
    MissingFlag {
        instruction: usize,
        key: usize,
        flag: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Decoding(#[from] DecodingError),

    #[error("failed to serialize forwarded payloads: {0}")]
    Forward(#[from] std::io::Error),

    #[error("failed to encode transaction: {0}")]
    Transaction(#[from] bincode::Error),

    #[error("malformed artifact json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = AggregatorError> = std::result::Result<T, E>;
