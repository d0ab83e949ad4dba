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

//! The persist-ready form of an instruction batch.
//!
//! An artifact spells out everything needed to rebuild an instruction:
//! the program id, each account reference with its flags, and the payload,
//! all as text. The JSON layout is the one produced by the lending SDK's
//! JavaScript tooling (`programId`, `keys[].pubkey`, `isSigner`,
//! `isWritable`, `data`), so dumps from either side can be read back.
//! `accounts` and `address` are read as aliases of `keys` and `pubkey`, but
//! output always uses the SDK names. A file written with the aliases reads
//! back to the same batch and is rewritten in the SDK layout.
//!
//! Struct field order fixes the output field order, and nothing here is
//! backed by a hash map, so serializing the same batch twice produces
//! identical bytes.

use serde::{Deserialize, Serialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::{
    batch::{DepositInstructions, InstructionBatch},
    encoding::{Encoding, TextEncoding},
    error::{DecodingError, EncodingError},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SerializedInstruction {
    pub program_id: String,

    #[serde(alias = "accounts")]
    pub keys: Vec<SerializedAccount>,

    pub data: String,
}

/// One account reference. The flags are optional only so that a record
/// missing one can be reported precisely instead of defaulting to `false`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAccount {
    #[serde(alias = "address")]
    pub pubkey: String,

    #[serde(default)]
    pub is_signer: Option<bool>,

    #[serde(default)]
    pub is_writable: Option<bool>,
}

impl SerializedAccount {
    pub fn encode(meta: &AccountMeta, encoding: TextEncoding) -> Self {
        Self {
            pubkey: encoding.encode(meta.pubkey.as_ref()),
            is_signer: Some(meta.is_signer),
            is_writable: Some(meta.is_writable),
        }
    }

    /// Decode this record as key `key` of instruction `instruction`.
    pub fn decode(
        &self,
        instruction: usize,
        key: usize,
        encoding: TextEncoding,
    ) -> Result<AccountMeta, DecodingError> {
        let pubkey = decode_address(
            instruction,
            || format!("keys[{key}].pubkey"),
            &self.pubkey,
            encoding,
        )?;
        let is_signer = self.is_signer.ok_or(DecodingError::MissingFlag {
            instruction,
            key,
            flag: "isSigner",
        })?;
        let is_writable = self.is_writable.ok_or(DecodingError::MissingFlag {
            instruction,
            key,
            flag: "isWritable",
        })?;

        Ok(AccountMeta {
            pubkey,
            is_signer,
            is_writable,
        })
    }
}

/// Everything a persisted artifact file may contain.
///
/// A flat list is what [`serialize`] produces. The grouped form is the
/// deposit builder's own output, with its three lists kept apart. All three
/// lists must be present and nothing else may be, so an object that is
/// neither form is an error rather than an empty batch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ArtifactFile {
    Flat(Vec<SerializedInstruction>),
    Grouped(GroupedArtifacts),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupedArtifacts {
    pub setup_ixs: Vec<SerializedInstruction>,
    pub lending_ixs: Vec<SerializedInstruction>,
    pub cleanup_ixs: Vec<SerializedInstruction>,
}

impl ArtifactFile {
    pub fn len(&self) -> usize {
        match self {
            ArtifactFile::Flat(ixs) => ixs.len(),
            ArtifactFile::Grouped(groups) => {
                groups.setup_ixs.len() + groups.lending_ixs.len() + groups.cleanup_ixs.len()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode into the deposit builder's three lists. A flat file has no
    /// grouping, so all of it is treated as lending instructions.
    pub fn into_deposit_instructions(
        self,
        encoding: Encoding,
    ) -> Result<DepositInstructions, DecodingError> {
        match self {
            ArtifactFile::Flat(ixs) => Ok(DepositInstructions {
                lending_ixs: decode_all(&ixs, 0, encoding)?,
                ..Default::default()
            }),
            ArtifactFile::Grouped(groups) => {
                let setup_ixs = decode_all(&groups.setup_ixs, 0, encoding)?;
                let offset = setup_ixs.len();
                let lending_ixs = decode_all(&groups.lending_ixs, offset, encoding)?;
                let offset = offset + lending_ixs.len();
                let cleanup_ixs = decode_all(&groups.cleanup_ixs, offset, encoding)?;

                Ok(DepositInstructions {
                    setup_ixs,
                    lending_ixs,
                    cleanup_ixs,
                })
            }
        }
    }

    /// Decode into one batch: setup, lending, then cleanup for a grouped file.
    pub fn into_batch(self, encoding: Encoding) -> Result<InstructionBatch, DecodingError> {
        self.into_deposit_instructions(encoding)
            .map(DepositInstructions::into_batch)
    }
}

/// Encode every instruction of `batch`, in order.
pub fn serialize(
    batch: &InstructionBatch,
    encoding: Encoding,
) -> Result<Vec<SerializedInstruction>, EncodingError> {
    batch
        .iter()
        .enumerate()
        .map(|(index, ix)| serialize_instruction(index, ix, encoding))
        .collect()
}

pub fn serialize_instruction(
    index: usize,
    ix: &Instruction,
    encoding: Encoding,
) -> Result<SerializedInstruction, EncodingError> {
    if let Some(max) = encoding.data.max_len() {
        if ix.data.len() > max {
            return Err(EncodingError::PayloadTooLarge {
                instruction: index,
                encoding: encoding.data,
                len: ix.data.len(),
                max,
            });
        }
    }

    Ok(SerializedInstruction {
        program_id: encoding.address.encode(ix.program_id.as_ref()),
        keys: ix
            .accounts
            .iter()
            .map(|meta| SerializedAccount::encode(meta, encoding.address))
            .collect(),
        data: encoding.data.encode(&ix.data),
    })
}

/// Rebuild a batch from artifacts written with `encoding`.
pub fn deserialize(
    artifacts: &[SerializedInstruction],
    encoding: Encoding,
) -> Result<InstructionBatch, DecodingError> {
    decode_all(artifacts, 0, encoding).map(InstructionBatch::from)
}

pub fn deserialize_instruction(
    index: usize,
    artifact: &SerializedInstruction,
    encoding: Encoding,
) -> Result<Instruction, DecodingError> {
    let program_id = decode_address(
        index,
        || "programId".to_string(),
        &artifact.program_id,
        encoding.address,
    )?;
    let accounts = artifact
        .keys
        .iter()
        .enumerate()
        .map(|(key, account)| account.decode(index, key, encoding.address))
        .collect::<Result<Vec<_>, _>>()?;
    let data = encoding
        .data
        .decode(&artifact.data)
        .map_err(|reason| DecodingError::InvalidText {
            instruction: index,
            field: "data".to_string(),
            encoding: encoding.data,
            reason,
        })?;

    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}

/// Pretty-printed JSON with two-space indentation.
pub fn to_json_pretty(artifacts: &[SerializedInstruction]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(artifacts)
}

pub fn from_json(json: &str) -> serde_json::Result<ArtifactFile> {
    serde_json::from_str(json)
}

fn decode_all(
    artifacts: &[SerializedInstruction],
    first_index: usize,
    encoding: Encoding,
) -> Result<Vec<Instruction>, DecodingError> {
    artifacts
        .iter()
        .enumerate()
        .map(|(i, artifact)| deserialize_instruction(first_index + i, artifact, encoding))
        .collect()
}

fn decode_address(
    instruction: usize,
    field: impl Fn() -> String,
    text: &str,
    encoding: TextEncoding,
) -> Result<Pubkey, DecodingError> {
    let bytes = encoding
        .decode(text)
        .map_err(|reason| DecodingError::InvalidText {
            instruction,
            field: field(),
            encoding,
            reason,
        })?;
    let array = <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        DecodingError::InvalidAddressLength {
            instruction,
            field: field(),
            len: bytes.len(),
        }
    })?;

    Ok(Pubkey::new_from_array(array))
}
