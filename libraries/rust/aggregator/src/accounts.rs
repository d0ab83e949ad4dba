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

use serde::{Deserialize, Serialize};
use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};

use crate::batch::InstructionBatch;

/// How repeated account references are treated when flattening.
///
/// The same address legitimately appears in several instructions, often
/// with different flags. Nothing is ever collapsed unless a caller asks
/// for it here.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// Keep every reference exactly as the instructions list them.
    #[default]
    Preserve,

    /// Drop a reference only when an earlier one has the same address
    /// *and* the same signer and writable flags.
    Exact,

    /// One reference per address, placed where the address first appears.
    /// The flags are the most permissive seen for that address: signer if
    /// any reference signs, writable if any reference writes. Never
    /// downgrades a writable or signer reference.
    MergeByAddress,
}

impl std::str::FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preserve" | "none" => Ok(DedupPolicy::Preserve),
            "exact" => Ok(DedupPolicy::Exact),
            "merge-by-address" | "merge" => Ok(DedupPolicy::MergeByAddress),
            other => Err(format!("unknown dedup policy: {other}")),
        }
    }
}

/// Every account reference of every instruction, in batch order, with the
/// order inside each instruction preserved. Repeats are kept.
pub fn flatten_accounts(batch: &InstructionBatch) -> Vec<AccountMeta> {
    batch
        .iter()
        .flat_map(|ix| ix.accounts.iter().cloned())
        .collect()
}

/// [`flatten_accounts`] followed by [`dedup_accounts`].
pub fn flatten_accounts_with(batch: &InstructionBatch, policy: DedupPolicy) -> Vec<AccountMeta> {
    dedup_accounts(flatten_accounts(batch), policy)
}

pub fn dedup_accounts(metas: Vec<AccountMeta>, policy: DedupPolicy) -> Vec<AccountMeta> {
    let before = metas.len();
    let result = match policy {
        DedupPolicy::Preserve => return metas,
        DedupPolicy::Exact => {
            let mut kept: Vec<AccountMeta> = Vec::with_capacity(metas.len());
            for meta in metas {
                if !kept.contains(&meta) {
                    kept.push(meta);
                }
            }
            kept
        }
        DedupPolicy::MergeByAddress => {
            let mut merged: Vec<AccountMeta> = Vec::with_capacity(metas.len());
            for meta in metas {
                match merged.iter_mut().find(|m| m.pubkey == meta.pubkey) {
                    Some(existing) => {
                        existing.is_signer |= meta.is_signer;
                        existing.is_writable |= meta.is_writable;
                    }
                    None => merged.push(meta),
                }
            }
            merged
        }
    };

    log::trace!(
        "{policy:?} dedup: {before} account references -> {}",
        result.len()
    );
    result
}

/// Addresses that must sign for the batch, in first-seen order.
pub fn signers(batch: &InstructionBatch) -> Vec<Pubkey> {
    let mut signers = Vec::new();
    for meta in batch.iter().flat_map(|ix| ix.accounts.iter()) {
        if meta.is_signer && !signers.contains(&meta.pubkey) {
            signers.push(meta.pubkey);
        }
    }
    signers
}
