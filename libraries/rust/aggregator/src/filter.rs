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

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use crate::batch::InstructionBatch;

/// Which instructions of a batch get forwarded or persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every instruction, in batch order.
    #[default]
    All,

    /// Only instructions directed at this program.
    Program(Pubkey),
}

impl Selection {
    pub fn matches(&self, ix: &Instruction) -> bool {
        match self {
            Selection::All => true,
            Selection::Program(program_id) => ix.program_id == *program_id,
        }
    }

    pub fn apply(&self, batch: &InstructionBatch) -> InstructionBatch {
        match self {
            Selection::All => batch.clone(),
            Selection::Program(program_id) => filter_by_program(batch, program_id),
        }
    }
}

impl From<Option<Pubkey>> for Selection {
    fn from(program_id: Option<Pubkey>) -> Self {
        program_id.map(Selection::Program).unwrap_or_default()
    }
}

/// The subsequence of `batch` for which `predicate` holds, in original order.
pub fn filter(
    batch: &InstructionBatch,
    predicate: impl Fn(&Instruction) -> bool,
) -> InstructionBatch {
    batch.iter().filter(|&ix| predicate(ix)).cloned().collect()
}

/// The instructions in `batch` whose program id is `program_id`, in
/// original order. No match yields an empty batch.
pub fn filter_by_program(batch: &InstructionBatch, program_id: &Pubkey) -> InstructionBatch {
    let selected = filter(batch, |ix| ix.program_id == *program_id);

    if selected.is_empty() {
        log::debug!(
            "none of {} instructions target program {program_id}",
            batch.len()
        );
    }

    selected
}
