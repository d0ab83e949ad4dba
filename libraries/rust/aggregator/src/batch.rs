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

/// An ordered group of instructions produced by an external builder.
///
/// Order is significant and is never changed by anything in this crate.
/// Operations that select or transform instructions borrow the batch and
/// return a new one.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InstructionBatch {
    instructions: Vec<Instruction>,
}

impl InstructionBatch {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Distinct program ids in order of first appearance
    pub fn program_ids(&self) -> Vec<Pubkey> {
        let mut seen = Vec::new();
        for ix in &self.instructions {
            if !seen.contains(&ix.program_id) {
                seen.push(ix.program_id);
            }
        }
        seen
    }

    /// Total number of account references across every instruction,
    /// counting repeats.
    pub fn account_count(&self) -> usize {
        self.instructions.iter().map(|ix| ix.accounts.len()).sum()
    }
}

impl From<Vec<Instruction>> for InstructionBatch {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

impl From<Instruction> for InstructionBatch {
    fn from(ix: Instruction) -> Self {
        Self {
            instructions: vec![ix],
        }
    }
}

impl FromIterator<Instruction> for InstructionBatch {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for InstructionBatch {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.into_iter()
    }
}

impl<'a> IntoIterator for &'a InstructionBatch {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

/// The three instruction lists a lending SDK returns for a deposit.
///
/// Setup instructions create whatever the deposit needs (obligation, farm
/// state, token accounts), lending instructions refresh state and perform
/// the deposit, cleanup instructions run afterwards.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DepositInstructions {
    pub setup_ixs: Vec<Instruction>,
    pub lending_ixs: Vec<Instruction>,
    pub cleanup_ixs: Vec<Instruction>,
}

impl DepositInstructions {
    pub fn len(&self) -> usize {
        self.setup_ixs.len() + self.lending_ixs.len() + self.cleanup_ixs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Setup, then lending, then cleanup.
    pub fn into_batch(self) -> InstructionBatch {
        let mut instructions = self.setup_ixs;
        instructions.extend(self.lending_ixs);
        instructions.extend(self.cleanup_ixs);
        InstructionBatch::from(instructions)
    }
}

impl From<DepositInstructions> for InstructionBatch {
    fn from(ixs: DepositInstructions) -> Self {
        ixs.into_batch()
    }
}
