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

use crate::{batch::InstructionBatch, encoding::TextEncoding};

/// Human readable listing of a batch, one block per instruction.
pub fn describe(batch: &InstructionBatch) -> String {
    Listing(batch).to_string()
}

pub struct Listing<'a>(pub &'a InstructionBatch);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "(no instructions)");
        }
        for (index, ix) in self.0.iter().enumerate() {
            writeln!(f, "Instruction {index}:")?;
            writeln!(f, "  Program ID: {}", ix.program_id)?;
            for key in &ix.accounts {
                writeln!(f, "  - Account: {}", key.pubkey)?;
                writeln!(f, "    Is Signer: {}", key.is_signer)?;
                writeln!(f, "    Is Writable: {}", key.is_writable)?;
            }
            writeln!(
                f,
                "  Data ({} bytes): {}",
                ix.data.len(),
                TextEncoding::Base64.encode(&ix.data)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};

    use super::*;
    use crate::batch::tests::ix;

    #[test]
    fn lists_every_account() {
        let program = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let batch = InstructionBatch::from(ix(program, vec![AccountMeta::new(owner, true)], b"hello"));

        let text = describe(&batch);

        assert_eq!(
            text,
            format!(
                "Instruction 0:\n  Program ID: {program}\n  - Account: {owner}\n    \
                 Is Signer: true\n    Is Writable: true\n  Data (5 bytes): aGVsbG8=\n"
            )
        );
    }

    #[test]
    fn empty_batch() {
        assert_eq!(describe(&InstructionBatch::default()), "(no instructions)\n");
    }
}
