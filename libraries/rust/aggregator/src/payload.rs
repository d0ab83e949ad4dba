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

use crate::batch::InstructionBatch;

/// The data of each instruction in batch order, uninterpreted.
pub fn extract_payloads(batch: &InstructionBatch) -> Vec<Vec<u8>> {
    batch.iter().map(|ix| ix.data.clone()).collect()
}

/// Total payload bytes across the batch.
pub fn payload_len(batch: &InstructionBatch) -> usize {
    batch.iter().map(|ix| ix.data.len()).sum()
}

#[cfg(test)]
mod tests {
    use solana_sdk::pubkey::Pubkey;

    use super::*;
    use crate::batch::tests::ix;

    #[test]
    fn payloads_in_batch_order() {
        let p = Pubkey::new_unique();
        let batch = InstructionBatch::new(vec![
            ix(p, vec![], &[3, 2, 1]),
            ix(p, vec![], &[]),
            ix(Pubkey::new_unique(), vec![], &[0xff; 40]),
        ]);

        let payloads = extract_payloads(&batch);

        assert_eq!(payloads, vec![vec![3, 2, 1], vec![], vec![0xff; 40]]);
        assert_eq!(payload_len(&batch), 43);
    }
}
