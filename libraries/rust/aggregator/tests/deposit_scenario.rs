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

use relay_aggregator::{
    deserialize, extract_payloads, filter_by_program, flatten_accounts, serialize, DepositInstructions,
    Encoding, InstructionBatch, Selection,
};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

struct Deposit {
    lending: Pubkey,
    ixs: DepositInstructions,
}

fn deposit() -> Deposit {
    let lending = Pubkey::new_unique();
    let owner = Pubkey::new_unique();
    let reserve = Pubkey::new_unique();
    let obligation = Pubkey::new_unique();

    let a = Instruction {
        program_id: solana_sdk::system_program::ID,
        accounts: vec![AccountMeta::new(owner, true), AccountMeta::new(obligation, false)],
        data: vec![0, 0, 0, 0],
    };
    let b = Instruction {
        program_id: lending,
        accounts: vec![AccountMeta::new(reserve, false)],
        data: vec![7; 8],
    };
    let c = Instruction {
        program_id: lending,
        accounts: vec![
            AccountMeta::new(owner, true),
            AccountMeta::new(obligation, false),
            AccountMeta::new_readonly(reserve, false),
            AccountMeta::new(reserve, false),
        ],
        data: vec![1, 2, 3, 4, 5, 6, 7, 8, 100, 0, 0, 0, 0, 0, 0, 0],
    };
    let d = Instruction {
        program_id: Pubkey::new_unique(),
        accounts: vec![AccountMeta::new(owner, true)],
        data: vec![9],
    };

    Deposit {
        lending,
        ixs: DepositInstructions {
            setup_ixs: vec![a],
            lending_ixs: vec![b, c],
            cleanup_ixs: vec![d],
        },
    }
}

#[test]
fn filtering_a_deposit_keeps_the_lending_instructions() {
    let Deposit { lending, ixs } = deposit();
    let b = ixs.lending_ixs[0].clone();
    let c = ixs.lending_ixs[1].clone();
    let batch = ixs.into_batch();

    let selected = filter_by_program(&batch, &lending);

    assert_eq!(selected.instructions(), &[b.clone(), c.clone()]);
    assert_eq!(flatten_accounts(&selected), [b.accounts, c.accounts].concat());
    assert_eq!(extract_payloads(&selected), vec![b.data, c.data]);
    assert_eq!(batch.len(), 4);
}

#[test]
fn selection_switches_between_all_and_filtered() {
    let Deposit { lending, ixs } = deposit();
    let batch = ixs.into_batch();

    assert_eq!(Selection::All.apply(&batch).len(), 4);
    assert_eq!(Selection::Program(lending).apply(&batch).len(), 2);
}

#[test]
fn empty_batch_filters_to_empty() {
    let selected = filter_by_program(&InstructionBatch::default(), &Pubkey::new_unique());
    assert!(selected.is_empty());
    assert!(flatten_accounts(&selected).is_empty());
}

#[test]
fn deposit_survives_persistence() -> anyhow::Result<()> {
    let batch = deposit().ixs.into_batch();
    let encoding = Encoding::default();

    let json = relay_aggregator::to_json_pretty(&serialize(&batch, encoding)?)?;
    let reread = relay_aggregator::from_json(&json)?.into_batch(encoding)?;
    assert_eq!(reread, batch);

    let artifacts = serialize(&reread, encoding)?;
    assert_eq!(deserialize(&artifacts, encoding)?, batch);
    assert_eq!(relay_aggregator::to_json_pretty(&artifacts)?, json);

    Ok(())
}
