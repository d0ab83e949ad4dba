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

//! Builds the call that relays a batch into a wrapper program.
//!
//! The wrapper takes the payload of every forwarded instruction as a single
//! `Vec<Vec<u8>>` argument and receives their accounts as remaining
//! accounts, which it consumes in order when re-issuing each instruction.

use borsh::BorshSerialize;
use solana_sdk::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    message::Message,
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};

use crate::{
    accounts::{flatten_accounts_with, DedupPolicy},
    batch::InstructionBatch,
    error::Result,
    payload::extract_payloads,
};

/// The account contract of the wrapper program's entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperInterface {
    pub program_id: Pubkey,

    /// Name of the wrapper method, used to derive its discriminator
    pub method: String,

    /// Statically declared accounts, placed ahead of the forwarded ones.
    pub accounts: Vec<AccountMeta>,
}

impl WrapperInterface {
    pub fn new(program_id: Pubkey, method: impl Into<String>) -> Self {
        Self {
            program_id,
            method: method.into(),
            accounts: vec![],
        }
    }

    pub fn with_account(mut self, meta: AccountMeta) -> Self {
        self.accounts.push(meta);
        self
    }

    /// First 8 bytes of `sha256("global:<method>")`.
    pub fn discriminator(&self) -> [u8; 8] {
        let preimage = format!("global:{}", self.method);
        let mut discriminator = [0u8; 8];
        discriminator.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
        discriminator
    }
}

/// Everything needed to relay one batch through the wrapper.
#[derive(Debug, Clone)]
pub struct ForwardPlan {
    pub interface: WrapperInterface,
    pub payloads: Vec<Vec<u8>>,
    pub remaining_accounts: Vec<AccountMeta>,
}

impl ForwardPlan {
    pub fn new(interface: &WrapperInterface, batch: &InstructionBatch, policy: DedupPolicy) -> Self {
        Self {
            interface: interface.clone(),
            payloads: extract_payloads(batch),
            remaining_accounts: flatten_accounts_with(batch, policy),
        }
    }

    /// Discriminator followed by the borsh encoded payload list.
    pub fn data(&self) -> Result<Vec<u8>> {
        let args = self.payloads.try_to_vec()?;
        let mut data = Vec::with_capacity(8 + args.len());
        data.extend_from_slice(&self.interface.discriminator());
        data.extend(args);
        Ok(data)
    }

    pub fn instruction(&self) -> Result<Instruction> {
        let accounts = self
            .interface
            .accounts
            .iter()
            .chain(self.remaining_accounts.iter())
            .cloned()
            .collect();

        Ok(Instruction {
            program_id: self.interface.program_id,
            accounts,
            data: self.data()?,
        })
    }

    /// Size in bytes of the signed legacy transaction that sends `prefix`
    /// followed by the wrapper call, paid for by `payer`.
    pub fn encoded_size(&self, payer: &Pubkey, prefix: &[Instruction]) -> Result<usize> {
        let mut ixs = prefix.to_vec();
        ixs.push(self.instruction()?);

        let mut tx = Transaction::new_unsigned(Message::new(&ixs, Some(payer)));
        tx.signatures = (0..tx.message.header.num_required_signatures)
            .map(|_| Signature::new_unique())
            .collect();

        Ok(bincode::serialize(&tx)?.len())
    }

    pub fn fits_in_transaction(&self, payer: &Pubkey, prefix: &[Instruction]) -> Result<bool> {
        let size = self.encoded_size(payer, prefix)?;
        log::debug!("forward transaction is {size} of {PACKET_DATA_SIZE} bytes");
        Ok(size <= PACKET_DATA_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use solana_sdk::{
        compute_budget::ComputeBudgetInstruction,
        hash::Hash,
        signature::{Keypair, Signer},
    };

    use super::*;
    use crate::batch::tests::ix;

    fn interface() -> WrapperInterface {
        WrapperInterface::new(Pubkey::new_unique(), "execute_kamino_operations")
            .with_account(AccountMeta::new_readonly(Pubkey::new_unique(), false))
    }

    #[test]
    fn discriminator_matches_anchor() {
        let init = WrapperInterface::new(Pubkey::default(), "initialize");
        assert_eq!(init.discriminator(), [175, 175, 109, 31, 13, 152, 155, 237]);
    }

    #[test]
    fn data_is_discriminator_then_borsh_payloads() {
        let p = Pubkey::new_unique();
        let batch = InstructionBatch::new(vec![ix(p, vec![], &[1, 2]), ix(p, vec![], &[])]);
        let wrapper = interface();
        let plan = ForwardPlan::new(&wrapper, &batch, DedupPolicy::Preserve);

        let data = plan.data().unwrap();

        assert_eq!(data[..8], wrapper.discriminator());
        assert_eq!(data[8..], [2, 0, 0, 0, 2, 0, 0, 0, 1, 2, 0, 0, 0, 0]);
    }

    #[test]
    fn interface_accounts_come_first() {
        let user = Pubkey::new_unique();
        let reserve = Pubkey::new_unique();
        let batch = InstructionBatch::new(vec![
            ix(
                Pubkey::new_unique(),
                vec![AccountMeta::new(user, true), AccountMeta::new_readonly(reserve, false)],
                &[0],
            ),
            ix(
                Pubkey::new_unique(),
                vec![AccountMeta::new(reserve, false)],
                &[1],
            ),
        ]);
        let wrapper = interface();

        let preserved = ForwardPlan::new(&wrapper, &batch, DedupPolicy::Preserve)
            .instruction()
            .unwrap();
        assert_eq!(preserved.program_id, wrapper.program_id);
        assert_eq!(preserved.accounts[0], wrapper.accounts[0]);
        assert_eq!(preserved.accounts[1..], *crate::flatten_accounts(&batch));

        let merged = ForwardPlan::new(&wrapper, &batch, DedupPolicy::MergeByAddress)
            .instruction()
            .unwrap();
        assert_eq!(
            merged.accounts[1..],
            [AccountMeta::new(user, true), AccountMeta::new(reserve, false)]
        );
    }

    #[test]
    fn size_check() {
        let payer = Pubkey::new_unique();
        let p = Pubkey::new_unique();
        let small = InstructionBatch::from(ix(p, vec![AccountMeta::new(payer, true)], &[0; 16]));
        let large = InstructionBatch::from(ix(p, vec![], &[0; PACKET_DATA_SIZE]));

        let small = ForwardPlan::new(&interface(), &small, DedupPolicy::Preserve);
        let large = ForwardPlan::new(&interface(), &large, DedupPolicy::Preserve);

        assert!(small.fits_in_transaction(&payer, &[]).unwrap());
        assert!(!large.fits_in_transaction(&payer, &[]).unwrap());
        assert!(small.encoded_size(&payer, &[]).unwrap() < large.encoded_size(&payer, &[]).unwrap());
    }

    #[test]
    fn size_matches_signed_transaction() {
        let payer = Keypair::new();
        let p = Pubkey::new_unique();
        let batch = InstructionBatch::new(vec![
            ix(p, vec![AccountMeta::new(payer.pubkey(), true)], &[3; 40]),
            ix(p, vec![AccountMeta::new(Pubkey::new_unique(), false)], &[4; 200]),
        ]);
        let plan = ForwardPlan::new(&interface(), &batch, DedupPolicy::Preserve);
        let budget = [ComputeBudgetInstruction::set_compute_unit_limit(400_000)];
        let none: &[Instruction] = &[];

        for prefix in [&budget[..], none] {
            let mut ixs = prefix.to_vec();
            ixs.push(plan.instruction().unwrap());
            let signed = Transaction::new_signed_with_payer(
                &ixs,
                Some(&payer.pubkey()),
                &[&payer],
                Hash::new_unique(),
            );

            assert_eq!(
                plan.encoded_size(&payer.pubkey(), prefix).unwrap(),
                bincode::serialize(&signed).unwrap().len()
            );
        }
    }
}
