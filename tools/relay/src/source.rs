//! Where deposit instructions come from.
//!
//! The lending protocol's SDK builds the actual deposit. This module only
//! describes what was asked of it and how its output is brought in.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use relay_aggregator::{
    filter_by_program, flatten_accounts, signers, DepositInstructions, Encoding, InstructionBatch,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::pubkey::Pubkey;

use crate::persist::read_artifacts;

/// What a deposit was built for. A dump is only used when it matches.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepositRequest {
    #[serde_as(as = "DisplayFromStr")]
    pub market: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub lending_program_id: Pubkey,

    /// In base units of `mint`
    pub amount: u64,

    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub owner: Pubkey,
}

impl DepositRequest {
    /// Every way `ixs` disagrees with this request.
    ///
    /// The lending program must be invoked, the market must be among the
    /// accounts of those lending instructions, the mint must be referenced
    /// somewhere and the owner must sign.
    pub fn mismatches(&self, ixs: &DepositInstructions) -> Vec<String> {
        let batch = InstructionBatch::from(ixs.clone());
        let lending = filter_by_program(&batch, &self.lending_program_id);
        let mut problems = vec![];

        if lending.is_empty() {
            problems.push(format!(
                "no instruction targets lending program {}",
                self.lending_program_id
            ));
        } else if !flatten_accounts(&lending)
            .iter()
            .any(|meta| meta.pubkey == self.market)
        {
            problems.push(format!(
                "market {} is not used by any lending instruction",
                self.market
            ));
        }
        if !flatten_accounts(&batch)
            .iter()
            .any(|meta| meta.pubkey == self.mint)
        {
            problems.push(format!("mint {} is not referenced", self.mint));
        }
        if !signers(&batch).contains(&self.owner) {
            problems.push(format!("owner {} does not sign any instruction", self.owner));
        }

        problems
    }
}

#[async_trait(?Send)]
pub trait DepositInstructionSource {
    async fn build_deposit(&self, request: &DepositRequest) -> Result<DepositInstructions>;
}

/// Reads the instructions an SDK run dumped to disk, either as a flat list
/// or grouped into setup, lending and cleanup.
pub struct DumpFileSource {
    pub path: PathBuf,
    pub encoding: Encoding,
}

impl DumpFileSource {
    pub fn new(path: impl Into<PathBuf>, encoding: Encoding) -> Self {
        Self {
            path: path.into(),
            encoding,
        }
    }

    /// The dumped instructions, without checking them against any request.
    pub async fn load(&self) -> Result<DepositInstructions> {
        let file = read_artifacts(&self.path).await?;
        log::info!("read {} instructions from {:?}", file.len(), self.path);

        file.into_deposit_instructions(self.encoding)
            .with_context(|| format!("decoding instructions in {:?}", self.path))
    }
}

#[async_trait(?Send)]
impl DepositInstructionSource for DumpFileSource {
    async fn build_deposit(&self, request: &DepositRequest) -> Result<DepositInstructions> {
        if request.amount == 0 {
            bail!("deposit amount must be greater than zero");
        }

        let ixs = self.load().await?;
        let problems = request.mismatches(&ixs);
        if !problems.is_empty() {
            bail!(
                "{:?} does not hold the requested deposit: {}",
                self.path,
                problems.join("; ")
            );
        }

        log::debug!(
            "deposit of {} {} into market {} by {}",
            request.amount,
            request.mint,
            request.market,
            request.owner
        );

        Ok(ixs)
    }
}
