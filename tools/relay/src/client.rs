use std::{
    borrow::Cow,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Result};

use dialoguer::Confirm;
use indicatif::ProgressBar;
use solana_cli_config::{Config as SolanaConfig, CONFIG_FILE as SOLANA_CONFIG_FILE};
use solana_client::{
    client_error::ClientErrorKind,
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcSendTransactionConfig,
    rpc_request::{RpcError, RpcResponseErrorData},
};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    compute_budget::ComputeBudgetInstruction,
    instruction::Instruction,
    pubkey::Pubkey,
    signer::Signer,
    transaction::Transaction,
};

const CONFIRM_DEADLINE: Duration = Duration::from_secs(90);

pub struct ClientConfig {
    /// If true, the transaction will be simulated but not actually submitted.
    dry_run: bool,

    /// If true, will not ask user to confirm before submitting
    no_confirm: bool,

    /// The solana rpc client
    rpc_client: RpcClient,

    /// The user wallet, which pays for and signs the transaction
    signer: Option<Arc<dyn Signer>>,

    /// Set compute budget to
    compute_budget: Option<u32>,
}

impl ClientConfig {
    /// Endpoint and signer fall back to the Solana CLI config when not given.
    pub fn new(
        dry_run: bool,
        no_confirm: bool,
        signer_path: Option<String>,
        rpc_endpoint: Option<String>,
        compute_budget: Option<u32>,
    ) -> Result<ClientConfig> {
        let solana_config = SOLANA_CONFIG_FILE
            .as_ref()
            .and_then(|path| SolanaConfig::load(path).ok())
            .unwrap_or_default();
        let rpc_url = rpc_endpoint.unwrap_or(solana_config.json_rpc_url);
        let rpc_client = RpcClient::new(rpc_url);
        let mut remote_wallet_manager = None;

        let signer = solana_clap_utils::keypair::signer_from_path(
            &Default::default(),
            signer_path.as_ref().unwrap_or(&solana_config.keypair_path),
            "wallet",
            &mut remote_wallet_manager,
        )
        .map(Arc::from)
        .map_err(|e| log::warn!("no usable signer: {e}"))
        .ok();

        Ok(ClientConfig {
            dry_run,
            no_confirm,
            rpc_client,
            signer,
            compute_budget,
        })
    }
}

/// Signs and sends the forwarding transaction
pub struct Client {
    pub config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        log::info!("using rpc endpoint {}", config.rpc_client.url());
        Client { config }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.config.rpc_client
    }

    pub fn signer(&self) -> Result<Pubkey> {
        match &self.config.signer {
            Some(signer) => Ok(signer.pubkey()),
            None => bail!("no wallet/signer configured"),
        }
    }

    pub fn plan(&self) -> Result<PlanBuilder> {
        Ok(PlanBuilder::new(self.signer()?, self.config.compute_budget))
    }

    /// Sign the planned transaction, then simulate or submit it
    pub async fn execute(&self, plan: Plan) -> Result<()> {
        let mut planned = match plan.transaction {
            Some(planned) => planned,
            None => {
                println!("nothing to submit");
                return Ok(());
            }
        };

        if self.config.dry_run {
            println!("this is a dry run");
        }

        let signer = match &self.config.signer {
            Some(signer) => signer,
            None => bail!("no wallet/signer configured"),
        };

        let tx_size = planned.transaction.message().serialize().len();
        println!("planning to submit a transaction (message size {tx_size}):");
        for (i, step) in planned.steps.iter().enumerate() {
            println!("\t [{i}] {step}");
        }
        println!();

        if !self.config.no_confirm {
            let confirmed = Confirm::new()
                .with_prompt("Submit this transaction?")
                .default(false)
                .interact()?;

            if !confirmed {
                bail!("submission aborted");
            }
        }

        let spinner = Spinner::new(self.config.no_confirm, "signing");

        let recent_blockhash = self.rpc().get_latest_blockhash().await?;
        planned
            .transaction
            .try_sign(&[&**signer], recent_blockhash)?;

        match self.config.dry_run {
            false => {
                self.submit_transaction(&planned.transaction, &spinner)
                    .await?;
                println!("submitted the transaction");
            }
            true => {
                self.simulate_transaction(&planned.transaction, &spinner)
                    .await?;
                println!("simulated the transaction");
            }
        }
        Ok(())
    }

    async fn simulate_transaction(&self, transaction: &Transaction, ui_progress: &Spinner) -> Result<()> {
        ui_progress.set_message("simulating");

        let result = self.rpc().simulate_transaction(transaction).await?;

        if let Some(e) = result.value.err {
            ui_progress.abandon_with_message("failed");

            bail!(
                "simulation failed '{e}': {:#?}",
                result.value.logs.unwrap_or_default()
            );
        }

        log::debug!(
            "simulation logs: {:#?}",
            result.value.logs.unwrap_or_default()
        );
        ui_progress.finish_with_message("success");
        Ok(())
    }

    async fn submit_transaction(&self, transaction: &Transaction, ui_progress: &Spinner) -> Result<()> {
        ui_progress.set_message("submitting");

        let signature = self
            .rpc()
            .send_transaction_with_config(
                transaction,
                RpcSendTransactionConfig {
                    preflight_commitment: Some(CommitmentLevel::Processed),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e.kind {
                ClientErrorKind::RpcError(RpcError::RpcResponseError { data, message, .. }) => {
                    if let RpcResponseErrorData::SendTransactionPreflightFailure(result) = data {
                        anyhow!(
                            "preflight simulation failed: {:#?}",
                            result.logs.unwrap_or_default()
                        )
                    } else {
                        anyhow!("RPC error: {message}")
                    }
                }

                _ => anyhow!("error sending transaction: {e:?}"),
            })?;

        ui_progress.set_message(format!("confirming {signature}"));

        let start_time = Instant::now();

        loop {
            let status = self
                .rpc()
                .get_signature_status_with_commitment(
                    &signature,
                    CommitmentConfig {
                        commitment: CommitmentLevel::Processed,
                    },
                )
                .await?;

            match status {
                None if start_time.elapsed() > CONFIRM_DEADLINE => {
                    ui_progress.abandon_with_message(format!("timed out {signature}"));
                    bail!(
                        "transaction {signature} not confirmed after {}s",
                        CONFIRM_DEADLINE.as_secs()
                    );
                }
                None => tokio::time::sleep(Duration::from_millis(100)).await,
                Some(Ok(())) => {
                    ui_progress.finish_with_message(format!("confirmed {signature}"));
                    return Ok(());
                }
                Some(Err(e)) => {
                    ui_progress.abandon_with_message(format!("failed {signature}: {e:?}"));
                    bail!("transaction {signature} failed: {e}");
                }
            }
        }
    }
}

/// At most one transaction, with a description of each step it performs
#[derive(Default)]
pub struct Plan {
    pub transaction: Option<PlannedTransaction>,
}

pub struct PlannedTransaction {
    pub steps: Vec<String>,
    pub transaction: Transaction,
}

pub struct PlanBuilder {
    payer: Pubkey,
    compute_budget: Option<u32>,
}

impl PlanBuilder {
    pub fn new(payer: Pubkey, compute_budget: Option<u32>) -> Self {
        Self {
            payer,
            compute_budget,
        }
    }

    pub fn payer(&self) -> Pubkey {
        self.payer
    }

    /// Instructions placed ahead of every planned transaction
    pub fn prefix(&self) -> Vec<Instruction> {
        self.compute_budget
            .map(ComputeBudgetInstruction::set_compute_unit_limit)
            .into_iter()
            .collect()
    }

    /// Plan `instructions` as a single transaction, after the prefix.
    /// Nothing is planned when there are no instructions.
    pub fn build(
        self,
        steps: impl IntoIterator<Item = impl AsRef<str>>,
        instructions: impl IntoIterator<Item = Instruction>,
    ) -> Plan {
        let mut ix_list = self.prefix();
        let prefix_len = ix_list.len();
        ix_list.extend(instructions);

        if ix_list.len() == prefix_len {
            return Plan::default();
        }

        let steps = steps.into_iter().map(|s| s.as_ref().to_owned()).collect();
        let transaction = Transaction::new_with_payer(&ix_list, Some(&self.payer));

        Plan {
            transaction: Some(PlannedTransaction { steps, transaction }),
        }
    }
}

#[derive(Debug)]
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn new(disabled: bool, msg: impl Into<Cow<'static, str>>) -> Self {
        if disabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();

        bar.enable_steady_tick(100);
        bar.set_style(
            indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.set_message(msg);

        Self { bar: Some(bar) }
    }

    pub fn set_message(&self, msg: impl Into<Cow<'static, str>>) {
        if let Some(bar) = &self.bar {
            bar.set_message(msg);
        }
    }

    pub fn finish_with_message(&self, msg: impl Into<Cow<'static, str>>) {
        if let Some(bar) = &self.bar {
            bar.set_style(indicatif::ProgressStyle::default_spinner().template("✅ {msg}"));
            bar.finish_with_message(msg);
        }
    }

    pub fn abandon_with_message(&self, msg: impl Into<Cow<'static, str>>) {
        if let Some(bar) = &self.bar {
            bar.set_style(indicatif::ProgressStyle::default_spinner().template("❌ {msg}"));
            bar.abandon_with_message(msg);
        }
    }
}
