use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{AppSettings, Args, Parser, Subcommand};
use relay_aggregator::{
    describe, serialize, DedupPolicy, Encoding, ForwardPlan, InstructionBatch, Selection,
    TextEncoding,
};
use solana_sdk::pubkey::Pubkey;

use client::{Client, ClientConfig, Plan, PlanBuilder};
use config::RelayConfig;
use source::{DepositInstructionSource, DumpFileSource};

pub mod client;
pub mod config;
pub mod persist;
pub mod source;

#[derive(Debug, Parser)]
#[clap(version)]
#[clap(propagate_version = true)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
pub struct CliOpts {
    /// The relay configuration file
    #[clap(global = true, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Prefix transactions with a change to the compute limit
    #[clap(global = true, long)]
    pub compute_budget: Option<u32>,

    /// Simulate transactions only
    #[clap(global = true, long)]
    pub dry_run: bool,

    /// Don't ask for confirmation
    #[clap(global = true, long)]
    pub no_confirm: bool,

    /// The path to the signer to use (i.e. keypair or ledger-wallet)
    #[clap(global = true, long, short = 'k', env = "SIGNER_PATH")]
    pub signer_path: Option<String>,

    /// The network endpoint to use
    #[clap(global = true, long, short = 'u', env = "RPC_URL")]
    pub rpc_endpoint: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

/// Which instructions of the input to act on
#[derive(Debug, Clone, Args)]
pub struct SelectionOpts {
    /// Only instructions for this program
    #[clap(long, value_parser, conflicts_with = "all")]
    pub program: Option<Pubkey>,

    /// Every instruction, ignoring the configured lending program
    #[clap(long)]
    pub all: bool,
}

impl SelectionOpts {
    /// `--program`, then `--all`, then the configured lending program.
    pub fn resolve(&self, configured: Option<Pubkey>) -> Selection {
        match (self.program, self.all) {
            (Some(program), _) => Selection::Program(program),
            (None, true) => Selection::All,
            (None, false) => Selection::from(configured),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the instructions in a dump
    Inspect {
        /// The dumped instructions
        #[clap(long, short = 'i')]
        input: PathBuf,

        #[clap(flatten)]
        selection: SelectionOpts,
    },

    /// Re-encode the instructions in a dump and write them out
    Dump {
        /// The dumped instructions
        #[clap(long, short = 'i')]
        input: PathBuf,

        /// Where to write, defaults to the configured output path
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,

        #[clap(flatten)]
        selection: SelectionOpts,

        /// Encoding for program ids and account addresses
        #[clap(long, value_parser)]
        address_encoding: Option<TextEncoding>,

        /// Encoding for instruction data
        #[clap(long, value_parser)]
        data_encoding: Option<TextEncoding>,
    },

    /// Relay the instructions in a dump through the wrapper program
    Forward {
        /// The dumped instructions
        #[clap(long, short = 'i')]
        input: PathBuf,

        #[clap(flatten)]
        selection: SelectionOpts,

        /// How repeated accounts are merged: preserve, exact or merge-by-address
        #[clap(long, value_parser)]
        dedup: Option<DedupPolicy>,
    },
}

pub async fn run(opts: CliOpts) -> Result<()> {
    let _ = env_logger::builder().is_test(false).try_init();

    let config = RelayConfig::load(opts.config.as_deref()).await?;

    match opts.command {
        Command::Inspect { input, selection } => {
            let batch = load_batch(&config, input, &selection).await?;
            print!("{}", describe(&batch));
        }
        Command::Dump {
            input,
            output,
            selection,
            address_encoding,
            data_encoding,
        } => {
            let batch = load_batch(&config, input, &selection).await?;
            let encoding = Encoding {
                address: address_encoding.unwrap_or(config.encoding.address),
                data: data_encoding.unwrap_or(config.encoding.data),
            };
            let output = output.unwrap_or_else(|| config.output_path.clone());

            let artifacts = serialize(&batch, encoding)?;
            persist::write_artifacts(&output, &artifacts).await?;
            println!(
                "{} instructions have been written to {}",
                artifacts.len(),
                output.display()
            );
        }
        Command::Forward {
            input,
            selection,
            dedup,
        } => {
            let batch = load_batch(&config, input, &selection).await?;
            let policy = dedup.unwrap_or(config.dedup);

            let rpc_endpoint = opts
                .rpc_endpoint
                .or_else(|| config.rpc_url.clone())
                .map(solana_clap_utils::input_validators::normalize_to_url_if_moniker);
            let client_config = ClientConfig::new(
                opts.dry_run,
                opts.no_confirm,
                opts.signer_path.or_else(|| config.keypair_path.clone()),
                rpc_endpoint,
                opts.compute_budget.or(config.compute_budget),
            )?;
            let client = Client::new(client_config);

            let plan = forward_plan(client.plan()?, &config, &batch, policy)?;
            client.execute(plan).await?;
        }
    }

    Ok(())
}

/// Read the input through the deposit source and apply the selection.
async fn load_batch(
    config: &RelayConfig,
    input: PathBuf,
    selection: &SelectionOpts,
) -> Result<InstructionBatch> {
    let source = DumpFileSource::new(input, config.encoding);
    let ixs = match &config.deposit {
        Some(request) => source.build_deposit(request).await?,
        None => source.load().await?,
    };
    let batch = InstructionBatch::from(ixs);

    let selection = selection.resolve(config.lending_program_id);
    let selected = selection.apply(&batch);
    log::info!(
        "{selection:?} selected {} of {} instructions",
        selected.len(),
        batch.len()
    );

    Ok(selected)
}

/// The wrapper call relaying `batch`, as a one transaction plan.
pub fn forward_plan(
    builder: PlanBuilder,
    config: &RelayConfig,
    batch: &InstructionBatch,
    policy: DedupPolicy,
) -> Result<Plan> {
    let wrapper = match &config.wrapper {
        Some(wrapper) => wrapper.interface(),
        None => bail!("forwarding needs a [wrapper] section in the config"),
    };
    if batch.is_empty() {
        println!("no instructions selected, nothing to forward");
        return Ok(Plan::default());
    }

    let forward = ForwardPlan::new(&wrapper, batch, policy);
    if !forward.fits_in_transaction(&builder.payer(), &builder.prefix())? {
        bail!(
            "{} forwarded instructions ({} accounts) do not fit in one transaction, \
             select fewer with --program or merge accounts with --dedup",
            forward.payloads.len(),
            forward.remaining_accounts.len()
        );
    }

    let ix = forward
        .instruction()
        .context("building the wrapper instruction")?;
    let steps = batch
        .iter()
        .enumerate()
        .map(|(i, ix)| format!("forward instruction {i} for program {}", ix.program_id))
        .collect::<Vec<_>>();

    Ok(builder.build(steps, [ix]))
}
