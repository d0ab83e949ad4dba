use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relay_aggregator::{DedupPolicy, Encoding, WrapperInterface};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::{instruction::AccountMeta, pubkey::Pubkey};

use crate::source::DepositRequest;

pub const DEFAULT_CONFIG_PATH: &str = "relay.toml";
pub const DEFAULT_OUTPUT_PATH: &str = "./kamino_instructions.json";
pub const DEFAULT_WRAPPER_METHOD: &str = "execute_kamino_operations";

/// Everything the tool needs to know about its environment. Nothing here
/// has a compiled-in value except the output path and the wrapper method.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub rpc_url: Option<String>,

    #[serde(default)]
    pub keypair_path: Option<String>,

    /// Program whose instructions are forwarded when no selection is given
    #[serde(default)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub lending_program_id: Option<Pubkey>,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default)]
    pub compute_budget: Option<u32>,

    #[serde(default)]
    pub dedup: DedupPolicy,

    #[serde(default)]
    pub encoding: Encoding,

    #[serde(default)]
    pub wrapper: Option<WrapperDefinition>,

    #[serde(default)]
    pub deposit: Option<DepositRequest>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            keypair_path: None,
            lending_program_id: None,
            output_path: default_output_path(),
            compute_budget: None,
            dedup: DedupPolicy::default(),
            encoding: Encoding::default(),
            wrapper: None,
            deposit: None,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_wrapper_method() -> String {
    DEFAULT_WRAPPER_METHOD.to_owned()
}

/// The wrapper program's entry point, as confirmed against its interface
/// definition by whoever deploys it.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapperDefinition {
    #[serde_as(as = "DisplayFromStr")]
    pub program_id: Pubkey,

    #[serde(default = "default_wrapper_method")]
    pub method: String,

    #[serde(default)]
    pub accounts: Vec<WrapperAccount>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapperAccount {
    #[serde_as(as = "DisplayFromStr")]
    pub pubkey: Pubkey,

    #[serde(default)]
    pub is_signer: bool,

    #[serde(default)]
    pub is_writable: bool,
}

impl WrapperDefinition {
    pub fn interface(&self) -> WrapperInterface {
        WrapperInterface {
            program_id: self.program_id,
            method: self.method.clone(),
            accounts: self
                .accounts
                .iter()
                .map(|a| AccountMeta {
                    pubkey: a.pubkey,
                    is_signer: a.is_signer,
                    is_writable: a.is_writable,
                })
                .collect(),
        }
    }
}

impl RelayConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: RelayConfig = toml::from_str(content)?;
        config.expand_paths()?;
        Ok(config)
    }

    /// Read the config at `path`. A missing file is only tolerated when the
    /// caller did not ask for it explicitly, in which case the defaults apply.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !path.exists() {
            log::debug!("no {DEFAULT_CONFIG_PATH} found, using defaults");
            return Ok(Self::default());
        }

        let file_content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("trying to read {path:?}"))?;

        Self::parse(&file_content).with_context(|| format!("invalid config in {path:?}"))
    }

    fn expand_paths(&mut self) -> Result<()> {
        if let Some(keypair_path) = &self.keypair_path {
            self.keypair_path = Some(
                shellexpand::full(keypair_path)
                    .with_context(|| format!("expanding keypair path {keypair_path}"))?
                    .into_owned(),
            );
        }

        let output_path = self.output_path.to_string_lossy().into_owned();
        self.output_path = PathBuf::from(
            shellexpand::full(&output_path)
                .with_context(|| format!("expanding output path {output_path}"))?
                .into_owned(),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use relay_aggregator::TextEncoding;

    use super::*;

    const FULL: &str = r#"
rpc_url = "https://api.mainnet-beta.solana.com"
keypair_path = "/keys/id.json"
lending_program_id = "So11111111111111111111111111111111111111112"
output_path = "/tmp/out.json"
compute_budget = 1000000
dedup = "merge-by-address"

[encoding]
data = "base58"

[wrapper]
program_id = "HcxtR55Ec4XQPt47SckxG6RMoWyFAEbSYn5BTmVX7DEE"

[[wrapper.accounts]]
pubkey = "So11111111111111111111111111111111111111112"

[deposit]
market = "7u3HeHxYDLhnCoErrtycNokbQYbWGzLs6JSDqGAv5PfF"
lending_program_id = "So11111111111111111111111111111111111111112"
amount = 100
mint = "So11111111111111111111111111111111111111112"
owner = "11111111111111111111111111111111"
"#;

    #[test]
    fn parses_full_config() {
        let config = RelayConfig::parse(FULL).unwrap();

        assert_eq!(config.compute_budget, Some(1_000_000));
        assert_eq!(config.dedup, DedupPolicy::MergeByAddress);
        assert_eq!(
            config.encoding,
            Encoding::new(TextEncoding::Base58, TextEncoding::Base58)
        );
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.json"));

        let interface = config.wrapper.unwrap().interface();
        assert_eq!(interface.method, DEFAULT_WRAPPER_METHOD);
        assert_eq!(
            interface.accounts,
            vec![AccountMeta::new_readonly(
                "So11111111111111111111111111111111111111112".parse().unwrap(),
                false
            )]
        );

        let deposit = config.deposit.unwrap();
        assert_eq!(deposit.amount, 100);
        assert_eq!(deposit.owner, Pubkey::default());
    }

    #[test]
    fn unknown_deposit_keys_are_rejected() {
        let config = format!("{FULL}referrer_fee_bps = 5\n");
        assert!(RelayConfig::parse(&config).is_err());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = RelayConfig::parse("").unwrap();

        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(config.dedup, DedupPolicy::Preserve);
        assert_eq!(config.encoding, Encoding::default());
        assert!(config.lending_program_id.is_none());
        assert!(config.wrapper.is_none());
    }

    #[test]
    fn rejects_bad_pubkey() {
        assert!(RelayConfig::parse(r#"lending_program_id = "not-a-key""#).is_err());
    }

    #[test]
    fn expands_home() {
        std::env::set_var("HOME", "/home/relay");
        let config = RelayConfig::parse(r#"keypair_path = "~/.config/solana/id.json""#).unwrap();
        assert_eq!(
            config.keypair_path.as_deref(),
            Some("/home/relay/.config/solana/id.json")
        );
    }

    #[tokio::test]
    async fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("relay.toml");

        assert!(RelayConfig::load(Some(&missing)).await.is_err());
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, FULL).unwrap();

        let config = RelayConfig::load(Some(&path)).await.unwrap();
        assert!(config.deposit.is_some());
    }
}
