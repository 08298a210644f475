// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path, ConfigSearch, DEFAULT_CONFIG_NAME};
use crate::rpc::RpcUrl;
use crate::validation::{check_private_key, parse_contract_address};
use crate::yaml::load_yaml_with_env;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use path_clean::clean;
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

/// Prefix for environment overrides, eg. `TVR_WALLET__PRIVATE_KEY`
pub const ENV_PREFIX: &str = "TVR_";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// Node endpoint, http(s) or ws(s)
    pub rpc_url: String,
    pub chain_id: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "ws://localhost:8545".to_string(),
            chain_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct ContractsConfig {
    /// Address of the reports contract
    pub reports: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct SignerConfig {
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct FheConfig {
    /// Named BFV parameter preset
    pub preset: String,
    /// Explicit parameters, used instead of the preset when set
    pub params: Option<BfvParamsConfig>,
    /// Relative paths are resolved against the folder holding the config file
    pub public_key: PathBuf,
    pub secret_key: PathBuf,
}

impl Default for FheConfig {
    fn default() -> Self {
        Self {
            preset: "SET_2048_1032193_1".to_string(),
            params: None,
            public_key: PathBuf::from("keys/fhe_public.key"),
            secret_key: PathBuf::from("keys/fhe_secret.key"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BfvParamsConfig {
    pub degree: usize,
    pub plaintext_modulus: u64,
    pub moduli: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct UiConfig {
    pub success_status_ms: u64,
    pub error_status_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            success_status_ms: 2000,
            error_status_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub contracts: ContractsConfig,
    /// Key used to sign report transactions
    pub wallet: SignerConfig,
    pub fhe: FheConfig,
    /// Key the decryption oracle signs results with
    pub verifier: SignerConfig,
    pub ui: UiConfig,
    /// Stored as the second public value of new reports
    pub jurisdiction: u64,
    #[serde(skip)]
    config_file: PathBuf,
}

impl AppConfig {
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn rpc(&self) -> Result<RpcUrl> {
        RpcUrl::parse(&self.chain.rpc_url)
    }

    pub fn reports_contract(&self) -> Result<Address> {
        let address = self
            .contracts
            .reports
            .as_deref()
            .context("contracts.reports is not configured")?;
        parse_contract_address(address)
    }

    pub fn wallet_key(&self) -> Result<&str> {
        required_key("wallet.private_key", self.wallet.private_key.as_deref())
    }

    pub fn verifier_key(&self) -> Result<&str> {
        required_key("verifier.private_key", self.verifier.private_key.as_deref())
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.relative_to_config(&self.fhe.public_key)
    }

    pub fn secret_key_path(&self) -> PathBuf {
        self.relative_to_config(&self.fhe.secret_key)
    }

    pub fn success_status_ttl(&self) -> Duration {
        Duration::from_millis(self.ui.success_status_ms)
    }

    pub fn error_status_ttl(&self) -> Duration {
        Duration::from_millis(self.ui.error_status_ms)
    }

    fn relative_to_config(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let base = self.config_file.parent().unwrap_or_else(|| Path::new("."));
        clean(base.join(path))
    }
}

fn required_key<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    let value = value.with_context(|| format!("{name} is not configured"))?;
    check_private_key(name, value)?;
    Ok(value.trim())
}

pub struct OsDirs;

impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("This OS does not provide a config dir. See https://docs.rs/dirs")?
            .join("violations"))
    }
}

/// Load configuration from defaults, then the YAML file, then `TVR_` variables.
///
/// A missing file is only an error when it was asked for with `--config`.
pub fn load_config(cli_file: Option<&str>) -> Result<AppConfig> {
    let cwd = env::current_dir()?;
    let default_dir = OsDirs::config_dir()?;
    let search = ConfigSearch {
        cwd: &cwd,
        default_dir: &default_dir,
        filename: DEFAULT_CONFIG_NAME,
    };
    let config_file = resolve_config_path(find_in_parent, &search, cli_file.map(Path::new));

    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    if cli_file.is_some() || config_file.exists() {
        let yaml = load_yaml_with_env(&config_file).context("Configuration file not found")?;
        figment = figment.merge(Yaml::string(&yaml));
    } else {
        debug!(path = %config_file.display(), "No configuration file, using defaults");
    }

    let mut config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Could not parse configuration")?;
    config.config_file = config_file;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use figment::Jail;

    const REPORTS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.chain.rpc_url, "ws://localhost:8545");
        assert_eq!(config.success_status_ttl(), Duration::from_millis(2000));
        assert_eq!(config.error_status_ttl(), Duration::from_millis(3000));
        assert_eq!(config.jurisdiction, 0);
        assert!(config.reports_contract().is_err());
        assert!(config.wallet_key().is_err());
    }

    #[test]
    fn test_partial_sections_keep_defaults() -> Result<()> {
        let config: AppConfig = serde_yaml::from_str(
            r#"
fhe:
  preset: "SET_2048_1032193_1"
ui:
  success_status_ms: 500
"#,
        )?;
        assert_eq!(config.fhe.public_key, PathBuf::from("keys/fhe_public.key"));
        assert_eq!(config.fhe.params, None);
        assert_eq!(config.ui.success_status_ms, 500);
        assert_eq!(config.ui.error_status_ms, 3000);
        assert_eq!(config.chain, ChainConfig::default());
        Ok(())
    }

    #[test]
    fn test_file_not_found() -> Result<()> {
        let Err(err) = load_config(Some("/nope/violations.config.yaml")) else {
            bail!("error expected");
        };
        let Some(e) = err.downcast_ref::<std::io::Error>() else {
            bail!("io error expected");
        };
        assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
        Ok(())
    }

    #[test]
    fn test_config_file_in_cwd() {
        Jail::expect_with(|jail| {
            jail.set_env("REPORTS_ADDRESS", REPORTS);
            jail.create_file(
                DEFAULT_CONFIG_NAME,
                r#"
chain:
  rpc_url: "http://127.0.0.1:8545"
  chain_id: 31337
contracts:
  reports: "${REPORTS_ADDRESS}"
wallet:
  private_key: "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
fhe:
  params:
    degree: 2048
    plaintext_modulus: 1032193
    moduli: [18014398492704769]
  public_key: "keys/pk.bin"
  secret_key: "/var/secret/sk.bin"
ui:
  error_status_ms: 5000
jurisdiction: 42
"#,
            )?;

            let config = load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config.chain.chain_id, Some(31337));
            assert_eq!(
                config.reports_contract().map_err(|e| e.to_string())?,
                parse_contract_address(REPORTS).map_err(|e| e.to_string())?
            );
            assert_eq!(config.wallet_key().map_err(|e| e.to_string())?, ANVIL_KEY);
            assert_eq!(config.public_key_path(), jail.directory().join("keys/pk.bin"));
            assert_eq!(config.secret_key_path(), PathBuf::from("/var/secret/sk.bin"));
            assert_eq!(config.success_status_ttl(), Duration::from_millis(2000));
            assert_eq!(config.error_status_ttl(), Duration::from_millis(5000));
            assert_eq!(config.jurisdiction, 42);
            assert_eq!(
                config.fhe.params,
                Some(BfvParamsConfig {
                    degree: 2048,
                    plaintext_modulus: 1032193,
                    moduli: vec![18014398492704769],
                })
            );
            assert!(config.rpc().map_err(|e| e.to_string())?.is_local());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.yaml", "jurisdiction: 7\n")?;
            jail.set_env("TVR_JURISDICTION", "9");
            jail.set_env("TVR_CHAIN__RPC_URL", "wss://rpc.example.org");
            jail.set_env("TVR_VERIFIER__PRIVATE_KEY", ANVIL_KEY);

            let config = load_config(Some("custom.yaml")).map_err(|e| e.to_string())?;
            assert_eq!(config.config_file(), jail.directory().join("custom.yaml"));
            assert_eq!(config.jurisdiction, 9);
            assert_eq!(config.chain.rpc_url, "wss://rpc.example.org");
            assert_eq!(config.verifier_key().map_err(|e| e.to_string())?, ANVIL_KEY);
            Ok(())
        });
    }

    #[test]
    fn test_rejects_unknown_section_fields() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.yaml", "chain:\n  rpc: \"ws://localhost:8545\"\n")?;
            assert!(load_config(Some("bad.yaml")).is_err());
            Ok(())
        });
    }
}
