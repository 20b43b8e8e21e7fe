//! Registry Configuration Module
//!
//! Loads configuration from a TOML file, an optional environment overlay
//! (`<config dir>/environments/<env>.toml`) and `POOL_REGISTRY__*`
//! environment variables, in that order of precedence.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use dex::{parse_init_code_hash, InitCodeHash, UNISWAP_V3_POOL_INIT_CODE_HASH};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use types::{parse_address, EthAddress, PoolVariant};

use crate::defaults;

/// Main registry configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistryConfig {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Chain access
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Factories whose pools may be resolved
    #[serde(default = "default_deployments")]
    pub deployments: Vec<DeploymentConfig>,
}

/// Global configuration settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GlobalConfig {
    pub log_level: String,
}

/// RPC endpoint settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RpcConfig {
    /// Primary RPC endpoint
    pub primary_rpc: String,

    /// Fallback RPC endpoints, tried in order
    pub fallback_rpcs: Vec<String>,

    /// Chain ID (137 for Polygon)
    pub chain_id: u64,

    /// Timeout for a single contract call in milliseconds
    pub rpc_timeout_ms: u64,
}

/// One factory contract as written in the config file
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DeploymentConfig {
    pub name: String,
    pub factory: String,
    pub variant: PoolVariant,

    /// Pool init code hash, only meaningful for fee-tiered factories
    #[serde(default)]
    pub init_code_hash: Option<String>,
}

/// Parsed and validated deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub name: String,
    pub factory: EthAddress,
    pub variant: PoolVariant,
    pub init_code_hash: Option<InitCodeHash>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            rpc: RpcConfig::default(),
            deployments: default_deployments(),
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            primary_rpc: defaults::rpc::PRIMARY_RPC.to_string(),
            fallback_rpcs: defaults::rpc::FALLBACK_RPCS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            chain_id: defaults::rpc::CHAIN_ID,
            rpc_timeout_ms: defaults::rpc::RPC_TIMEOUT_MS,
        }
    }
}

fn default_deployments() -> Vec<DeploymentConfig> {
    vec![
        DeploymentConfig {
            name: "uniswap_v3".to_string(),
            factory: defaults::deployments::UNISWAP_V3_FACTORY.to_string(),
            variant: PoolVariant::FeeTiered,
            init_code_hash: None,
        },
        DeploymentConfig {
            name: "quickswap_v2".to_string(),
            factory: defaults::deployments::QUICKSWAP_V2_FACTORY.to_string(),
            variant: PoolVariant::PairOnly,
            init_code_hash: None,
        },
    ]
}

impl DeploymentConfig {
    /// Parse addresses and hashes
    pub fn parse(&self) -> Result<Deployment> {
        let factory = parse_address(&self.factory)
            .with_context(|| format!("Invalid factory address for deployment '{}'", self.name))?;

        let init_code_hash = match (&self.init_code_hash, self.variant) {
            (Some(hash), PoolVariant::FeeTiered) => Some(
                parse_init_code_hash(hash)
                    .with_context(|| format!("Invalid init code hash for '{}'", self.name))?,
            ),
            (None, PoolVariant::FeeTiered) => Some(UNISWAP_V3_POOL_INIT_CODE_HASH),
            (Some(_), PoolVariant::PairOnly) => {
                warn!(
                    "Deployment '{}' is pair-only, ignoring init_code_hash",
                    self.name
                );
                None
            }
            (None, PoolVariant::PairOnly) => None,
        };

        Ok(Deployment {
            name: self.name.clone(),
            factory,
            variant: self.variant,
            init_code_hash,
        })
    }
}

impl RegistryConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new("config/pool_registry.toml"));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = base
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        let mut config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.expand_env_vars()?;
        config.validate()?;
        debug!(
            "Loaded registry config with {} deployments",
            config.deployments.len()
        );
        Ok(config)
    }

    /// Parse a TOML document directly, without file or environment layering
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(content).context("Failed to parse registry config")?;
        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Expand environment variables in RPC URLs (`${ALCHEMY_KEY}` etc.)
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let primary = shellexpand::env(&self.rpc.primary_rpc)
            .context("Failed to expand primary RPC URL")?
            .to_string();
        self.rpc.primary_rpc = primary;

        for rpc in &mut self.rpc.fallback_rpcs {
            let expanded = shellexpand::env(rpc.as_str())
                .context("Failed to expand fallback RPC URL")?
                .to_string();
            *rpc = expanded;
        }

        Ok(())
    }

    /// Check endpoints and deployments, rejecting duplicates
    pub fn validate(&self) -> Result<()> {
        if self.rpc.primary_rpc.trim().is_empty() {
            bail!("rpc.primary_rpc must not be empty");
        }
        if self.rpc.rpc_timeout_ms == 0 {
            bail!("rpc.rpc_timeout_ms must be greater than zero");
        }

        let mut seen_names = HashSet::new();
        let mut seen_factories = HashSet::new();
        for deployment in self.deployments()? {
            if !seen_names.insert(deployment.name.clone()) {
                bail!("Duplicate deployment name '{}'", deployment.name);
            }
            if !seen_factories.insert((deployment.factory, deployment.variant)) {
                bail!(
                    "Factory for deployment '{}' is listed twice as {:?}",
                    deployment.name,
                    deployment.variant
                );
            }
        }
        Ok(())
    }

    /// All deployments, parsed
    pub fn deployments(&self) -> Result<Vec<Deployment>> {
        self.deployments.iter().map(DeploymentConfig::parse).collect()
    }

    /// Look up a deployment by its configured name
    pub fn deployment(&self, name: &str) -> Result<Option<Deployment>> {
        self.deployments
            .iter()
            .find(|d| d.name == name)
            .map(DeploymentConfig::parse)
            .transpose()
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(environment: Option<&str>) -> Result<RegistryConfig> {
    RegistryConfig::load(None, environment)
}
