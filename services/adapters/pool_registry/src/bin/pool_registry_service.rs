//! Pool Registry Service
//!
//! Resolves a single pool through the registry and logs the resulting handle.
//! Factories can be given by deployment name from the config or by address.
//! `pair --fee <fee> --verify` also checks the configured init code hash
//! against the factory's own `getPool` answer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use pool_registry::{rpc_collaborators, PoolSelector, RegistryDirectory, RpcClient};
use registry_config::RegistryConfig;
use types::{format_address, parse_address, EthAddress, FeeTier, PoolVariant};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "pool_registry_service")]
#[command(about = "Resolve DEX pools to shared pool handles")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/pool_registry.toml")]
    config: PathBuf,

    /// Environment (development, staging, production)
    #[arg(short, long)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look a pool up by its contract address
    Address {
        /// Deployment name or factory address
        factory: String,
        pool: String,
        /// Pool family when the factory is given by address (v2 or v3)
        #[arg(long)]
        variant: Option<String>,
    },
    /// Look a pool up by its two tokens
    Pair {
        /// Deployment name or factory address
        factory: String,
        token_a: String,
        token_b: String,
        /// Fee in hundredths of a basis point (500 = 0.05%), fee-tiered factories only
        #[arg(long)]
        fee: Option<u32>,
        /// Cross-check the derived address against the factory's getPool
        #[arg(long, requires = "fee")]
        verify: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = RegistryConfig::load(Some(&args.config), args.env.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("pool_registry={}", config.global.log_level).parse()?),
        )
        .init();

    info!("Starting Pool Registry Service");

    let rpc = Arc::new(RpcClient::new(config.rpc.clone())?);
    let directory = RegistryDirectory::install_global(RegistryDirectory::from_deployments(
        rpc_collaborators(rpc),
        &config.deployments()?,
    ));

    let (factory, variant, selector, verify) = match args.command {
        Command::Address {
            factory,
            pool,
            variant,
        } => {
            let variant = variant.as_deref().map(parse_variant).transpose()?;
            let (factory, variant) = resolve_factory(&config, &factory, variant)?;
            let pool = parse_address(&pool)
                .with_context(|| format!("'{}' is not a pool address", pool))?;
            (factory, variant, PoolSelector::address(pool), false)
        }
        Command::Pair {
            factory,
            token_a,
            token_b,
            fee,
            verify,
        } => {
            let hint = fee.map(|_| PoolVariant::FeeTiered);
            let (factory, variant) = resolve_factory(&config, &factory, hint)?;
            let selector = match fee {
                Some(fee) => PoolSelector::pair_with_fee(token_a, token_b, FeeTier::new(fee)?),
                None => PoolSelector::pair(token_a, token_b),
            };
            (factory, variant, selector, verify)
        }
    };

    let registry = directory.get_registry(factory, variant);
    match registry.get_pool(&selector).await {
        Ok(pool) => {
            info!(
                "Resolved {} -> {} at {} (token0 {} decimals {}, token1 {} decimals {})",
                selector,
                pool.name(),
                format_address(&pool.address()),
                pool.token0().symbol,
                pool.token0().decimals,
                pool.token1().symbol,
                pool.token1().decimals,
            );
            if let (true, Some(fee_tiered), Some(fee)) =
                (verify, registry.as_fee_tiered(), pool.fee_tier())
            {
                let (token0, token1) = pool.pair().addresses();
                if !fee_tiered.verify_derivation(token0, token1, fee).await? {
                    bail!(
                        "Factory {} disagrees with the configured init code hash",
                        format_address(&factory)
                    );
                }
                info!("Factory getPool agrees with the derived address");
            }
            Ok(())
        }
        Err(e) => {
            error!(kind = e.kind(), "Failed to resolve {}: {}", selector, e);
            Err(e.into())
        }
    }
}

/// Deployment name first, then a raw factory address
fn resolve_factory(
    config: &RegistryConfig,
    target: &str,
    variant: Option<PoolVariant>,
) -> Result<(EthAddress, PoolVariant)> {
    if let Some(deployment) = config.deployment(target)? {
        if let Some(requested) = variant {
            if requested != deployment.variant {
                bail!(
                    "Deployment '{}' is {}, not {}",
                    deployment.name,
                    deployment.variant,
                    requested
                );
            }
        }
        return Ok((deployment.factory, deployment.variant));
    }

    let factory = parse_address(target)
        .with_context(|| format!("'{}' is neither a deployment name nor an address", target))?;
    Ok((factory, variant.unwrap_or(PoolVariant::PairOnly)))
}

fn parse_variant(value: &str) -> Result<PoolVariant> {
    match value.to_ascii_lowercase().as_str() {
        "v2" | "pair_only" | "pair-only" => Ok(PoolVariant::PairOnly),
        "v3" | "fee_tiered" | "fee-tiered" => Ok(PoolVariant::FeeTiered),
        other => bail!("Unknown pool variant '{}', expected v2 or v3", other),
    }
}
