//! # Pool Registry Configuration
//!
//! Centralized configuration for the pool registry: RPC endpoints and the
//! factory deployments whose pools may be resolved.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use registry_config::RegistryConfig;
//! use std::path::Path;
//!
//! let config = RegistryConfig::load(Some(Path::new("config/pool_registry.toml")), None)?;
//! for deployment in config.deployments()? {
//!     println!("{} -> {:?}", deployment.name, deployment.variant);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod registry_config;

pub use registry_config::{
    load_config, Deployment, DeploymentConfig, GlobalConfig, RegistryConfig, RpcConfig,
};
