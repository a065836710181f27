//! # Wallet Launcher - Launch descriptors for the wallet backend server
//!
//! This library translates a structured launch configuration into the exact
//! command-line invocation needed to start a wallet backend server that talks
//! to one of several blockchain node backends.
//!
//! ## Overview
//!
//! The wallet backend ships one executable per node backend
//! (`wallet-backend-byron`, `wallet-backend-shelley`,
//! `wallet-backend-jormungandr`). Given a base directory and a
//! [`config::LaunchConfig`], the launcher produces a
//! [`process::WalletStartService`] describing:
//!
//! - the executable to run
//! - the ordered argument vector
//! - extra environment variables
//! - how the process should be asked to shut down
//! - the API port the server will listen on
//!
//! Spawning, supervising and stopping the process is left to the caller.
//!
//! ## Architecture
//!
//! - `config`: Launch configuration types and cross-field validation
//! - `config_loader`: YAML/JSON configuration file loading and CLI overrides
//! - `process`: Launch descriptor types, port allocation and the builder
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wallet_launcher::{config_loader, process};
//!
//! let config = config_loader::load_config(Path::new("launch.yaml"))?;
//! let service = process::build_wallet_service(&config.state_dir, &config)?;
//!
//! println!("{} {}", service.command(), service.args().join(" "));
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! state_dir: /data
//! network_name: testnet
//! api_port: 8090
//! sync_tolerance: 300s
//! node_config:
//!   kind: shelley
//!   configuration_dir: /cfg
//!   network:
//!     genesis_file: genesis.json
//!   socket_file: /run/node.sock
//! ```
//!
//! ## Error Handling
//!
//! Library operations return typed errors (`thiserror`). The loader and the
//! binary use `color_eyre` for reporting with context.

pub mod config;
pub mod config_loader;
pub mod process;

/// Prefix shared by every wallet backend executable
pub const WALLET_EXECUTABLE_PREFIX: &str = "wallet-backend";

/// Environment variable overriding the stake pool registry URL
pub const STAKE_POOL_REGISTRY_URL_ENV: &str = "STAKE_POOL_REGISTRY_URL";

/// Sub-directory of the base directory holding wallet databases
pub const WALLET_DB_DIR: &str = "wallets";

/// Network label selecting the main network
pub const MAINNET: &str = "mainnet";

/// Network label selecting the staging network
pub const STAGING: &str = "staging";
