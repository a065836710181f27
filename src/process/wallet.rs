//! Wallet backend launch descriptor.
//!
//! This file turns a [`LaunchConfig`] into the [`WalletStartService`] used to
//! start the wallet backend server.
//!
//! ## Argument Layout
//!
//! The argument vector is assembled in one pass from ordered fragments:
//!
//! 1. `serve --shutdown-handler --port <port> --database <base_dir>/wallets`
//! 2. `--listen-address <addr>` when a bind address is configured
//! 3. `--tls-ca-cert <ca> --tls-sv-cert <cert> --tls-sv-key <key>` when TLS is configured
//! 4. `--smash-url <url>` when a metadata aggregation server is configured
//! 5. `--sync-tolerance <n>s` when a non-zero sync tolerance is configured
//! 6. Backend arguments:
//!    - Jormungandr: `--genesis-block-hash <hash> --node-port <rest_port>`
//!    - Byron/Shelley: `--mainnet`, `--staging <genesis>` or `--testnet <genesis>`,
//!      followed by `--node-socket <path>` when a socket file is configured
//!
//! The flag names and their order form the contract with the wallet
//! executable's own argument parser.

use log::{debug, info};
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::port::{EphemeralPortAllocator, PortAllocator};
use super::types::{
    BackendKind, NetworkSelection, ShutdownMethod, StartService, WalletStartService,
};
use crate::config::{ConfigError, JormungandrConfig, LaunchConfig, NodeBackendConfig, NodeConfig};
use crate::{STAKE_POOL_REGISTRY_URL_ENV, WALLET_DB_DIR};

/// Errors that can occur while building a launch descriptor
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid launch configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to allocate a free API port")]
    PortAllocation(#[source] io::Error),
}

/// Build the wallet launch descriptor, allocating an ephemeral API port
/// from the operating system when none is configured.
///
/// # Arguments
/// * `base_dir` - Directory under which the wallet databases live
/// * `config` - Launch configuration
///
/// # Errors
/// * `BuildError::Config` if the configuration is inconsistent
/// * `BuildError::PortAllocation` if no free port could be obtained
pub fn build_wallet_service(
    base_dir: &Path,
    config: &LaunchConfig,
) -> Result<WalletStartService, BuildError> {
    build_wallet_service_with(base_dir, config, &EphemeralPortAllocator)
}

/// Build the wallet launch descriptor using the given port allocator.
///
/// The configuration is validated before the allocator is consulted, and the
/// allocator is only called when the configuration has no explicit port.
pub fn build_wallet_service_with<A>(
    base_dir: &Path,
    config: &LaunchConfig,
    allocator: &A,
) -> Result<WalletStartService, BuildError>
where
    A: PortAllocator + ?Sized,
{
    config.validate()?;
    let backend = backend_args(config)?;

    let api_port = match config.explicit_api_port() {
        Some(port) => port,
        None => allocator
            .allocate_free_port()
            .map_err(BuildError::PortAllocation)?,
    };
    debug!("Using API port {}", api_port);

    let kind = BackendKind::from(&config.node_config);
    info!("Building wallet launch for {} backend on network '{}'", kind, config.network_name);

    let args = [
        serve_args(api_port, base_dir),
        flag_args("--listen-address", config.listen_address.as_deref()),
        tls_args(config),
        flag_args("--smash-url", config.smash_url.as_deref()),
        sync_tolerance_args(config),
        backend,
    ]
    .into_iter()
    .flatten()
    .collect();

    Ok(WalletStartService {
        service: StartService {
            command: kind.executable_name(),
            args,
            extra_env: extra_env(config),
            shutdown_method: ShutdownMethod::CloseStdin,
        },
        api_port,
    })
}

fn serve_args(api_port: u16, base_dir: &Path) -> Vec<String> {
    vec![
        "serve".to_string(),
        "--shutdown-handler".to_string(),
        "--port".to_string(),
        api_port.to_string(),
        "--database".to_string(),
        path_arg(&base_dir.join(WALLET_DB_DIR)),
    ]
}

/// `[flag, value]` when the value is set, nothing otherwise
fn flag_args(flag: &str, value: Option<&str>) -> Vec<String> {
    match value {
        Some(value) => vec![flag.to_string(), value.to_string()],
        None => Vec::new(),
    }
}

fn tls_args(config: &LaunchConfig) -> Vec<String> {
    match &config.tls_configuration {
        Some(tls) => vec![
            "--tls-ca-cert".to_string(),
            path_arg(&tls.ca_cert),
            "--tls-sv-cert".to_string(),
            path_arg(&tls.sv_cert),
            "--tls-sv-key".to_string(),
            path_arg(&tls.sv_key),
        ],
        None => Vec::new(),
    }
}

fn sync_tolerance_args(config: &LaunchConfig) -> Vec<String> {
    // Whole seconds only, enforced by LaunchConfig::validate
    match config.sync_tolerance.map(|tolerance| tolerance.as_secs()) {
        Some(seconds) if seconds > 0 => {
            vec!["--sync-tolerance".to_string(), format!("{}s", seconds)]
        }
        _ => Vec::new(),
    }
}

fn extra_env(config: &LaunchConfig) -> Option<BTreeMap<String, String>> {
    config.stake_pool_registry_url.as_ref().map(|url| {
        BTreeMap::from([(STAKE_POOL_REGISTRY_URL_ENV.to_string(), url.clone())])
    })
}

fn backend_args(config: &LaunchConfig) -> Result<Vec<String>, ConfigError> {
    match &config.node_config {
        NodeBackendConfig::Jormungandr(jormungandr) => Ok(jormungandr_args(jormungandr)),
        NodeBackendConfig::Byron(node) | NodeBackendConfig::Shelley(node) => {
            node_args(&config.network_name, node)
        }
    }
}

fn jormungandr_args(config: &JormungandrConfig) -> Vec<String> {
    vec![
        "--genesis-block-hash".to_string(),
        config.network.genesis_block.hash.clone(),
        "--node-port".to_string(),
        config.rest_port.to_string(),
    ]
}

fn node_args(network_name: &str, node: &NodeConfig) -> Result<Vec<String>, ConfigError> {
    let selection = NetworkSelection::from_name(network_name);

    let mut args = vec![selection.flag().to_string()];
    if selection != NetworkSelection::Mainnet {
        let genesis_file = node
            .genesis_file()
            .ok_or_else(|| ConfigError::MissingGenesisFile {
                network: network_name.to_string(),
            })?;
        args.push(path_arg(&genesis_path(&node.configuration_dir, genesis_file)));
    }

    if let Some(socket_file) = &node.socket_file {
        args.push("--node-socket".to_string());
        args.push(path_arg(socket_file));
    }

    Ok(args)
}

/// `<configuration_dir>/<genesis_file>`, even when the file name is absolute
fn genesis_path(configuration_dir: &Path, genesis_file: &str) -> PathBuf {
    let relative: PathBuf = Path::new(genesis_file)
        .components()
        .filter(|component| !matches!(component, Component::RootDir | Component::Prefix(_)))
        .collect();
    configuration_dir.join(relative)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenesisBlock, JormungandrNetwork, NodeNetwork, TlsConfig};
    use std::cell::Cell;
    use std::time::Duration;

    /// Hands out a fixed port and counts how often it was asked
    struct FixedPortAllocator {
        port: u16,
        calls: Cell<usize>,
    }

    impl FixedPortAllocator {
        fn new(port: u16) -> Self {
            Self {
                port,
                calls: Cell::new(0),
            }
        }
    }

    impl PortAllocator for FixedPortAllocator {
        fn allocate_free_port(&self) -> io::Result<u16> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.port)
        }
    }

    struct FailingPortAllocator;

    impl PortAllocator for FailingPortAllocator {
        fn allocate_free_port(&self) -> io::Result<u16> {
            Err(io::Error::new(io::ErrorKind::AddrInUse, "no ports left"))
        }
    }

    fn node_launch(
        network_name: &str,
        genesis_file: Option<&str>,
        socket_file: Option<&str>,
    ) -> LaunchConfig {
        LaunchConfig {
            state_dir: PathBuf::from("/data"),
            network_name: network_name.to_string(),
            api_port: Some(8090),
            listen_address: None,
            stake_pool_registry_url: None,
            smash_url: None,
            sync_tolerance: None,
            node_config: NodeBackendConfig::Shelley(NodeConfig {
                configuration_dir: PathBuf::from("/cfg"),
                network: NodeNetwork {
                    genesis_file: genesis_file.map(str::to_string),
                },
                socket_file: socket_file.map(PathBuf::from),
            }),
            child_process_log_files: None,
            install_signal_handlers: None,
            tls_configuration: None,
        }
    }

    fn jormungandr_launch() -> LaunchConfig {
        LaunchConfig {
            node_config: NodeBackendConfig::Jormungandr(JormungandrConfig {
                network: JormungandrNetwork {
                    genesis_block: GenesisBlock {
                        hash: "abc123".to_string(),
                    },
                },
                rest_port: 8443,
            }),
            ..node_launch("itn", None, None)
        }
    }

    fn build(config: &LaunchConfig) -> WalletStartService {
        build_wallet_service_with(Path::new("/data"), config, &FixedPortAllocator::new(1))
            .unwrap()
    }

    #[test]
    fn test_mainnet_with_socket() {
        let service = build(&node_launch("mainnet", None, Some("/run/node.sock")));

        assert_eq!(service.command(), "wallet-backend-shelley");
        assert_eq!(
            service.args(),
            [
                "serve",
                "--shutdown-handler",
                "--port",
                "8090",
                "--database",
                "/data/wallets",
                "--mainnet",
                "--node-socket",
                "/run/node.sock",
            ]
        );
        assert_eq!(service.shutdown_method(), ShutdownMethod::CloseStdin);
        assert_eq!(service.api_port, 8090);
        assert!(service.extra_env().is_none());
    }

    #[test]
    fn test_staging_and_testnet_genesis() {
        let staging = build(&node_launch("staging", Some("genesis.json"), None));
        assert_eq!(&staging.args()[6..], ["--staging", "/cfg/genesis.json"]);

        let testnet = build(&node_launch("testnet-dev", Some("genesis.json"), None));
        assert_eq!(&testnet.args()[6..], ["--testnet", "/cfg/genesis.json"]);
    }

    #[test]
    fn test_absolute_genesis_file_stays_under_configuration_dir() {
        let service = build(&node_launch("testnet", Some("/etc/genesis.json"), None));
        assert_eq!(&service.args()[6..], ["--testnet", "/cfg/etc/genesis.json"]);

        let nested = build(&node_launch("staging", Some("shelley/genesis.json"), None));
        assert_eq!(&nested.args()[6..], ["--staging", "/cfg/shelley/genesis.json"]);
    }

    #[test]
    fn test_byron_executable() {
        let config = LaunchConfig {
            node_config: NodeBackendConfig::Byron(NodeConfig {
                configuration_dir: PathBuf::from("/cfg"),
                network: NodeNetwork::default(),
                socket_file: None,
            }),
            ..node_launch("mainnet", None, None)
        };
        assert_eq!(build(&config).command(), "wallet-backend-byron");
    }

    #[test]
    fn test_missing_genesis_file_fails_before_port_allocation() {
        let allocator = FixedPortAllocator::new(4000);
        let mut config = node_launch("testnet", None, None);
        config.api_port = None;

        let err = build_wallet_service_with(Path::new("/data"), &config, &allocator).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Config(ConfigError::MissingGenesisFile { .. })
        ));
        assert_eq!(allocator.calls.get(), 0);
    }

    #[test]
    fn test_jormungandr_args() {
        let service = build(&jormungandr_launch());

        assert_eq!(service.command(), "wallet-backend-jormungandr");
        assert!(service.args().ends_with(&[
            "--genesis-block-hash".to_string(),
            "abc123".to_string(),
            "--node-port".to_string(),
            "8443".to_string(),
        ]));
        for flag in ["--mainnet", "--staging", "--testnet"] {
            assert!(!service.args().iter().any(|arg| arg == flag));
        }
    }

    #[test]
    fn test_optional_flags_order() {
        let mut config = node_launch("mainnet", None, None);
        config.listen_address = Some("0.0.0.0".to_string());
        config.tls_configuration = Some(TlsConfig {
            ca_cert: PathBuf::from("/tls/ca.crt"),
            sv_cert: PathBuf::from("/tls/server.crt"),
            sv_key: PathBuf::from("/tls/server.key"),
        });
        config.smash_url = Some("https://smash.example.org".to_string());
        config.sync_tolerance = Some(Duration::from_secs(300));

        let service = build(&config);
        assert_eq!(
            &service.args()[6..],
            [
                "--listen-address",
                "0.0.0.0",
                "--tls-ca-cert",
                "/tls/ca.crt",
                "--tls-sv-cert",
                "/tls/server.crt",
                "--tls-sv-key",
                "/tls/server.key",
                "--smash-url",
                "https://smash.example.org",
                "--sync-tolerance",
                "300s",
                "--mainnet",
            ]
        );
    }

    #[test]
    fn test_zero_sync_tolerance_omitted() {
        let mut config = node_launch("mainnet", None, None);
        config.sync_tolerance = Some(Duration::ZERO);
        assert!(!build(&config).args().iter().any(|arg| arg == "--sync-tolerance"));
    }

    #[test]
    fn test_sub_second_sync_tolerance_rejected() {
        let allocator = FixedPortAllocator::new(4000);
        let mut config = node_launch("mainnet", None, None);
        config.api_port = None;
        config.sync_tolerance = Some(Duration::from_millis(1500));

        let err = build_wallet_service_with(Path::new("/data"), &config, &allocator).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Config(ConfigError::SubSecondSyncTolerance { .. })
        ));
        assert_eq!(allocator.calls.get(), 0);
    }

    #[test]
    fn test_stake_pool_registry_env() {
        let mut config = node_launch("mainnet", None, None);
        config.stake_pool_registry_url =
            Some("https://registry.example.org/pools.zip".to_string());

        let service = build(&config);
        let env = service.extra_env().unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(
            env.get("STAKE_POOL_REGISTRY_URL").map(String::as_str),
            Some("https://registry.example.org/pools.zip")
        );
    }

    #[test]
    fn test_explicit_port_skips_allocator() {
        let allocator = FixedPortAllocator::new(4000);
        let config = node_launch("mainnet", None, None);
        let service = build_wallet_service_with(Path::new("/data"), &config, &allocator).unwrap();

        assert_eq!(service.api_port, 8090);
        assert_eq!(allocator.calls.get(), 0);
    }

    #[test]
    fn test_missing_port_uses_allocator() {
        let allocator = FixedPortAllocator::new(4000);
        let mut config = node_launch("mainnet", None, None);
        config.api_port = Some(0);

        let service = build_wallet_service_with(Path::new("/data"), &config, &allocator).unwrap();
        assert_eq!(service.api_port, 4000);
        assert_eq!(&service.args()[2..4], ["--port", "4000"]);
        assert_eq!(allocator.calls.get(), 1);
    }

    #[test]
    fn test_port_allocation_failure_propagates() {
        let mut config = node_launch("mainnet", None, None);
        config.api_port = None;

        let err = build_wallet_service_with(Path::new("/data"), &config, &FailingPortAllocator)
            .unwrap_err();
        match err {
            BuildError::PortAllocation(source) => {
                assert_eq!(source.kind(), io::ErrorKind::AddrInUse)
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
