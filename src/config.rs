use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::MAINNET;

/// Configuration parameters for starting the wallet backend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LaunchConfig {
    /// Directory holding wallet databases, the blockchain and socket files
    pub state_dir: PathBuf,
    /// Label of the network to connect to (`mainnet`, `staging` or any testnet name)
    pub network_name: String,
    /// API server port. Absent or zero selects any free port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_port: Option<u16>,
    /// Address to bind the API server to (IPv4/IPv6 address, hostname or `*`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_address: Option<String>,
    /// Overrides the URL of the stake pool metadata registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_pool_registry_url: Option<String>,
    /// Base URL of the stake pool metadata aggregation server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smash_url: Option<String>,
    /// Maximum tip/applied block distance for a wallet to count as synced.
    /// Must be a whole number of seconds; sub-second values are rejected by
    /// [`LaunchConfig::validate`] and zero counts as unset.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub sync_tolerance: Option<Duration>,
    pub node_config: NodeBackendConfig,
    /// Files receiving the stdout/stderr of the child processes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_process_log_files: Option<ChildLogFiles>,
    /// Whether the supervisor should install termination signal handlers.
    /// Defaults to true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_signal_handlers: Option<bool>,
    /// Server TLS credentials. Without them the API is served over plain HTTP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_configuration: Option<TlsConfig>,
}

impl LaunchConfig {
    /// Validate cross-field consistency of the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.node_config {
            NodeBackendConfig::Jormungandr(_) => {
                // Jormungandr selects its network through the genesis block hash
            }
            NodeBackendConfig::Byron(node) | NodeBackendConfig::Shelley(node) => {
                if !self.is_mainnet() && node.genesis_file().is_none() {
                    return Err(ConfigError::MissingGenesisFile {
                        network: self.network_name.clone(),
                    });
                }
            }
        }

        if let Some(tolerance) = self.sync_tolerance {
            if tolerance.subsec_nanos() != 0 {
                return Err(ConfigError::SubSecondSyncTolerance {
                    millis: tolerance.as_millis(),
                });
            }
        }

        if let Some(tls) = &self.tls_configuration {
            tls.validate()?;
        }

        Ok(())
    }

    /// Check whether the configured network is mainnet
    pub fn is_mainnet(&self) -> bool {
        self.network_name == MAINNET
    }

    /// Explicit API port, if one was configured. Zero counts as unset.
    pub fn explicit_api_port(&self) -> Option<u16> {
        self.api_port.filter(|port| *port > 0)
    }

    /// Whether termination signal handlers should be installed
    pub fn install_signal_handlers(&self) -> bool {
        self.install_signal_handlers.unwrap_or(true)
    }
}

/// Node backend configuration, discriminated by `kind`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeBackendConfig {
    Byron(NodeConfig),
    Shelley(NodeConfig),
    Jormungandr(JormungandrConfig),
}

/// Configuration of a `byron` or `shelley` node
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NodeConfig {
    /// Directory containing the node configuration and genesis files
    pub configuration_dir: PathBuf,
    #[serde(default)]
    pub network: NodeNetwork,
    /// Path of the node's IPC socket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_file: Option<PathBuf>,
}

impl NodeConfig {
    /// Genesis file name, ignoring empty values
    pub fn genesis_file(&self) -> Option<&str> {
        self.network
            .genesis_file
            .as_deref()
            .filter(|file| !file.is_empty())
    }
}

/// Network files of a `byron` or `shelley` node
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct NodeNetwork {
    /// Genesis file name, relative to the configuration directory.
    /// A leading `/` is ignored, the file always resolves inside that directory.
    /// Required for every network except mainnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis_file: Option<String>,
}

/// Configuration of a Jormungandr node
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JormungandrConfig {
    pub network: JormungandrNetwork,
    /// REST API port of the node
    pub rest_port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JormungandrNetwork {
    pub genesis_block: GenesisBlock,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenesisBlock {
    /// Hex-encoded hash of the genesis block
    pub hash: String,
}

/// Log destinations for the node and wallet child processes
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChildLogFiles {
    pub node: PathBuf,
    pub wallet: PathBuf,
}

/// Paths to the server TLS credentials
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TlsConfig {
    /// Certificate authority certificate
    pub ca_cert: PathBuf,
    /// Server certificate
    pub sv_cert: PathBuf,
    /// Server private key
    pub sv_key: PathBuf,
}

impl TlsConfig {
    /// All three credential paths must be set
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [
            ("ca_cert", &self.ca_cert),
            ("sv_cert", &self.sv_cert),
            ("sv_key", &self.sv_key),
        ]
        .into_iter()
        .filter(|(_, path)| path.as_os_str().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::IncompleteTlsConfig {
                missing: missing.join(", "),
            })
        }
    }
}

/// Launch configuration errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("genesis_file must be configured for network '{network}'")]
    MissingGenesisFile { network: String },
    #[error("incomplete TLS configuration, missing: {missing}")]
    IncompleteTlsConfig { missing: String },
    #[error("sync_tolerance must be a whole number of seconds, got {millis}ms")]
    SubSecondSyncTolerance { millis: u128 },
}
