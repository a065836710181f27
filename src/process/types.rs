//! Launch descriptor type definitions.
//!
//! This file contains the descriptor handed to the external process
//! supervisor, along with the small enums used while building it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::NodeBackendConfig;
use crate::{MAINNET, STAGING};

/// How the supervisor should ask a running process to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownMethod {
    /// Send a termination signal
    Kill,
    /// Close the process's standard input
    CloseStdin,
    /// Close a dedicated file descriptor passed to the process
    CloseFd,
}

/// Everything needed to start a service process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartService {
    /// Executable name, looked up on `PATH` by the supervisor
    pub command: String,
    pub args: Vec<String>,
    /// Environment variables set on top of the inherited environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_env: Option<BTreeMap<String, String>>,
    pub shutdown_method: ShutdownMethod,
}

/// Start descriptor of the wallet backend, with its resolved API port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStartService {
    #[serde(flatten)]
    pub service: StartService,
    pub api_port: u16,
}

impl WalletStartService {
    pub fn command(&self) -> &str {
        &self.service.command
    }

    pub fn args(&self) -> &[String] {
        &self.service.args
    }

    pub fn extra_env(&self) -> Option<&BTreeMap<String, String>> {
        self.service.extra_env.as_ref()
    }

    pub fn shutdown_method(&self) -> ShutdownMethod {
        self.service.shutdown_method
    }
}

/// Node backend kinds, one wallet executable each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Byron,
    Shelley,
    Jormungandr,
}

impl BackendKind {
    /// Get the string representation of the backend kind
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Byron => "byron",
            BackendKind::Shelley => "shelley",
            BackendKind::Jormungandr => "jormungandr",
        }
    }

    /// Name of the wallet executable serving this backend
    pub fn executable_name(&self) -> String {
        format!("{}-{}", crate::WALLET_EXECUTABLE_PREFIX, self.as_str())
    }
}

impl From<&NodeBackendConfig> for BackendKind {
    fn from(config: &NodeBackendConfig) -> Self {
        match config {
            NodeBackendConfig::Byron(_) => BackendKind::Byron,
            NodeBackendConfig::Shelley(_) => BackendKind::Shelley,
            NodeBackendConfig::Jormungandr(_) => BackendKind::Jormungandr,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network selection derived from the network label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSelection {
    Mainnet,
    Staging,
    /// Any other label names a testnet
    Testnet,
}

impl NetworkSelection {
    pub fn from_name(network_name: &str) -> Self {
        match network_name {
            MAINNET => NetworkSelection::Mainnet,
            STAGING => NetworkSelection::Staging,
            _ => NetworkSelection::Testnet,
        }
    }

    /// Command-line flag selecting this network
    pub fn flag(&self) -> &'static str {
        match self {
            NetworkSelection::Mainnet => "--mainnet",
            NetworkSelection::Staging => "--staging",
            NetworkSelection::Testnet => "--testnet",
        }
    }
}
