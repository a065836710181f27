//! Launch descriptor module.
//!
//! This module builds the descriptor an external supervisor uses to start
//! the wallet backend server: executable, arguments, environment, shutdown
//! method and API port.

pub mod port;
pub mod types;
pub mod wallet;

// Re-export commonly used items for convenience
pub use port::{EphemeralPortAllocator, PortAllocator};
pub use types::{BackendKind, NetworkSelection, ShutdownMethod, StartService, WalletStartService};
pub use wallet::{build_wallet_service, build_wallet_service_with, BuildError};
