//! API port allocation.
//!
//! When no API port is configured the launcher asks the operating system for
//! an ephemeral port. The port is released again before the wallet process
//! binds it, so another process may grab it in between. Callers that cannot
//! tolerate this should configure an explicit port.

use log::debug;
use std::io;
use std::net::{Ipv4Addr, TcpListener};

/// Source of free TCP ports
pub trait PortAllocator {
    /// Return a TCP port that is not in use at the time of the call
    fn allocate_free_port(&self) -> io::Result<u16>;
}

/// Allocates ports by binding an ephemeral loopback port and releasing it
#[derive(Debug, Clone, Copy, Default)]
pub struct EphemeralPortAllocator;

impl PortAllocator for EphemeralPortAllocator {
    fn allocate_free_port(&self) -> io::Result<u16> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let port = listener.local_addr()?.port();
        drop(listener);
        debug!("Allocated ephemeral port {}", port);
        Ok(port)
    }
}
