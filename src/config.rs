use std::{
    net::{Ipv4Addr, SocketAddr, ToSocketAddrs},
    path::PathBuf,
};

use crate::{
    constants::*,
    error::{RdtError, Result},
};

/// Where to listen, where to reply, and where to put the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Host of the link emulator that relays ACKs back to the sender.
    pub remote_host: String,
    pub remote_port: u16,
    /// Port data arrives on, bound on every local interface.
    pub local_port: u16,
    pub output_path: PathBuf,
    pub arrival_log_path: PathBuf,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            remote_host: DEFAULT_REMOTE_HOST.to_string(),
            remote_port: DEFAULT_REMOTE_PORT,
            local_port: DEFAULT_LOCAL_PORT,
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            arrival_log_path: PathBuf::from(DEFAULT_ARRIVAL_LOG),
        }
    }
}

impl ReceiverConfig {
    pub fn local_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.local_port))
    }

    /// Resolves the remote endpoint once; it is never relearned from traffic.
    pub fn remote_addr(&self) -> Result<SocketAddr> {
        let target = format!("{}:{}", self.remote_host, self.remote_port);
        target
            .to_socket_addrs()
            .map_err(|_| RdtError::AddrResolve(target.clone()))?
            .find(SocketAddr::is_ipv4)
            .ok_or(RdtError::AddrResolve(target))
    }
}
