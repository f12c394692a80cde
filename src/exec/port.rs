// src/exec/port.rs

use std::fmt::Debug;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

/// Checks whether a local service is accepting connections.
pub trait PortCheck: Send + Sync + Debug {
    fn is_listening(&self, addr: SocketAddr) -> bool;
}

/// Connects with a short timeout.
#[derive(Debug, Clone)]
pub struct TcpPortCheck {
    pub timeout: Duration,
}

impl Default for TcpPortCheck {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
        }
    }
}

impl PortCheck for TcpPortCheck {
    fn is_listening(&self, addr: SocketAddr) -> bool {
        match TcpStream::connect_timeout(&addr, self.timeout) {
            Ok(_) => true,
            Err(e) => {
                debug!(%addr, error = %e, "nothing listening");
                false
            }
        }
    }
}
