//! Connectivity precondition for network-dependent jobs.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::NetworkConfig;

/// Answers "is the network available now".
pub trait NetworkProbe: Send + Sync {
    fn is_network_available(&self) -> bool;
}

impl<F> NetworkProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_network_available(&self) -> bool {
        self()
    }
}

/// Fixed answer; useful when the caller already knows the connectivity state.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

impl NetworkProbe for StaticProbe {
    fn is_network_available(&self) -> bool {
        self.0
    }
}

/// Reports the network as available if a TCP connection to `addr` opens
/// within the timeout.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &NetworkConfig) -> Self {
        Self::new(cfg.probe_addr.clone(), Duration::from_millis(cfg.probe_timeout_ms))
    }
}

impl NetworkProbe for TcpProbe {
    fn is_network_available(&self) -> bool {
        let addrs = match self.addr.to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::debug!(addr = %self.addr, error = %e, "network probe could not resolve");
                return false;
            }
        };
        for addr in addrs {
            if TcpStream::connect_timeout(&addr, self.timeout).is_ok() {
                return true;
            }
        }
        tracing::debug!(addr = %self.addr, "network probe failed to connect");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn tcp_probe_sees_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        assert!(TcpProbe::new(addr, Duration::from_millis(500)).is_network_available());
    }

    #[test]
    fn tcp_probe_fails_on_closed_port() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };
        assert!(!TcpProbe::new(addr, Duration::from_millis(200)).is_network_available());
    }

    #[test]
    fn closures_and_static_probes() {
        assert!(StaticProbe(true).is_network_available());
        assert!(!StaticProbe(false).is_network_available());
        let probe = || false;
        assert!(!probe.is_network_available());
    }
}
