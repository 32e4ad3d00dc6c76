// File: net/probes.rs
// Reachability probes. Connection failures are answers here, not errors;
// only name resolution failures propagate.

use crate::core::error::CoreError;
use crate::core::http::{HttpConfig, DEFAULT_CONFIG};
use crate::core::request_impl::{dispatch, HttpRequest};
use log::debug;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

pub const DEFAULT_ONLINE_URL: &str = "http://www.google.com";
pub const DEFAULT_PORT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT_TIMEOUT: Duration = Duration::from_secs(1);
pub const QUICK_PORT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Open,
    /// Nothing accepted the connection in time; carries the last connect error.
    Closed(io::ErrorKind),
}

impl PortState {
    pub fn is_open(self) -> bool {
        self == PortState::Open
    }
}

#[derive(Debug)]
pub enum Reachability {
    Reachable,
    Unreachable(CoreError),
}

impl Reachability {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Reachability::Reachable)
    }
}

/// IPv4 addresses of `host`; an empty answer is a resolution failure.
fn resolve_v4(host: &str, port: u16) -> Result<Vec<SocketAddr>, CoreError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| {
            debug!("Resolving {} failed: {}", host, e);
            CoreError::Resolve(host.to_string())
        })?
        .filter(SocketAddr::is_ipv4)
        .collect();
    if addrs.is_empty() {
        return Err(CoreError::Resolve(host.to_string()));
    }
    Ok(addrs)
}

/// First IPv4 address `host` resolves to.
pub fn dns_ip_address(host: &str) -> Result<Ipv4Addr, CoreError> {
    resolve_v4(host, 0)?
        .into_iter()
        .find_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| CoreError::Resolve(host.to_string()))
}

/// Tries `addrs` in order until one accepts. All attempts share one `timeout`.
fn connect_any(addrs: &[SocketAddr], timeout: Duration) -> PortState {
    let deadline = Instant::now() + timeout;
    let mut last = io::ErrorKind::TimedOut;
    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return PortState::Closed(io::ErrorKind::TimedOut);
        }
        match TcpStream::connect_timeout(addr, remaining) {
            Ok(_) => return PortState::Open,
            Err(e) => {
                debug!("Port probe {} failed: {}", addr, e);
                last = e.kind();
            }
        }
    }
    PortState::Closed(last)
}

/// TCP connect to the IPv4 addresses of `host`, bounded by `timeout` overall.
pub fn probe_port(host: &str, port: u16, timeout: Duration) -> Result<PortState, CoreError> {
    Ok(connect_any(&resolve_v4(host, port)?, timeout))
}

pub fn port_is_open(port: u16, host: &str, timeout: Duration) -> Result<bool, CoreError> {
    Ok(probe_port(host, port, timeout)?.is_open())
}

/// [`port_is_open`] with the short timeout.
pub fn is_port_open(host: &str, port: u16) -> Result<bool, CoreError> {
    port_is_open(port, host, QUICK_PORT_TIMEOUT)
}

pub fn port_is_not_open(port: u16, host: &str, timeout: Duration) -> Result<bool, CoreError> {
    port_is_open(port, host, timeout).map(|open| !open)
}

/// Sends a HEAD request to `url`; any failure means unreachable.
pub fn probe_host(config: &HttpConfig, url: &str) -> Reachability {
    let request = HttpRequest::new(url).method("HEAD");
    match dispatch(config, &request) {
        Ok(_) => Reachability::Reachable,
        Err(e) => {
            debug!("Host probe {} failed: {}", url, e);
            Reachability::Unreachable(e)
        }
    }
}

pub fn current_host_online(url: Option<&str>) -> bool {
    probe_host(&DEFAULT_CONFIG, url.unwrap_or(DEFAULT_ONLINE_URL)).is_reachable()
}
