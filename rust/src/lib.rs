//! Small network helpers: an HTTP dispatcher with verb shortcuts, reachability
//! probes, and [`catch`](core::catch::catch), which turns a failing call into a value.

pub mod core;
pub mod net;

pub use crate::core::catch::{catch, catch_async, Catch, ErrorResult, Failure, Outcome};
pub use crate::core::error::CoreError;
pub use crate::core::http::{HttpConfig, TlsPolicy, TlsVersion};
pub use crate::core::request_impl::{
    dispatch, dispatch_async, dispatch_raw, Body, Content, HttpRequest, TextEncoding,
};
pub use crate::net::probes::{
    current_host_online, dns_ip_address, is_port_open, port_is_not_open, port_is_open,
    probe_host, probe_port, PortState, Reachability,
};
pub use crate::net::verbs::Http;

/// Installs `env_logger` (filtered by `RUST_LOG`). Safe to call more than once.
pub fn init_logger() {
    let _ = env_logger::try_init();
}
