// File: core/http.rs
// HTTP client configuration. Clients are built per call: the idle pool is
// disabled, so no connection outlives the request that opened it.

use super::error::CoreError;
use once_cell::sync::Lazy;
use reqwest::{blocking, header, tls, Client};
use std::time::Duration;

const APP_USER_AGENT: &str = concat!("net-helpers/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SEC: u64 = 30;

/// Configuration used by the verb helpers and the host probe.
pub static DEFAULT_CONFIG: Lazy<HttpConfig> = Lazy::new(HttpConfig::default);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    Tls1_2,
    Tls1_3,
}

impl TlsVersion {
    fn to_reqwest(self) -> tls::Version {
        match self {
            TlsVersion::Tls1_2 => tls::Version::TLS_1_2,
            TlsVersion::Tls1_3 => tls::Version::TLS_1_3,
        }
    }
}

/// Which TLS protocol versions a client may speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Negotiate the highest version both sides support, never below `min`.
    Negotiated { min: TlsVersion },
    /// Speak exactly this version.
    Pinned(TlsVersion),
}

impl Default for TlsPolicy {
    fn default() -> Self {
        TlsPolicy::Negotiated {
            min: TlsVersion::Tls1_2,
        }
    }
}

impl TlsPolicy {
    fn bounds(self) -> (tls::Version, Option<tls::Version>) {
        match self {
            TlsPolicy::Negotiated { min } => (min.to_reqwest(), None),
            TlsPolicy::Pinned(v) => (v.to_reqwest(), Some(v.to_reqwest())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub tls: TlsPolicy,
    pub timeout: Duration,
    pub user_agent: String,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` and friends.
    pub system_proxy: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            tls: TlsPolicy::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SEC),
            user_agent: APP_USER_AGENT.to_string(),
            system_proxy: true,
        }
    }
}

impl HttpConfig {
    pub fn with_tls(mut self, tls: TlsPolicy) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn without_system_proxy(mut self) -> Self {
        self.system_proxy = false;
        self
    }

    fn default_headers(&self) -> Result<header::HeaderMap, CoreError> {
        let mut headers = header::HeaderMap::new();
        let agent = header::HeaderValue::from_str(&self.user_agent)
            .map_err(|e| CoreError::InvalidHeader(format!("user agent: {}", e)))?;
        headers.insert(header::USER_AGENT, agent);
        Ok(headers)
    }

    /// Builds a single-use blocking client.
    pub fn blocking_client(&self) -> Result<blocking::Client, CoreError> {
        let (min, max) = self.tls.bounds();
        let mut builder = blocking::Client::builder()
            .default_headers(self.default_headers()?)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .min_tls_version(min);
        if let Some(max) = max {
            builder = builder.max_tls_version(max);
        }
        if !self.system_proxy {
            builder = builder.no_proxy();
        }
        Ok(builder.build()?)
    }

    /// Builds a single-use async client.
    pub fn async_client(&self) -> Result<Client, CoreError> {
        let (min, max) = self.tls.bounds();
        let mut builder = Client::builder()
            .default_headers(self.default_headers()?)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .pool_max_idle_per_host(0)
            .min_tls_version(min);
        if let Some(max) = max {
            builder = builder.max_tls_version(max);
        }
        if !self.system_proxy {
            builder = builder.no_proxy();
        }
        Ok(builder.build()?)
    }
}
