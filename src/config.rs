use crate::constants::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_UPSTREAM};
use crate::error::ProxyError;

/// Process-wide proxy configuration. Read-only once the server starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Upstream base URL without a trailing slash
    pub upstream: String,
}

impl Config {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        upstream: impl AsRef<str>,
    ) -> Result<Self, ProxyError> {
        Ok(Self {
            host: host.into(),
            port,
            upstream: normalize_upstream(upstream.as_ref())?,
        })
    }

    /// Fill in defaults for anything not given on the command line or in
    /// `CLAUDE_OC_PROXY_*` variables (both already merged by the CLI parser).
    pub fn resolve(
        host: Option<String>,
        port: Option<u16>,
        upstream: Option<String>,
    ) -> Result<Self, ProxyError> {
        Self::new(
            host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port.unwrap_or(DEFAULT_PORT),
            upstream.unwrap_or_else(|| DEFAULT_UPSTREAM.to_string()),
        )
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Validate the upstream base URL and drop any trailing slash, so that
/// `<upstream><path>` never produces `//`.
fn normalize_upstream(upstream: &str) -> Result<String, ProxyError> {
    let trimmed = upstream.trim().trim_end_matches('/');

    let url = url::Url::parse(trimmed)
        .map_err(|e| ProxyError::InvalidUpstream(format!("{trimmed}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ProxyError::InvalidUpstream(format!(
            "{trimmed}: expected an http(s) URL with a host"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ProxyError::InvalidUpstream(format!(
            "{trimmed}: query and fragment are not allowed"
        )));
    }

    Ok(trimmed.to_string())
}
