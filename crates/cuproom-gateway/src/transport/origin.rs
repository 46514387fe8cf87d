//! Origin gate applied before the WebSocket upgrade.
//!
//! Order: missing header, malformed, localhost/loopback, private network,
//! explicit host list, then the development-only `allow_any` fallback.

use std::net::IpAddr;

use axum::http::Uri;

use cuproom_core::error::{CupRoomError, Result};

use crate::config::OriginSection;

#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allow_localhost: bool,
    allow_private_networks: bool,
    allowed_hosts: Vec<String>,
    allow_any: bool,
}

impl OriginPolicy {
    pub fn from_config(cfg: &OriginSection) -> Self {
        Self {
            allow_localhost: cfg.allow_localhost,
            allow_private_networks: cfg.allow_private_networks,
            allowed_hosts: cfg.allowed_hosts.iter().map(|h| h.to_ascii_lowercase()).collect(),
            allow_any: cfg.allow_any,
        }
    }

    /// `origin` is the raw `Origin` header, `None` when absent.
    pub fn check(&self, origin: Option<&str>) -> Result<()> {
        // Non-browser clients (curl, native apps) send no Origin.
        let Some(origin) = origin else { return Ok(()) };

        let host = parse_host(origin)
            .ok_or_else(|| CupRoomError::OriginRejected(format!("malformed origin: {origin}")))?;

        if self.allow_localhost && is_local(&host) {
            return Ok(());
        }
        if self.allow_private_networks && is_private(&host) {
            return Ok(());
        }
        if self.allowed_hosts.iter().any(|h| *h == host) {
            return Ok(());
        }
        if self.allow_any {
            tracing::warn!(%origin, "accepting unrecognized origin (allow_any)");
            return Ok(());
        }
        Err(CupRoomError::OriginRejected(origin.to_string()))
    }
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self::from_config(&OriginSection::default())
    }
}

/// Lowercased host of an absolute origin URI, IPv6 brackets stripped.
fn parse_host(origin: &str) -> Option<String> {
    let uri: Uri = origin.parse().ok()?;
    uri.scheme()?;
    let host = uri.host()?.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

fn is_local(host: &str) -> bool {
    host == "localhost" || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

fn is_private(host: &str) -> bool {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_private() || v4.is_link_local(),
        // fc00::/7 unique local
        Ok(IpAddr::V6(v6)) => (v6.segments()[0] & 0xfe00) == 0xfc00,
        Err(_) => false,
    }
}
