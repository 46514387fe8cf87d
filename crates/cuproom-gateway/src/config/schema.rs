use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use cuproom_core::error::{CupRoomError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub origin: OriginSection,

    #[serde(default)]
    pub auth: AuthSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CupRoomError::BadRequest("unsupported config version".into()));
        }

        self.gateway.validate()?;
        self.auth.validate()?;

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            origin: OriginSection::default(),
            auth: AuthSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Read deadline; a peer silent this long (no pong) is dropped.
    #[serde(default = "default_pong_wait_ms")]
    pub pong_wait_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Outbound queue depth per connection.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            pong_wait_ms: default_pong_wait_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            mailbox_capacity: default_mailbox_capacity(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1000..=600000).contains(&self.pong_wait_ms) {
            return Err(CupRoomError::BadRequest(
                "gateway.pong_wait_ms must be between 1000 and 600000".into(),
            ));
        }
        if !(64..=65536).contains(&self.max_frame_bytes) {
            return Err(CupRoomError::BadRequest(
                "gateway.max_frame_bytes must be between 64 and 65536".into(),
            ));
        }
        if !(1..=65536).contains(&self.mailbox_capacity) {
            return Err(CupRoomError::BadRequest(
                "gateway.mailbox_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            CupRoomError::BadRequest(format!(
                "gateway.listen must be a valid socket address: {}",
                self.listen
            ))
        })
    }

    pub fn pong_wait(&self) -> Duration {
        Duration::from_millis(self.pong_wait_ms)
    }

    /// Heartbeat period: 9/10 of the read deadline, so a ping always lands
    /// before the deadline expires.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.pong_wait_ms * 9 / 10)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_pong_wait_ms() -> u64 {
    10000
}
fn default_max_frame_bytes() -> usize {
    512
}
fn default_mailbox_capacity() -> usize {
    256
}

/// Upgrade origin policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OriginSection {
    #[serde(default = "default_true")]
    pub allow_localhost: bool,

    /// RFC 1918 IPv4 and unique-local IPv6 hosts.
    #[serde(default = "default_true")]
    pub allow_private_networks: bool,

    /// Extra host names accepted verbatim (case-insensitive).
    #[serde(default)]
    pub allowed_hosts: Vec<String>,

    /// Development only: accept any origin not matched above.
    #[serde(default)]
    pub allow_any: bool,
}

impl Default for OriginSection {
    fn default() -> Self {
        Self {
            allow_localhost: true,
            allow_private_networks: true,
            allowed_hosts: Vec::new(),
            allow_any: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// Unknown or missing tokens get a `guest-<uuid>` identity.
    #[serde(default)]
    pub allow_guests: bool,

    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        for t in &self.tokens {
            if t.token.is_empty() || t.user_id.is_empty() {
                return Err(CupRoomError::BadRequest(
                    "auth.tokens entries need a non-empty token and user_id".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenEntry {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
}
