//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use cuproom_core::error::{CupRoomError, Result};

pub use schema::{AuthSection, GatewayConfig, GatewaySection, OriginSection, TokenEntry};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| CupRoomError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| CupRoomError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
