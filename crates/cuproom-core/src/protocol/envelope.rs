//! Event envelope (JSON text frame).
//!
//! The payload is kept as `RawValue` so the hub never parses it; only the
//! dispatcher decodes it once the tag has selected a target variant.

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{CupRoomError, Result};

/// Inbound envelope (Text frame).
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Event tag (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Optional payload, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
}

impl Envelope {
    /// Parse a text frame into an envelope without touching the payload.
    pub fn from_text(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CupRoomError::BadRequest(format!("invalid envelope json: {e}")))
    }

    /// Raw payload JSON; an absent payload reads as `null`.
    pub fn payload_json(&self) -> &str {
        self.payload.as_deref().map(RawValue::get).unwrap_or("null")
    }
}
