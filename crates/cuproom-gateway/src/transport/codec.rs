//! Frame codec for the transport layer.
//!
//! - Text frames => Envelope (lazy `RawValue` payload)
//! - Ping/Pong/Close are surfaced for lifecycle management
//! - Binary frames carry no events and are surfaced only by size

use axum::extract::ws::Message;
use cuproom_core::{error::Result, protocol::Envelope};

#[derive(Debug)]
pub enum Inbound {
    Event(Envelope),
    Binary(usize),
    Ping,
    Pong,
    Close,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => Ok(Inbound::Event(Envelope::from_text(&s)?)),
        Message::Binary(b) => Ok(Inbound::Binary(b.len())),
        Message::Ping(_) => Ok(Inbound::Ping),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
    }
}
