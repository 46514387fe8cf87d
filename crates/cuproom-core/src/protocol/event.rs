//! Event tags and typed payloads.
//!
//! Inbound frames are decoded in two steps: the tag picks an [`EventType`],
//! then the payload is deserialized into the matching [`InboundEvent`]
//! variant. Outbound events serialize straight to `{"type", "payload"}`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CupRoomError, Result};

/// Closed set of event tags known to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    // inbound
    SendMessage,
    CreateEvent,
    JoinEvent,
    LeaveEvent,
    StartEvent,
    EndEvent,
    MarkRound,
    // outbound
    NewMessage,
    NewJoinEvent,
    NewLeaveEvent,
    NewStartEvent,
    NewEndEvent,
    NewMarkRound,
}

impl EventType {
    /// Tags a client may send.
    pub const INBOUND: [EventType; 7] = [
        EventType::SendMessage,
        EventType::CreateEvent,
        EventType::JoinEvent,
        EventType::LeaveEvent,
        EventType::StartEvent,
        EventType::EndEvent,
        EventType::MarkRound,
    ];

    /// Wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::SendMessage => "send_message",
            EventType::CreateEvent => "create_event",
            EventType::JoinEvent => "join_event",
            EventType::LeaveEvent => "leave_event",
            EventType::StartEvent => "start_event",
            EventType::EndEvent => "end_event",
            EventType::MarkRound => "mark_round",
            EventType::NewMessage => "new_message",
            EventType::NewJoinEvent => "new_join_event",
            EventType::NewLeaveEvent => "new_leave_event",
            EventType::NewStartEvent => "new_start_event",
            EventType::NewEndEvent => "new_end_event",
            EventType::NewMarkRound => "new_mark_round",
        }
    }

    pub fn is_inbound(self) -> bool {
        Self::INBOUND.contains(&self)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CupRoomError;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s {
            "send_message" => EventType::SendMessage,
            "create_event" => EventType::CreateEvent,
            "join_event" => EventType::JoinEvent,
            "leave_event" => EventType::LeaveEvent,
            "start_event" => EventType::StartEvent,
            "end_event" => EventType::EndEvent,
            "mark_round" => EventType::MarkRound,
            "new_message" => EventType::NewMessage,
            "new_join_event" => EventType::NewJoinEvent,
            "new_leave_event" => EventType::NewLeaveEvent,
            "new_start_event" => EventType::NewStartEvent,
            "new_end_event" => EventType::NewEndEvent,
            "new_mark_round" => EventType::NewMarkRound,
            other => return Err(CupRoomError::UnknownEvent(other.to_string())),
        };
        Ok(ty)
    }
}

/// `send_message` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub message: String,
    pub from: String,
}

/// Payload naming a cupping event (room).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub event_id: String,
}

/// `mark_round` payload; `time` is an opaque client clock string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkRound {
    pub event_id: String,
    pub time: String,
}

/// `new_message` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub message: String,
    pub from: String,
    pub sent: DateTime<Utc>,
}

/// Membership notice (`new_join_event` / `new_leave_event`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberNotice {
    pub event_id: String,
    pub user_id: String,
    pub user_name: String,
}

/// Decoded inbound event, one variant per inbound tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    SendMessage(SendMessage),
    CreateEvent(EventRef),
    JoinEvent(EventRef),
    LeaveEvent(EventRef),
    StartEvent(EventRef),
    EndEvent(EventRef),
    MarkRound(MarkRound),
}

impl InboundEvent {
    /// Decode `payload` into the variant selected by `ty`.
    pub fn decode(ty: EventType, payload: &str) -> Result<Self> {
        let ev = match ty {
            EventType::SendMessage => InboundEvent::SendMessage(parse(ty, payload)?),
            EventType::CreateEvent => InboundEvent::CreateEvent(parse(ty, payload)?),
            EventType::JoinEvent => InboundEvent::JoinEvent(parse(ty, payload)?),
            EventType::LeaveEvent => InboundEvent::LeaveEvent(parse(ty, payload)?),
            EventType::StartEvent => InboundEvent::StartEvent(parse(ty, payload)?),
            EventType::EndEvent => InboundEvent::EndEvent(parse(ty, payload)?),
            EventType::MarkRound => InboundEvent::MarkRound(parse(ty, payload)?),
            other => {
                return Err(CupRoomError::BadRequest(format!(
                    "{other} is not a client event"
                )))
            }
        };
        Ok(ev)
    }

    pub fn event_type(&self) -> EventType {
        match self {
            InboundEvent::SendMessage(_) => EventType::SendMessage,
            InboundEvent::CreateEvent(_) => EventType::CreateEvent,
            InboundEvent::JoinEvent(_) => EventType::JoinEvent,
            InboundEvent::LeaveEvent(_) => EventType::LeaveEvent,
            InboundEvent::StartEvent(_) => EventType::StartEvent,
            InboundEvent::EndEvent(_) => EventType::EndEvent,
            InboundEvent::MarkRound(_) => EventType::MarkRound,
        }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(ty: EventType, payload: &str) -> Result<T> {
    serde_json::from_str(payload)
        .map_err(|e| CupRoomError::BadRequest(format!("{ty} invalid payload: {e}")))
}

/// Event produced by the hub for room members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundEvent {
    NewMessage(NewMessage),
    NewJoinEvent(MemberNotice),
    NewLeaveEvent(MemberNotice),
    NewStartEvent(EventRef),
    NewEndEvent(EventRef),
    NewMarkRound(MarkRound),
}

impl OutboundEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            OutboundEvent::NewMessage(_) => EventType::NewMessage,
            OutboundEvent::NewJoinEvent(_) => EventType::NewJoinEvent,
            OutboundEvent::NewLeaveEvent(_) => EventType::NewLeaveEvent,
            OutboundEvent::NewStartEvent(_) => EventType::NewStartEvent,
            OutboundEvent::NewEndEvent(_) => EventType::NewEndEvent,
            OutboundEvent::NewMarkRound(_) => EventType::NewMarkRound,
        }
    }

    /// Serialize to the wire envelope text.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CupRoomError::Internal(format!("json encode failed: {e}")))
    }
}
