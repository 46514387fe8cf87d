//! Shared error type across cuproom crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed envelope or payload.
    BadRequest,
    /// Envelope `type` has no registered handler.
    UnknownEvent,
    /// Auth failed.
    AuthFailed,
    /// Origin not allowed by the upgrade policy.
    OriginRejected,
    /// Target room does not exist.
    RoomNotFound,
    /// Room already exists with members.
    RoomExists,
    /// Operation requires a current room.
    NotInRoom,
    /// Hub has shut down.
    HubClosed,
    /// Physical connection failure.
    Transport,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::UnknownEvent => "UNKNOWN_EVENT",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::OriginRejected => "ORIGIN_REJECTED",
            ClientCode::RoomNotFound => "ROOM_NOT_FOUND",
            ClientCode::RoomExists => "ROOM_EXISTS",
            ClientCode::NotInRoom => "NOT_IN_ROOM",
            ClientCode::HubClosed => "HUB_CLOSED",
            ClientCode::Transport => "TRANSPORT",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CupRoomError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum CupRoomError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("no handler for event type: {0}")]
    UnknownEvent(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("origin rejected: {0}")]
    OriginRejected(String),
    #[error("room not found: {0}")]
    RoomNotFound(String),
    #[error("room already exists: {0}")]
    RoomExists(String),
    #[error("client is not in a room")]
    NotInRoom,
    #[error("hub closed")]
    HubClosed,
    #[error("transport: {0}")]
    Transport(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl CupRoomError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            CupRoomError::BadRequest(_) => ClientCode::BadRequest,
            CupRoomError::UnknownEvent(_) => ClientCode::UnknownEvent,
            CupRoomError::AuthFailed => ClientCode::AuthFailed,
            CupRoomError::OriginRejected(_) => ClientCode::OriginRejected,
            CupRoomError::RoomNotFound(_) => ClientCode::RoomNotFound,
            CupRoomError::RoomExists(_) => ClientCode::RoomExists,
            CupRoomError::NotInRoom => ClientCode::NotInRoom,
            CupRoomError::HubClosed => ClientCode::HubClosed,
            CupRoomError::Transport(_) => ClientCode::Transport,
            CupRoomError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Whether this error ends the connection it occurred on.
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(self, CupRoomError::Transport(_) | CupRoomError::HubClosed)
    }
}
