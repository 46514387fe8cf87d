//! Built-in event services.
//!
//! Each one is a thin decode -> mutate/broadcast step over the hub.

pub mod chat;
pub mod event_room;
pub mod event_signal;

pub use chat::ChatService;
pub use event_room::EventRoomService;
pub use event_signal::EventSignalService;

use cuproom_core::error::CupRoomError;
use cuproom_core::protocol::InboundEvent;

fn misrouted(svc: &str, event: &InboundEvent) -> CupRoomError {
    CupRoomError::Internal(format!("{} routed to {svc}", event.event_type()))
}
