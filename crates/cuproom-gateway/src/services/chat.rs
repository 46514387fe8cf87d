use async_trait::async_trait;
use chrono::Utc;

use cuproom_core::error::{CupRoomError, Result};
use cuproom_core::protocol::event::NewMessage;
use cuproom_core::protocol::{EventType, InboundEvent, OutboundEvent};

use crate::dispatch::EventService;
use crate::realtime::ClientCtx;

/// Relays chat messages to the sender's current room.
#[derive(Default)]
pub struct ChatService;

impl ChatService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventService for ChatService {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn event_types(&self) -> &'static [EventType] {
        &[EventType::SendMessage]
    }

    async fn handle(&self, ctx: ClientCtx, event: InboundEvent) -> Result<()> {
        let req = match event {
            InboundEvent::SendMessage(req) => req,
            other => return Err(super::misrouted(self.name(), &other)),
        };

        let room = ctx.current_room().await?.ok_or(CupRoomError::NotInRoom)?;
        let out = OutboundEvent::NewMessage(NewMessage {
            message: req.message,
            from: req.from,
            sent: Utc::now(),
        });
        ctx.broadcast(&room, &out).await?;
        Ok(())
    }
}
