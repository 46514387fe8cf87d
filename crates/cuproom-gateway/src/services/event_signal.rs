use async_trait::async_trait;

use cuproom_core::error::Result;
use cuproom_core::protocol::event::{EventRef, MarkRound};
use cuproom_core::protocol::{EventType, InboundEvent, OutboundEvent};

use crate::dispatch::EventService;
use crate::realtime::ClientCtx;

/// Session signals relayed to the named room: start, end, round marks.
#[derive(Default)]
pub struct EventSignalService;

impl EventSignalService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventService for EventSignalService {
    fn name(&self) -> &'static str {
        "event_signal"
    }

    fn event_types(&self) -> &'static [EventType] {
        &[EventType::StartEvent, EventType::EndEvent, EventType::MarkRound]
    }

    async fn handle(&self, ctx: ClientCtx, event: InboundEvent) -> Result<()> {
        let (room, out) = match event {
            InboundEvent::StartEvent(EventRef { event_id }) => (
                event_id.clone(),
                OutboundEvent::NewStartEvent(EventRef { event_id }),
            ),
            InboundEvent::EndEvent(EventRef { event_id }) => (
                event_id.clone(),
                OutboundEvent::NewEndEvent(EventRef { event_id }),
            ),
            InboundEvent::MarkRound(MarkRound { event_id, time }) => (
                event_id.clone(),
                OutboundEvent::NewMarkRound(MarkRound { event_id, time }),
            ),
            other => return Err(super::misrouted(self.name(), &other)),
        };

        let delivered = ctx.broadcast(&room, &out).await?;
        tracing::debug!(event_type = %out.event_type(), %room, delivered, "signal relayed");
        Ok(())
    }
}
