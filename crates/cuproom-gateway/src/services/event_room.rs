use async_trait::async_trait;

use cuproom_core::error::{CupRoomError, Result};
use cuproom_core::protocol::event::MemberNotice;
use cuproom_core::protocol::{EventType, InboundEvent, OutboundEvent};

use crate::dispatch::EventService;
use crate::realtime::ClientCtx;

/// Room lifecycle for cupping events: create (host), join, leave.
#[derive(Default)]
pub struct EventRoomService;

impl EventRoomService {
    pub fn new() -> Self {
        Self
    }
}

fn notice(ctx: &ClientCtx, event_id: String) -> MemberNotice {
    MemberNotice {
        event_id,
        user_id: ctx.user_id().to_string(),
        user_name: ctx.user_name().to_string(),
    }
}

#[async_trait]
impl EventService for EventRoomService {
    fn name(&self) -> &'static str {
        "event_room"
    }

    fn event_types(&self) -> &'static [EventType] {
        &[EventType::CreateEvent, EventType::JoinEvent, EventType::LeaveEvent]
    }

    async fn handle(&self, ctx: ClientCtx, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::CreateEvent(req) => {
                ctx.create_room(&req.event_id).await?;
                tracing::info!(event_id = %req.event_id, user_id = %ctx.user_id(), "event room created");
                Ok(())
            }
            InboundEvent::JoinEvent(req) => {
                let leader = ctx.join_room(&req.event_id).await?;
                tracing::info!(event_id = %req.event_id, user_id = %ctx.user_id(), %leader, "event room joined");
                let out = OutboundEvent::NewJoinEvent(notice(&ctx, req.event_id.clone()));
                ctx.broadcast(&req.event_id, &out).await?;
                Ok(())
            }
            InboundEvent::LeaveEvent(req) => {
                let left = ctx.leave_room().await?.ok_or(CupRoomError::NotInRoom)?;
                if left != req.event_id {
                    tracing::debug!(%left, event_id = %req.event_id, "leave_event names another room, announcing the room left");
                }
                // only members of the room actually left hear about it
                let out = OutboundEvent::NewLeaveEvent(notice(&ctx, left.clone()));
                ctx.broadcast(&left, &out).await?;
                Ok(())
            }
            other => Err(super::misrouted(self.name(), &other)),
        }
    }
}
