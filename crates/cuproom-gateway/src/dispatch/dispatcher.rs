use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use cuproom_core::error::{CupRoomError, Result};
use cuproom_core::protocol::{Envelope, EventType, InboundEvent};

use crate::realtime::ClientCtx;

/// Event services. One service may own several inbound tags.
#[async_trait]
pub trait EventService: Send + Sync {
    fn name(&self) -> &'static str;
    fn event_types(&self) -> &'static [EventType];
    async fn handle(&self, ctx: ClientCtx, event: InboundEvent) -> Result<()>;
}

/// Dispatch table: event tag -> service.
#[derive(Default)]
pub struct Dispatcher {
    handlers: DashMap<EventType, Arc<dyn EventService>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Route every tag the service declares to it. Later registrations win.
    pub fn register(&self, svc: Arc<dyn EventService>) {
        for &ty in svc.event_types() {
            if !ty.is_inbound() {
                tracing::warn!(svc = svc.name(), event_type = %ty, "skipping non-inbound event type");
                continue;
            }
            if let Some(prev) = self.handlers.insert(ty, Arc::clone(&svc)) {
                tracing::warn!(event_type = %ty, prev = prev.name(), svc = svc.name(), "event handler replaced");
            }
        }
    }

    pub fn registered_types(&self) -> Vec<EventType> {
        self.handlers.iter().map(|e| *e.key()).collect()
    }

    /// Tag lookup, then typed payload decode, then the handler.
    pub async fn dispatch(&self, ctx: ClientCtx, env: Envelope) -> Result<()> {
        let ty: EventType = env.event_type.parse()?;
        let handler = self
            .handlers
            .get(&ty)
            .ok_or_else(|| CupRoomError::UnknownEvent(env.event_type.clone()))?
            .value()
            .clone();
        let event = InboundEvent::decode(ty, env.payload_json())?;
        handler.handle(ctx, event).await
    }
}
