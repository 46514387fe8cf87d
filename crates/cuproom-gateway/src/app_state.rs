//! Shared application state for the cuproom gateway.
//!
//! Built once at startup: spawns the hub control loop, fills the dispatch
//! table with the built-in services, and compiles the upgrade gates.

use std::sync::Arc;

use cuproom_core::error::Result;
use cuproom_core::protocol::EventType;

use crate::config::GatewayConfig;
use crate::context::{Identity, IdentityResolver, StaticIdentityResolver};
use crate::dispatch::Dispatcher;
use crate::realtime::Hub;
use crate::services::{ChatService, EventRoomService, EventSignalService};
use crate::transport::OriginPolicy;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    hub: Hub,
    dispatcher: Arc<Dispatcher>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    origin: OriginPolicy,
    identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Build application state with the config-driven token resolver.
    /// Must run inside a tokio runtime (spawns the hub).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let resolver = Arc::new(StaticIdentityResolver::from_config(&cfg.auth));
        Self::with_identity_resolver(cfg, resolver)
    }

    /// Same as [`AppState::new`] with an injected token validator.
    pub fn with_identity_resolver(cfg: GatewayConfig, identity: Arc<dyn IdentityResolver>) -> Result<Self> {
        cfg.validate()?;
        let origin = OriginPolicy::from_config(&cfg.origin);

        let hub = Hub::spawn();
        let dispatcher = Dispatcher::new();
        dispatcher.register(Arc::new(ChatService::new()));
        dispatcher.register(Arc::new(EventRoomService::new()));
        dispatcher.register(Arc::new(EventSignalService::new()));

        // dispatch table sanity check
        let registered = dispatcher.registered_types();
        for ty in EventType::INBOUND {
            if !registered.contains(&ty) {
                tracing::warn!(event_type = %ty, "inbound event type has no handler");
            }
        }
        tracing::debug!(handlers = registered.len(), "dispatch table ready");

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, origin, identity }),
            hub,
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn origin_policy(&self) -> &OriginPolicy {
        &self.inner.origin
    }

    pub fn resolve_identity(&self, token: &str) -> Result<Identity> {
        self.inner.identity.resolve(token)
    }

    pub fn hub(&self) -> Hub {
        self.hub.clone()
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }
}
