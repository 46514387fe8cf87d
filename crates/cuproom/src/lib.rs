//! Top-level facade crate for cuproom.
//!
//! Re-exports the wire contracts and the hub/gateway library so users can depend on a single crate.

pub mod core {
    pub use cuproom_core::*;
}

pub mod gateway {
    pub use cuproom_gateway::*;
}
