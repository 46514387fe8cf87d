//! cuproom gateway library entry.
//!
//! This crate wires the transport, dispatcher, hub, and built-in event
//! services into the real-time side of the cupping app. It is consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod context;
pub mod ops;
pub mod router;
pub mod transport;
pub mod dispatch;
pub mod realtime;
pub mod services;
