//! Development server host.
//!
//! Serves the project root as static files, runs plugin request rewriters in
//! front of it and pushes hot reload payloads over a WebSocket.

pub mod hmr;
pub mod server;

pub use hmr::{HmrChannel, HmrPayload, HMR_CHANNEL_CAPACITY, WILDCARD_PATH};
pub use server::{DevServer, HMR_ROUTE};
