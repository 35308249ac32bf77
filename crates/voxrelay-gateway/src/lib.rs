//! WebSocket voice relay server.
//!
//! One task per client connection: inbound messages drive a strictly
//! sequential transcribe -> generate -> synthesize pipeline, with structured
//! JSON frames and raw audio frames streamed back on the same socket.

pub mod connection;
pub mod server;
pub mod state;

pub use server::start_gateway;
pub use state::GatewayState;
