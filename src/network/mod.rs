//! Network Layer
//!
//! The WebSocket front end: wire protocol types and the server that
//! speaks them.

pub mod protocol;
pub mod server;

pub use protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};
pub use server::{MatchServer, MatchServerError, ServerConfig};
