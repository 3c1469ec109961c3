//! Matchmaking and signaling relay server implementation.

pub mod error;
mod handler;
pub mod matchmaker;
pub mod pool;
pub mod protocol;
pub mod registry;
pub mod rooms;
mod runner;
mod shutdown;
mod state;

pub use matchmaker::Matchmaker;
pub use protocol::{ClientEvent, ServerEvent};
pub use registry::ConnectionId;
pub use rooms::RoomId;
pub use runner::run_server;
