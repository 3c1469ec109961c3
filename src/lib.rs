//! Matchmaking and signaling relay server for anonymous one-on-one chat.
//!
//! Pairs connected clients by interest overlap and relays the opaque
//! signaling and chat payloads each pair needs to establish a direct
//! peer connection.

pub mod common;
pub mod server;
