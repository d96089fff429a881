//! Core domain for the motel housekeeping client.
//!
//! Rooms, the keyed cache that holds them, the backend and push-channel
//! contracts, and [`sync::RoomView`], which keeps a cache current through
//! pull, push and optimistic writes.

pub mod auth;
pub mod errors;
pub mod notices;
pub mod rooms;
pub mod sync;

pub use errors::{Error, Result};
