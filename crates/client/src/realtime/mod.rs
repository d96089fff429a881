//! Realtime push over socket.io.

mod channel;
pub mod frame;
mod routes;

pub use channel::{ReconnectPolicy, SocketChannel};
pub use routes::{EventRoutes, RouteKind, HOUSEKEEPING_PUSH, ROOMS_UPDATED, ROOM_STATUS_CHANGED};
