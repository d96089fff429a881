//! Backend adapters for the housekeeping core: the REST client and the
//! socket.io push channel.

mod client;
mod error;
pub mod realtime;
mod types;

pub use client::{HousekeepingClient, ProgressFn};
pub use error::{ClientError, Result};
pub use realtime::{EventRoutes, ReconnectPolicy, RouteKind, SocketChannel};
pub use types::*;
