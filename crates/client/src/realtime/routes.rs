//! Maps socket.io event names onto tagged push messages.

use std::collections::HashMap;

use serde_json::Value;

use housekeeping_core::rooms::{RoomListing, RoomPatch};
use housekeeping_core::sync::PushMessage;

use crate::error::{payload_detail, ClientError, Result};

pub const ROOM_STATUS_CHANGED: &str = "roomStatusChanged";
pub const ROOMS_UPDATED: &str = "roomsUpdated";
pub const HOUSEKEEPING_PUSH: &str = "housekeeping:push";

/// How an event's payload is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Single-room partial record.
    Delta,
    /// Room listing, bare or wrapped in `data`.
    Snapshot,
    /// Already tagged with `kind`.
    Tagged,
}

#[derive(Debug, Clone)]
pub struct EventRoutes {
    routes: HashMap<String, RouteKind>,
}

impl Default for EventRoutes {
    fn default() -> Self {
        Self::empty()
            .with_route(ROOM_STATUS_CHANGED, RouteKind::Delta)
            .with_route(ROOMS_UPDATED, RouteKind::Snapshot)
            .with_route(HOUSEKEEPING_PUSH, RouteKind::Tagged)
    }
}

impl EventRoutes {
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    pub fn with_route(mut self, event: impl Into<String>, kind: RouteKind) -> Self {
        self.routes.insert(event.into(), kind);
        self
    }

    pub fn route(&self, event: &str) -> Option<RouteKind> {
        self.routes.get(event).copied()
    }

    /// Translates one event. `Ok(None)` for events with no route.
    pub fn translate(&self, event: &str, data: Value) -> Result<Option<PushMessage>> {
        let Some(kind) = self.route(event) else {
            return Ok(None);
        };
        let message = match kind {
            RouteKind::Delta => PushMessage::Delta {
                room: serde_json::from_value::<RoomPatch>(data)
                    .map_err(|e| ClientError::malformed(format!("{}: {}", event, e)))?,
            },
            RouteKind::Snapshot => PushMessage::Snapshot {
                rooms: RoomListing::from_value(data).map_err(|e| {
                    ClientError::malformed(format!("{}: {}", event, payload_detail(e)))
                })?,
            },
            RouteKind::Tagged => serde_json::from_value::<PushMessage>(data)
                .map_err(|e| ClientError::malformed(format!("{}: {}", event, e)))?,
        };
        Ok(Some(message))
    }
}
