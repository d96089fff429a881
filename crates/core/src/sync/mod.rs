//! Client-side reconciliation: entity cache, push channel contracts and room views.

mod entity_cache;
mod push_model;
mod room_view;

pub use entity_cache::*;
pub use push_model::*;
pub use room_view::*;
