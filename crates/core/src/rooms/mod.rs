//! Room domain: records, patches, listings and dashboard views over them.

mod rooms_api;
mod rooms_filter;
mod rooms_model;

pub use rooms_api::*;
pub use rooms_filter::*;
pub use rooms_model::*;
