//! Router Module
//!
//! Resolves endpoint URLs and selects credentials for outbound calls.

pub mod route;
pub mod selection;

pub use route::EndpointRoute;
pub use selection::{select, CursorStore, KeySelector, SelectionPolicy};
