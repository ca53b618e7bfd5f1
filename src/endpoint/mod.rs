//! Endpoint Module
//!
//! Endpoint categories, canonical endpoint configuration and URL templates.

pub mod alias;
pub mod canonical;
pub mod template;

pub use alias::EndpointKey;
pub use canonical::{EndpointConfig, EndpointDraft, RawEndpointInput};
