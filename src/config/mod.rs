//! Configuration Module
//!
//! Persisted channel records, admin edits and channel file loading.

pub mod channel;
pub mod loader;

pub use channel::{Channel, ChannelEdit, ChannelRecord, EditOutcome};
pub use loader::{ChannelLoader, ChannelsFile};
