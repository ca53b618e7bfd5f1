//! Credential Module
//!
//! Credential entries, raw input parsing and pool merging.

pub mod pool;

pub use pool::{
    CredentialEntry, CredentialPool, KeyInputMode, ParsedCredentials, RejectedEntry, UpdateMode,
};
