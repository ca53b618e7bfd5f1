//! Endpoint Configuration
//!
//! Parses human-edited endpoint configuration (a bare URL or a JSON map of
//! per-category URLs) into a canonical form, and serializes it back
//! deterministically for persistence.

use crate::endpoint::EndpointKey;
use crate::error::{ResolverError, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tracing::{debug, warn};

/// Raw endpoint input, classified by shape before parsing
#[derive(Debug, Clone, PartialEq)]
pub enum RawEndpointInput {
    /// Bare URL shorthand for the `openai` endpoint (possibly blank)
    Scalar(String),

    /// JSON object of category -> URL, in input order
    JsonObject(Map<String, Value>),

    /// Input that looked like a JSON object but failed to parse
    Invalid(String),
}

impl RawEndpointInput {
    /// Classify raw text by its leading character
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();

        if !trimmed.starts_with('{') {
            return RawEndpointInput::Scalar(trimmed.to_string());
        }

        match serde_json::from_str::<Map<String, Value>>(trimmed) {
            Ok(map) => RawEndpointInput::JsonObject(map),
            Err(e) => RawEndpointInput::Invalid(e.to_string()),
        }
    }
}

/// Canonical endpoint configuration: category -> URL, always in canonical order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig(BTreeMap<EndpointKey, String>);

impl EndpointConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw text, failing soft.
    ///
    /// Invalid JSON yields an empty config together with the parse error, so
    /// callers can keep showing the raw text while holding on to their last
    /// good canonical form.
    pub fn parse(raw: &str) -> (Self, Option<ResolverError>) {
        match RawEndpointInput::classify(raw) {
            RawEndpointInput::Scalar(url) => {
                let mut config = Self::new();
                config.insert(EndpointKey::OpenAi, &url);
                (config, None)
            }
            RawEndpointInput::JsonObject(map) => (Self::from_json_map(map), None),
            RawEndpointInput::Invalid(msg) => (Self::new(), Some(ResolverError::Parse(msg))),
        }
    }

    fn from_json_map(map: Map<String, Value>) -> Self {
        let mut config = Self::new();
        let mut sources: HashMap<EndpointKey, String> = HashMap::new();

        for (raw_key, value) in map {
            let Some(key) = EndpointKey::canonicalize(&raw_key) else {
                debug!(key = %raw_key, "dropping unknown endpoint category");
                continue;
            };

            let url = match value {
                Value::String(s) if !s.trim().is_empty() => s,
                other => {
                    debug!(key = %raw_key, value = %other, "dropping non-string or empty endpoint value");
                    continue;
                }
            };

            if let Some(previous) = sources.insert(key, raw_key.clone()) {
                warn!(
                    category = %key,
                    previous = %previous,
                    current = %raw_key,
                    "endpoint aliases collide, keeping the later one"
                );
            }

            config.insert(key, &url);
        }

        config
    }

    /// Serialize to the canonical persisted form.
    ///
    /// A config holding only an `openai` URL collapses to the bare URL, unless
    /// that URL starts with `{` and would read back as JSON.
    pub fn serialize(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }

        if self.0.len() == 1 {
            if let Some(url) = self.0.get(&EndpointKey::OpenAi) {
                if !url.starts_with('{') {
                    return url.clone();
                }
            }
        }

        // A map of plain strings keyed by unit variants cannot fail to serialize
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }

    /// Require a `default` or `openai` endpoint
    pub fn validate(&self) -> Result<()> {
        if self.0.contains_key(&EndpointKey::Default) || self.0.contains_key(&EndpointKey::OpenAi) {
            Ok(())
        } else {
            Err(ResolverError::Validation(
                "either a 'default' or an 'openai' endpoint must be configured".to_string(),
            ))
        }
    }

    /// Get the URL for a category
    pub fn get(&self, key: EndpointKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    /// Set the URL for a category; blank URLs are ignored
    pub fn insert(&mut self, key: EndpointKey, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }
        self.0.insert(key, url.to_string());
        true
    }

    /// Remove a category
    pub fn remove(&mut self, key: EndpointKey) -> Option<String> {
        self.0.remove(&key)
    }

    /// Iterate entries in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (EndpointKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for EndpointConfig {
    type Err = ResolverError;

    /// Strict parse: invalid JSON is an error rather than an empty config
    fn from_str(raw: &str) -> Result<Self> {
        match Self::parse(raw) {
            (_, Some(err)) => Err(err),
            (config, None) => Ok(config),
        }
    }
}

/// Editor state for endpoint configuration text.
///
/// Keeps the user's raw text separate from the last canonical config that
/// parsed successfully.
#[derive(Debug, Clone, Default)]
pub struct EndpointDraft {
    raw: String,
    canonical: EndpointConfig,
    error: Option<ResolverError>,
}

impl EndpointDraft {
    /// Start a draft from stored or typed text
    pub fn new(raw: &str) -> Self {
        let mut draft = Self::default();
        draft.update(raw);
        draft
    }

    /// Replace the raw text; the canonical form only moves on a successful parse
    pub fn update(&mut self, raw: &str) {
        self.raw = raw.to_string();

        match Self::parse_raw(raw) {
            Ok(config) => {
                self.canonical = config;
                self.error = None;
            }
            Err(err) => {
                debug!(error = %err, "keeping last valid endpoint configuration");
                self.error = Some(err);
            }
        }
    }

    fn parse_raw(raw: &str) -> Result<EndpointConfig> {
        raw.parse()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn canonical(&self) -> &EndpointConfig {
        &self.canonical
    }

    pub fn error(&self) -> Option<&ResolverError> {
        self.error.as_ref()
    }

    /// Canonical text to persist
    pub fn serialized(&self) -> String {
        self.canonical.serialize()
    }
}
