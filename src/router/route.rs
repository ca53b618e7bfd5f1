//! Endpoint Routing
//!
//! Turns a channel's endpoint configuration into one concrete URL for a
//! request's endpoint category and model.

use crate::endpoint::template::{resolve, scheme_for_realtime};
use crate::endpoint::{EndpointConfig, EndpointKey};
use crate::error::{ResolverError, Result};

/// Categories consulted, in order, when the requested one is not configured
const FALLBACKS: [EndpointKey; 2] = [EndpointKey::Default, EndpointKey::OpenAi];

/// A resolved endpoint for one outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRoute {
    /// Category that was requested
    pub requested: EndpointKey,

    /// Category whose URL was actually used
    pub matched: EndpointKey,

    /// Fully expanded URL
    pub url: String,
}

impl EndpointRoute {
    /// Resolve the URL for `key`, falling back to `default` and then `openai`
    pub fn resolve(config: &EndpointConfig, key: EndpointKey, model: Option<&str>) -> Result<Self> {
        let (matched, template) = std::iter::once(key)
            .chain(FALLBACKS)
            .find_map(|k| config.get(k).map(|url| (k, url)))
            .ok_or(ResolverError::EndpointNotConfigured { key })?;

        let mut url = resolve(template, model);
        if key == EndpointKey::OpenAiRealtime {
            url = scheme_for_realtime(&url);
        }

        Ok(Self {
            requested: key,
            matched,
            url,
        })
    }

    /// Whether the URL came from a fallback category
    pub fn is_fallback(&self) -> bool {
        self.requested != self.matched
    }
}

impl std::fmt::Display for EndpointRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_fallback() {
            write!(f, "{} (via {}) -> {}", self.requested, self.matched, self.url)
        } else {
            write!(f, "{} -> {}", self.requested, self.url)
        }
    }
}
