//! Endpoint Categories
//!
//! The closed set of endpoint categories a channel can expose, and the alias
//! table that maps historical spellings onto it.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical endpoint category.
///
/// Declaration order is the canonical serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EndpointKey {
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openai_responses")]
    OpenAiResponses,
    #[serde(rename = "embedding")]
    Embedding,
    #[serde(rename = "claude")]
    Claude,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "openai_image")]
    OpenAiImage,
    #[serde(rename = "openai_audio")]
    OpenAiAudio,
    #[serde(rename = "openai_realtime")]
    OpenAiRealtime,
    #[serde(rename = "rerank")]
    Rerank,
}

/// Normalized spelling -> canonical key
static ALIASES: Lazy<HashMap<&'static str, EndpointKey>> = Lazy::new(|| {
    use EndpointKey::*;

    [
        ("default", Default),
        ("base", Default),
        ("openai", OpenAi),
        ("chat", OpenAi),
        ("chat_completion", OpenAi),
        ("chat_completions", OpenAi),
        ("openai_chat", OpenAi),
        ("openai_response", OpenAiResponses),
        ("openai_responses", OpenAiResponses),
        ("response", OpenAiResponses),
        ("responses", OpenAiResponses),
        ("embedding", Embedding),
        ("embeddings", Embedding),
        ("openai_embedding", Embedding),
        ("openai_embeddings", Embedding),
        ("claude", Claude),
        ("anthropic", Claude),
        ("claude_messages", Claude),
        ("gemini", Gemini),
        ("google", Gemini),
        ("openai_image", OpenAiImage),
        ("openai_images", OpenAiImage),
        ("image", OpenAiImage),
        ("images", OpenAiImage),
        ("image_generation", OpenAiImage),
        ("openai_audio", OpenAiAudio),
        ("audio", OpenAiAudio),
        ("speech", OpenAiAudio),
        ("openai_realtime", OpenAiRealtime),
        ("realtime", OpenAiRealtime),
        ("rerank", Rerank),
        ("reranker", Rerank),
        ("reranks", Rerank),
    ]
    .into_iter()
    .collect()
});

impl EndpointKey {
    /// All categories in canonical order
    pub const ALL: [EndpointKey; 10] = [
        Self::Default,
        Self::OpenAi,
        Self::OpenAiResponses,
        Self::Embedding,
        Self::Claude,
        Self::Gemini,
        Self::OpenAiImage,
        Self::OpenAiAudio,
        Self::OpenAiRealtime,
        Self::Rerank,
    ];

    /// Canonical key string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::OpenAi => "openai",
            Self::OpenAiResponses => "openai_responses",
            Self::Embedding => "embedding",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::OpenAiImage => "openai_image",
            Self::OpenAiAudio => "openai_audio",
            Self::OpenAiRealtime => "openai_realtime",
            Self::Rerank => "rerank",
        }
    }

    /// Map a raw, human-typed category name onto a canonical key.
    ///
    /// Case, surrounding whitespace, `-` and inner spaces are not significant:
    /// `"Image Generation"`, `"image-generation"` and `"image_generation"` all
    /// resolve to [`EndpointKey::OpenAiImage`].
    pub fn canonicalize(raw: &str) -> Option<Self> {
        ALIASES.get(normalize(raw).as_str()).copied()
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase, trim, and fold `-`/whitespace runs into a single `_`
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for c in raw.trim().chars() {
        if c == '-' || c == '_' || c.is_whitespace() {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(c.to_lowercase());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_map_to_themselves() {
        for key in EndpointKey::ALL {
            assert_eq!(EndpointKey::canonicalize(key.as_str()), Some(key));
        }
    }

    #[test]
    fn test_historical_spellings() {
        for alias in ["openai_response", "openai_responses", "OpenAI-Responses"] {
            assert_eq!(
                EndpointKey::canonicalize(alias),
                Some(EndpointKey::OpenAiResponses)
            );
        }
        for alias in ["image", "images", "image_generation", " Image Generation "] {
            assert_eq!(
                EndpointKey::canonicalize(alias),
                Some(EndpointKey::OpenAiImage)
            );
        }
    }

    #[test]
    fn test_unmapped_keys() {
        assert_eq!(EndpointKey::canonicalize("moderation"), None);
        assert_eq!(EndpointKey::canonicalize(""), None);
        assert_eq!(EndpointKey::canonicalize("   "), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Chat - Completions "), "chat_completions");
        assert_eq!(normalize("openai__realtime"), "openai_realtime");
        assert_eq!(normalize("-rerank-"), "rerank");
    }

    #[test]
    fn test_canonical_order() {
        let mut sorted = EndpointKey::ALL;
        sorted.sort();
        assert_eq!(sorted, EndpointKey::ALL);
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for key in EndpointKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }
}
