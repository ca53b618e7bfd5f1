//! Credential Pools
//!
//! Parses raw credential input (one secret, or a batch of secrets) and merges
//! it into a channel's stored pool.

use crate::error::ResolverError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

/// A single opaque secret. Its content is never interpreted or altered.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialEntry(String);

impl CredentialEntry {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the secret value
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Shortened form that is safe to log
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 12 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CredentialEntry").field(&self.masked()).finish()
    }
}

/// Shape of raw credential input
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyInputMode {
    /// The whole input is one secret
    #[default]
    Single,

    /// A JSON array of credential documents, or one secret per line
    Batch,
}

/// How incoming credentials combine with the stored pool
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Add after the existing entries
    #[default]
    Append,

    /// Discard the existing entries
    Replace,
}

/// A batch entry that could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Document identity (`client_email`, `project_id`, `id`) or `#<position>`
    pub identifier: String,

    /// Why it was rejected
    pub reason: String,
}

/// Result of parsing raw credential input: the usable entries plus rejections
#[derive(Debug, Clone, Default)]
pub struct ParsedCredentials {
    pub pool: CredentialPool,
    pub rejected: Vec<RejectedEntry>,
}

impl ParsedCredentials {
    /// Partial-parse error listing rejected identifiers, if any entry was rejected
    pub fn error(&self) -> Option<ResolverError> {
        if self.rejected.is_empty() {
            None
        } else {
            Some(ResolverError::PartialParse {
                rejected: self.rejected.iter().map(|r| r.identifier.clone()).collect(),
            })
        }
    }

    fn reject(&mut self, identifier: String, reason: String) {
        warn!(entry = %identifier, reason = %reason, "rejecting credential entry");
        self.rejected.push(RejectedEntry { identifier, reason });
    }
}

/// Ordered pool of credentials for one channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPool {
    entries: Vec<CredentialEntry>,
}

impl CredentialPool {
    pub fn new(entries: Vec<CredentialEntry>) -> Self {
        Self { entries }
    }

    /// Parse raw credential input
    pub fn parse_raw(raw: &str, mode: KeyInputMode) -> ParsedCredentials {
        match mode {
            KeyInputMode::Single => {
                let trimmed = raw.trim();
                let mut parsed = ParsedCredentials::default();
                if !trimmed.is_empty() {
                    parsed.pool.push(CredentialEntry::new(trimmed));
                }
                parsed
            }
            KeyInputMode::Batch => {
                let trimmed = raw.trim();
                if trimmed.starts_with('[') {
                    Self::parse_documents(trimmed)
                } else if trimmed.starts_with('{') {
                    Self::parse_document_stream(trimmed)
                } else {
                    Self::parse_lines(raw)
                }
            }
        }
    }

    /// JSON array: strings are secrets, objects are credential documents
    fn parse_documents(raw: &str) -> ParsedCredentials {
        let mut parsed = ParsedCredentials::default();

        let items: Vec<Value> = match serde_json::from_str(raw) {
            Ok(items) => items,
            Err(e) => {
                parsed.reject("batch".to_string(), format!("invalid JSON array: {}", e));
                return parsed;
            }
        };

        for (idx, item) in items.into_iter().enumerate() {
            let position = format!("#{}", idx + 1);

            match item {
                Value::String(s) => {
                    let s = s.trim();
                    if s.is_empty() {
                        parsed.reject(position, "empty entry".to_string());
                    } else if s.contains('\n') {
                        parsed.reject(position, "entry spans multiple lines".to_string());
                    } else {
                        parsed.pool.push(CredentialEntry::new(s));
                    }
                }
                Value::Object(doc) => {
                    let identifier = document_identifier(&doc).unwrap_or(position);
                    if doc.is_empty() {
                        parsed.reject(identifier, "empty document".to_string());
                    } else {
                        parsed.pool.push(CredentialEntry::new(Value::Object(doc).to_string()));
                    }
                }
                other => {
                    parsed.reject(position, format!("unsupported entry type: {}", json_kind(&other)));
                }
            }
        }

        parsed
    }

    /// Whitespace-separated JSON objects, pretty-printed or one per line.
    ///
    /// Documents before the first malformed one are kept; the rest of the
    /// input is rejected as a whole.
    fn parse_document_stream(raw: &str) -> ParsedCredentials {
        let mut parsed = ParsedCredentials::default();
        let stream = serde_json::Deserializer::from_str(raw).into_iter::<Map<String, Value>>();

        for (idx, doc) in stream.enumerate() {
            let position = format!("#{}", idx + 1);

            match doc {
                Ok(doc) if doc.is_empty() => {
                    parsed.reject(position, "empty document".to_string());
                }
                Ok(doc) => {
                    parsed.pool.push(CredentialEntry::new(Value::Object(doc).to_string()));
                }
                Err(e) => {
                    parsed.reject(position, format!("invalid JSON document: {}", e));
                    break;
                }
            }
        }

        parsed
    }

    /// One secret per line; lines starting with `{` must be JSON documents
    fn parse_lines(raw: &str) -> ParsedCredentials {
        let mut parsed = ParsedCredentials::default();

        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('{') {
                match serde_json::from_str::<Map<String, Value>>(line) {
                    Ok(doc) if doc.is_empty() => {
                        parsed.reject(format!("#{}", idx + 1), "empty document".to_string());
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        parsed.reject(format!("#{}", idx + 1), format!("invalid JSON document: {}", e));
                        continue;
                    }
                }
            }

            parsed.pool.push(CredentialEntry::new(line));
        }

        debug!(
            accepted = parsed.pool.len(),
            rejected = parsed.rejected.len(),
            "parsed credential batch"
        );
        parsed
    }

    /// Combine a stored pool with newly entered credentials.
    ///
    /// Appending nothing leaves the stored pool untouched. Duplicates are kept.
    pub fn merge(existing: CredentialPool, incoming: CredentialPool, mode: UpdateMode) -> CredentialPool {
        match mode {
            UpdateMode::Replace => incoming,
            UpdateMode::Append => {
                let mut merged = existing;
                merged.entries.extend(incoming.entries);
                merged
            }
        }
    }

    /// Read the persisted form: one entry per line, blank lines ignored
    pub fn from_serialized(stored: &str) -> Self {
        Self {
            entries: stored
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(CredentialEntry::new)
                .collect(),
        }
    }

    /// Persisted form: entries joined by newlines
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(CredentialEntry::value)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn push(&mut self, entry: CredentialEntry) {
        self.entries.push(entry);
    }

    pub fn get(&self, idx: usize) -> Option<&CredentialEntry> {
        self.entries.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CredentialEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CredentialEntry> for CredentialPool {
    fn from_iter<I: IntoIterator<Item = CredentialEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn document_identifier(doc: &Map<String, Value>) -> Option<String> {
    ["client_email", "project_id", "id"]
        .iter()
        .find_map(|field| {
            doc.get(*field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
