//! Channel Records
//!
//! The persisted form of a channel and the edit transaction that updates it.

use crate::credential::{CredentialPool, KeyInputMode, RejectedEntry, UpdateMode};
use crate::endpoint::EndpointConfig;
use crate::error::{ResolverError, Result};
use crate::router::SelectionPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A channel as stored by the settings service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelRecord {
    /// Stable channel id
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Canonical endpoint configuration (bare URL or JSON object)
    #[serde(default)]
    pub endpoints: String,

    /// Stored credential(s); one per line in multi-key mode
    #[serde(default)]
    pub key: String,

    /// Whether `key` holds a pool of keys
    #[serde(default)]
    pub multi_key: bool,

    /// Key selection policy for multi-key channels
    #[serde(default)]
    pub selection_policy: SelectionPolicy,

    /// Last successful edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One administrative edit of a channel
#[derive(Debug, Clone, Default)]
pub struct ChannelEdit {
    /// New raw endpoint text; `None` leaves endpoints untouched
    pub endpoints: Option<String>,

    /// Raw credential text; blank leaves the stored credentials untouched
    pub key: String,

    /// Shape of `key`; multi-key channels always read it as a batch
    pub key_input: KeyInputMode,

    /// How `key` combines with the stored credentials
    pub update_mode: UpdateMode,
}

/// Result of a successful edit
#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// Record to persist
    pub record: ChannelRecord,

    /// Batch entries that were skipped
    pub rejected: Vec<RejectedEntry>,
}

/// Runtime form of a channel, ready for routing
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub endpoints: EndpointConfig,
    pub keys: CredentialPool,
    pub selection_policy: SelectionPolicy,
}

impl ChannelRecord {
    /// Create an empty single-key channel
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            endpoints: String::new(),
            key: String::new(),
            multi_key: false,
            selection_policy: SelectionPolicy::default(),
            updated_at: None,
        }
    }

    /// Stored credentials as a pool
    pub fn credential_pool(&self) -> CredentialPool {
        if self.multi_key {
            CredentialPool::from_serialized(&self.key)
        } else {
            CredentialPool::parse_raw(&self.key, KeyInputMode::Single).pool
        }
    }

    /// Apply an edit, producing the record to persist.
    ///
    /// Unparseable or incomplete endpoint configuration blocks the save. Batch
    /// entries that fail to parse are skipped and reported in the outcome. A
    /// single-key channel takes at most one key and never loses its stored key
    /// to an edit that supplies none.
    pub fn apply_edit(&self, edit: &ChannelEdit) -> Result<EditOutcome> {
        let mut record = self.clone();
        let mut rejected = Vec::new();

        if let Some(raw) = &edit.endpoints {
            let config: EndpointConfig = raw.parse()?;
            config.validate()?;
            record.endpoints = config.serialize();
        }

        if !edit.key.trim().is_empty() {
            let input = if self.multi_key {
                KeyInputMode::Batch
            } else {
                edit.key_input
            };

            let parsed = CredentialPool::parse_raw(&edit.key, input);
            if let Some(err) = parsed.error() {
                warn!(channel = %self.id, error = %err, "credential batch partially rejected");
            }
            rejected = parsed.rejected;

            if self.multi_key {
                record.key =
                    CredentialPool::merge(self.credential_pool(), parsed.pool, edit.update_mode)
                        .serialize();
            } else if parsed.pool.len() > 1 {
                return Err(ResolverError::Validation(format!(
                    "single-key channel '{}' accepts one key, got {}",
                    self.id,
                    parsed.pool.len()
                )));
            } else if let Some(entry) = parsed.pool.get(0) {
                record.key = entry.value().to_string();
            } else {
                // Nothing usable came in; the stored key stays
                warn!(channel = %self.id, "no usable key in edit, keeping stored key");
            }
        }

        if record.multi_key && record.credential_pool().is_empty() {
            return Err(ResolverError::Validation(format!(
                "multi-key channel '{}' needs at least one key",
                record.id
            )));
        }

        record.updated_at = Some(Utc::now());
        info!(channel = %record.id, "channel edit applied");

        Ok(EditOutcome { record, rejected })
    }

    /// Parse the stored strings into routing form
    pub fn compile(&self) -> Result<Channel> {
        let endpoints = self.endpoints.parse::<EndpointConfig>().map_err(|e| {
            ResolverError::Config(format!("channel '{}': {}", self.id, e))
        })?;

        Ok(Channel {
            id: self.id.clone(),
            name: self.name.clone(),
            endpoints,
            keys: self.credential_pool(),
            selection_policy: self.selection_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointKey;

    fn multi_key_record(keys: &str) -> ChannelRecord {
        ChannelRecord {
            endpoints: "https://api.example.com/v1/chat/completions".to_string(),
            key: keys.to_string(),
            multi_key: true,
            selection_policy: SelectionPolicy::RoundRobin,
            ..ChannelRecord::new("ch-1", "main")
        }
    }

    #[test]
    fn test_deserialize_record() {
        let json = r#"{
            "id": "openai-main",
            "name": "OpenAI main",
            "endpoints": "https://api.openai.com/v1/chat/completions",
            "key": "sk-1\nsk-2",
            "multi_key": true,
            "selection_policy": "round_robin"
        }"#;

        let record: ChannelRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.selection_policy, SelectionPolicy::RoundRobin);
        assert_eq!(record.credential_pool().len(), 2);
        assert!(record.updated_at.is_none());
    }

    #[test]
    fn test_edit_canonicalizes_endpoints() {
        let record = ChannelRecord::new("ch-1", "main");
        let edit = ChannelEdit {
            endpoints: Some(r#"{"images": "https://i", "default": "https://d"}"#.to_string()),
            key: "sk-1".to_string(),
            ..Default::default()
        };

        let outcome = record.apply_edit(&edit).unwrap();
        assert_eq!(
            outcome.record.endpoints,
            "{\n  \"default\": \"https://d\",\n  \"openai_image\": \"https://i\"\n}"
        );
        assert_eq!(outcome.record.key, "sk-1");
        assert!(outcome.record.updated_at.is_some());
    }

    #[test]
    fn test_edit_blocks_on_invalid_endpoints() {
        let record = ChannelRecord::new("ch-1", "main");

        let bad_json = ChannelEdit {
            endpoints: Some("{\"openai\": ".to_string()),
            ..Default::default()
        };
        assert!(matches!(record.apply_edit(&bad_json), Err(ResolverError::Parse(_))));

        let no_primary = ChannelEdit {
            endpoints: Some(r#"{"claude": "https://c"}"#.to_string()),
            ..Default::default()
        };
        assert!(matches!(
            record.apply_edit(&no_primary),
            Err(ResolverError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_key_keeps_pool() {
        let record = multi_key_record("sk-1\nsk-2");
        for mode in [UpdateMode::Append, UpdateMode::Replace] {
            let edit = ChannelEdit {
                key: "   ".to_string(),
                update_mode: mode,
                ..Default::default()
            };
            let outcome = record.apply_edit(&edit).unwrap();
            assert_eq!(outcome.record.key, "sk-1\nsk-2");
        }
    }

    #[test]
    fn test_multi_key_append_and_replace() {
        let record = multi_key_record("sk-1\nsk-2");

        let append = ChannelEdit {
            key: "sk-3\nsk-1".to_string(),
            update_mode: UpdateMode::Append,
            ..Default::default()
        };
        let outcome = record.apply_edit(&append).unwrap();
        assert_eq!(outcome.record.key, "sk-1\nsk-2\nsk-3\nsk-1");

        let replace = ChannelEdit {
            key: "sk-9".to_string(),
            update_mode: UpdateMode::Replace,
            ..Default::default()
        };
        let outcome = record.apply_edit(&replace).unwrap();
        assert_eq!(outcome.record.key, "sk-9");
    }

    #[test]
    fn test_multi_key_partial_batch() {
        let record = multi_key_record("sk-1");
        let edit = ChannelEdit {
            key: r#"["sk-2", 7, {"project_id": "p"}]"#.to_string(),
            update_mode: UpdateMode::Append,
            ..Default::default()
        };

        let outcome = record.apply_edit(&edit).unwrap();
        assert_eq!(outcome.record.key, "sk-1\nsk-2\n{\"project_id\":\"p\"}");
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].identifier, "#2");
    }

    #[test]
    fn test_multi_key_requires_a_key() {
        let record = multi_key_record("");
        let edit = ChannelEdit {
            key: "[42]".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            record.apply_edit(&edit),
            Err(ResolverError::Validation(_))
        ));
    }

    #[test]
    fn test_single_key_replaced() {
        let mut record = ChannelRecord::new("ch-1", "main");
        record.endpoints = "https://o".to_string();
        record.key = "sk-old".to_string();

        let edit = ChannelEdit {
            key: " sk-new ".to_string(),
            update_mode: UpdateMode::Append,
            ..Default::default()
        };
        let outcome = record.apply_edit(&edit).unwrap();
        assert_eq!(outcome.record.key, "sk-new");
        assert_eq!(outcome.record.endpoints, "https://o");
    }

    #[test]
    fn test_single_key_rejected_batch_keeps_key() {
        let mut record = ChannelRecord::new("ch-1", "main");
        record.endpoints = "https://o".to_string();
        record.key = "sk-old".to_string();

        let edit = ChannelEdit {
            key: "[42]".to_string(),
            key_input: KeyInputMode::Batch,
            update_mode: UpdateMode::Replace,
            ..Default::default()
        };
        let outcome = record.apply_edit(&edit).unwrap();

        assert_eq!(outcome.record.key, "sk-old");
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].identifier, "#1");
    }

    #[test]
    fn test_single_key_batch_entries() {
        let mut record = ChannelRecord::new("ch-1", "main");
        record.key = "sk-old".to_string();

        let one = ChannelEdit {
            key: "\n  sk-new  \n\n".to_string(),
            key_input: KeyInputMode::Batch,
            ..Default::default()
        };
        assert_eq!(record.apply_edit(&one).unwrap().record.key, "sk-new");

        let many = ChannelEdit {
            key: "sk-1\nsk-2".to_string(),
            key_input: KeyInputMode::Batch,
            ..Default::default()
        };
        assert!(matches!(
            record.apply_edit(&many),
            Err(ResolverError::Validation(_))
        ));
    }

    #[test]
    fn test_compile() {
        let record = multi_key_record("sk-1\nsk-2\n");
        let channel = record.compile().unwrap();

        assert_eq!(channel.keys.len(), 2);
        assert_eq!(
            channel.endpoints.get(EndpointKey::OpenAi),
            Some("https://api.example.com/v1/chat/completions")
        );

        let mut broken = record.clone();
        broken.endpoints = "{oops".to_string();
        assert!(matches!(broken.compile(), Err(ResolverError::Config(_))));
    }
}
