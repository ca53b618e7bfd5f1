//! Channel Resolver
//!
//! Endpoint and credential resolution for AI-API gateway channels: canonical
//! endpoint configuration, multi-key credential pools, and per-call key
//! selection.

use std::collections::HashMap;
use std::sync::Arc;

pub mod config;
pub mod credential;
pub mod endpoint;
pub mod error;
pub mod router;

use config::{Channel, ChannelLoader, ChannelRecord};
use credential::CredentialEntry;
use endpoint::EndpointKey;
use error::{ResolverError, Result};
use router::{CursorStore, EndpointRoute, KeySelector};

/// Install a `tracing` subscriber honouring `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Resolves concrete URLs and credentials for outbound calls
pub struct ChannelResolver {
    /// Compiled channels keyed by id
    channels: HashMap<String, Channel>,

    /// Key selector with per-channel round-robin cursors
    selector: KeySelector,
}

/// Everything the router needs for one outbound call
#[derive(Debug, Clone)]
pub struct ResolvedCall {
    pub channel: String,
    pub route: EndpointRoute,
    pub credential: CredentialEntry,
}

impl ResolvedCall {
    pub fn url(&self) -> &str {
        &self.route.url
    }
}

impl ChannelResolver {
    /// Create a resolver from the default channel file locations
    pub fn new() -> Result<Self> {
        let loader = ChannelLoader::new()?;
        Self::from_records(loader.into_channels())
    }

    /// Create a resolver from a specific channels file
    pub fn with_config_path(path: &str) -> Result<Self> {
        let loader = ChannelLoader::from_path(path)?;
        Self::from_records(loader.into_channels())
    }

    /// Create a resolver from persisted records
    pub fn from_records(records: impl IntoIterator<Item = ChannelRecord>) -> Result<Self> {
        let mut resolver = Self {
            channels: HashMap::new(),
            selector: KeySelector::default(),
        };

        for record in records {
            resolver.upsert(&record)?;
        }

        Ok(resolver)
    }

    /// Share round-robin cursors with other resolvers
    pub fn with_cursor_store(mut self, cursors: Arc<CursorStore>) -> Self {
        self.selector = KeySelector::new(cursors);
        self
    }

    /// Add or refresh a channel after an edit; its round-robin cursor is kept
    pub fn upsert(&mut self, record: &ChannelRecord) -> Result<()> {
        let channel = record.compile()?;
        self.channels.insert(channel.id.clone(), channel);
        Ok(())
    }

    /// Remove a channel and its cursor
    pub fn remove(&mut self, id: &str) -> Option<Channel> {
        self.selector.cursors().forget(id);
        self.channels.remove(id)
    }

    /// Get a compiled channel
    pub fn channel(&self, id: &str) -> Result<&Channel> {
        self.channels
            .get(id)
            .ok_or_else(|| ResolverError::ChannelNotFound(id.to_string()))
    }

    /// Resolve the URL and credential for one call on `channel_id`
    pub fn resolve(
        &self,
        channel_id: &str,
        endpoint: EndpointKey,
        model: Option<&str>,
    ) -> Result<ResolvedCall> {
        let channel = self.channel(channel_id)?;
        let route = EndpointRoute::resolve(&channel.endpoints, endpoint, model)?;
        let credential =
            self.selector
                .select_for(&channel.id, &channel.keys, channel.selection_policy)?;

        Ok(ResolvedCall {
            channel: channel.id.clone(),
            route,
            credential,
        })
    }

    /// List loaded channel ids
    pub fn channels(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.channels.keys().cloned().collect();
        ids.sort();
        ids
    }
}

// =============================================================================
// Python Bindings
// =============================================================================

#[cfg(feature = "python")]
mod python {
    use super::*;
    use crate::endpoint::EndpointConfig;
    use pyo3::prelude::*;
    use pyo3::types::PyDict;

    /// Python wrapper for the channel resolver
    #[pyclass(name = "ChannelResolver")]
    struct PyChannelResolver {
        inner: ChannelResolver,
    }

    fn endpoint_key(raw: &str) -> Result<EndpointKey> {
        EndpointKey::canonicalize(raw).ok_or_else(|| {
            ResolverError::Validation(format!("unknown endpoint category '{}'", raw))
        })
    }

    #[pymethods]
    impl PyChannelResolver {
        #[new]
        #[pyo3(signature = (config_path=None))]
        fn new(config_path: Option<&str>) -> PyResult<Self> {
            let _ = dotenvy::dotenv();
            init_logging();

            let inner = if let Some(path) = config_path {
                ChannelResolver::with_config_path(path)?
            } else {
                ChannelResolver::new()?
            };

            Ok(Self { inner })
        }

        /// Resolve URL and key for one call
        #[pyo3(signature = (channel_id, endpoint="openai", model=None))]
        fn resolve(
            &self,
            py: Python<'_>,
            channel_id: &str,
            endpoint: &str,
            model: Option<&str>,
        ) -> PyResult<Py<PyAny>> {
            let call = self.inner.resolve(channel_id, endpoint_key(endpoint)?, model)?;

            let dict = PyDict::new(py);
            dict.set_item("channel", &call.channel)?;
            dict.set_item("endpoint", call.route.matched.as_str())?;
            dict.set_item("url", call.url())?;
            dict.set_item("key", call.credential.value())?;
            Ok(dict.into())
        }

        /// List loaded channel ids
        fn channels(&self) -> Vec<String> {
            self.inner.channels()
        }
    }

    /// Canonical persisted form of raw endpoint text
    #[pyfunction]
    fn canonicalize_endpoints(raw: &str) -> PyResult<String> {
        let config: EndpointConfig = raw.parse()?;
        Ok(config.serialize())
    }

    /// Canonical name for a raw endpoint category, if known
    #[pyfunction]
    fn canonical_endpoint_key(raw: &str) -> Option<&'static str> {
        EndpointKey::canonicalize(raw).map(EndpointKey::as_str)
    }

    /// Python module definition
    #[pymodule]
    fn _channel_resolver(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_class::<PyChannelResolver>()?;
        m.add_function(wrap_pyfunction!(canonicalize_endpoints, m)?)?;
        m.add_function(wrap_pyfunction!(canonical_endpoint_key, m)?)?;
        m.add("__version__", env!("CARGO_PKG_VERSION"))?;
        Ok(())
    }
}
