//! Turns connection settings into live database handles.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::{ConnectionDescriptor, ConnectionForm, HandleCache, SharedClient};
use crate::error::Result;

/// Opens database handles for validated descriptors.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<SharedClient>;
}

/// Connector backed by sqlx (SQLite for embedded, MySQL for remote).
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlxConnector;

#[async_trait]
impl Connector for SqlxConnector {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<SharedClient> {
        let client = crate::db::connect(descriptor).await?;
        Ok(Arc::from(client))
    }
}

/// Resolves descriptors to handles, reusing cached ones while they are fresh.
#[derive(Clone)]
pub struct ConnectionConfigurator {
    cache: Arc<HandleCache>,
    connector: Arc<dyn Connector>,
    embedded_path: PathBuf,
}

impl ConnectionConfigurator {
    pub fn new(
        cache: Arc<HandleCache>,
        connector: Arc<dyn Connector>,
        embedded_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cache,
            connector,
            embedded_path: embedded_path.into(),
        }
    }

    /// Configurator using sqlx and a fresh cache with the given TTL.
    pub fn with_sqlx(ttl: std::time::Duration, embedded_path: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(HandleCache::new(ttl)),
            Arc::new(SqlxConnector),
            embedded_path,
        )
    }

    /// Location of the embedded SQLite file.
    pub fn embedded_path(&self) -> &std::path::Path {
        &self.embedded_path
    }

    /// The shared handle cache.
    pub fn cache(&self) -> &Arc<HandleCache> {
        &self.cache
    }

    /// Validates a form and configures a handle for it.
    ///
    /// An incomplete remote form fails with `MissingInput` before the
    /// connector is consulted.
    pub async fn configure_form(&self, form: &ConnectionForm) -> Result<SharedClient> {
        let descriptor = form.to_descriptor(&self.embedded_path)?;
        self.configure(&descriptor).await
    }

    /// Returns the cached handle for the descriptor or opens a new one.
    pub async fn configure(&self, descriptor: &ConnectionDescriptor) -> Result<SharedClient> {
        if let Some(handle) = self.cache.get(descriptor) {
            tracing::debug!(db = %descriptor.display_string(), "Reusing cached database handle");
            return Ok(handle);
        }

        let start = Instant::now();
        let handle = self.connector.open(descriptor).await?;
        tracing::info!(
            db = %descriptor.display_string(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Opened database handle"
        );

        self.cache.insert(descriptor.clone(), handle.clone());
        Ok(handle)
    }
}
