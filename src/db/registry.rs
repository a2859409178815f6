//! Connection registry.
//!
//! Holds at most one live [`ConnectionHandle`] per [`Vendor`] for the life of
//! the registry. Handles are created lazily on first acquisition.
//!
//! # Concurrency
//!
//! A single mutex guards the whole map, so only one connection is ever being
//! established at a time across all vendors. The lock is held only while
//! looking up or creating a handle; callers use the returned clone outside it.
//!
//! # One URI per vendor
//!
//! The cache key is the vendor alone. Once a vendor is connected, later
//! acquisitions with a different URI get the existing handle and the new URI
//! is ignored (a warning is logged).

use crate::db::connector::{ConnectionHandle, Connector};
use crate::error::DbResult;
use crate::models::{Vendor, mask_uri};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug)]
struct RegistryEntry {
    handle: ConnectionHandle,
    /// The URI the handle was opened with.
    uri: String,
}

pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    handles: Mutex<HashMap<Vendor, RegistryEntry>>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("handles", &self.handles)
            .finish_non_exhaustive()
    }
}

impl ConnectionRegistry {
    /// Create an empty registry that opens connections with `connector`.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Get the handle for `vendor`, connecting to `uri` if there is none yet.
    ///
    /// Connection failures are returned as-is; they are fatal to a batch.
    pub async fn acquire(&self, vendor: Vendor, uri: &str) -> DbResult<ConnectionHandle> {
        let mut handles = self.handles.lock().await;

        if let Some(entry) = handles.get(&vendor) {
            if entry.uri != uri {
                warn!(
                    vendor = %vendor,
                    connected = %mask_uri(&entry.uri),
                    requested = %mask_uri(uri),
                    "Vendor already connected, ignoring different uri"
                );
            }
            return Ok(entry.handle.clone());
        }

        info!(vendor = %vendor, uri = %mask_uri(uri), "Connecting to database");
        let handle = self.connector.open(vendor, uri).await?;
        handles.insert(
            vendor,
            RegistryEntry {
                handle: handle.clone(),
                uri: uri.to_string(),
            },
        );
        info!(vendor = %vendor, "Connected successfully");

        Ok(handle)
    }

    /// Check if a vendor has a live handle.
    pub async fn is_connected(&self, vendor: Vendor) -> bool {
        self.handles.lock().await.contains_key(&vendor)
    }

    /// Get the number of live handles.
    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Close all connections and clear the registry.
    pub async fn close_all(&self) {
        let entries: Vec<_> = {
            let mut handles = self.handles.lock().await;
            handles.drain().collect()
        }; // Lock released here

        for (vendor, entry) in entries {
            info!(vendor = %vendor, "Closing connection");
            entry.handle.close().await;
        }
        info!("All connections closed");
    }
}
