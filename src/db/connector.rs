//! Vendor-polymorphic connection handles.
//!
//! A [`ConnectionHandle`] is either relational or a document store client.
//! The dispatcher branches on that tag only; which SQL dialect or driver sits
//! behind a relational handle is invisible to it.

use crate::db::mongo::MongoConnection;
use crate::db::mssql::MsSqlConnection;
use crate::db::sql::SqlPool;
use crate::error::DbResult;
use crate::models::Vendor;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_DOCUMENT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// A live relational connection or pool.
#[async_trait]
pub trait RelationalConnection: Send + Sync + std::fmt::Debug {
    fn vendor(&self) -> Vendor;

    /// Execute one statement as a direct command. Returns rows affected.
    async fn execute(&self, sql: &str) -> DbResult<u64>;

    /// Round-trip to the server. Called right after opening for vendors
    /// that are checked eagerly.
    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }

    async fn close(&self);
}

/// A live document store client.
#[async_trait]
pub trait DocumentConnection: Send + Sync + std::fmt::Debug {
    /// Delete every document in `database.collection` whose `field` matches
    /// the regular expression `pattern`. Returns the number deleted.
    async fn delete_matching(
        &self,
        database: &str,
        collection: &str,
        field: &str,
        pattern: &str,
    ) -> DbResult<u64>;

    async fn close(&self);
}

/// A cached connection, tagged by execution semantics.
#[derive(Debug, Clone)]
pub enum ConnectionHandle {
    Relational(Arc<dyn RelationalConnection>),
    Document(Arc<dyn DocumentConnection>),
}

impl ConnectionHandle {
    pub fn relational(conn: impl RelationalConnection + 'static) -> Self {
        Self::Relational(Arc::new(conn))
    }

    pub fn document(conn: impl DocumentConnection + 'static) -> Self {
        Self::Document(Arc::new(conn))
    }

    /// True if both handles point at the same live connection.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Relational(a), Self::Relational(b)) => Arc::ptr_eq(a, b),
            (Self::Document(a), Self::Document(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub async fn close(&self) {
        match self {
            Self::Relational(conn) => conn.close().await,
            Self::Document(conn) => conn.close().await,
        }
    }
}

/// Establishes new connections for the registry.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, vendor: Vendor, uri: &str) -> DbResult<ConnectionHandle>;
}

/// Connection options shared by all vendors.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Applied to the document store client only.
    pub document_connect_timeout: Duration,
    /// How long a sqlx pool waits for a connection.
    pub acquire_timeout: Duration,
    /// Accept any SQL Server certificate.
    pub mssql_trust_cert: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            document_connect_timeout: Duration::from_secs(DEFAULT_DOCUMENT_CONNECT_TIMEOUT_SECS),
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            mssql_trust_cert: false,
        }
    }
}

/// Production connector backed by the real drivers.
#[derive(Debug, Clone, Default)]
pub struct VendorConnector {
    options: ConnectOptions,
}

impl VendorConnector {
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Connector for VendorConnector {
    async fn open(&self, vendor: Vendor, uri: &str) -> DbResult<ConnectionHandle> {
        debug!(vendor = %vendor, "Opening connection");
        let handle = match vendor {
            Vendor::PostgreSQL | Vendor::MySQL | Vendor::SQLite => ConnectionHandle::relational(
                SqlPool::open(vendor, uri, self.options.acquire_timeout)?,
            ),
            Vendor::MsSql => ConnectionHandle::relational(
                MsSqlConnection::connect(uri, self.options.mssql_trust_cert).await?,
            ),
            Vendor::MongoDB => ConnectionHandle::document(
                MongoConnection::connect(uri, self.options.document_connect_timeout).await?,
            ),
        };

        if vendor.pings_on_connect() {
            if let ConnectionHandle::Relational(conn) = &handle {
                if let Err(e) = conn.ping().await {
                    handle.close().await;
                    return Err(e);
                }
                debug!(vendor = %vendor, "Ping succeeded");
            }
        }
        Ok(handle)
    }
}
