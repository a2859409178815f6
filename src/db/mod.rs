//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Vendor-polymorphic connection handles and the connector that opens them
//! - The per-vendor connection registry
//! - Driver-specific connections (sqlx pools, SQL Server, MongoDB)

pub mod connector;
#[macro_use]
pub mod macros;
pub mod mongo;
pub mod mssql;
pub mod registry;
pub mod sql;

pub use connector::{
    ConnectOptions, ConnectionHandle, Connector, DocumentConnection, RelationalConnection,
    VendorConnector,
};
pub use mongo::MongoConnection;
pub use mssql::MsSqlConnection;
pub use registry::ConnectionRegistry;
pub use sql::SqlPool;
