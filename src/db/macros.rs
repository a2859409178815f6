//! Dispatch macro for the sqlx-backed pools.
//!
//! The three sqlx pools share most of their API but not a common type, so
//! every operation is a match over [`SqlPool`](crate::db::sql::SqlPool). The
//! macro keeps those matches to one line per driver.

/// Generate match arms over `SqlPool` variants.
///
/// # Example
///
/// ```ignore
/// impl_sql_dispatch!(pool, {
///     MySql(p) => p.close().await,
///     Postgres(p) => p.close().await,
///     SQLite(p) => p.close().await,
/// });
/// ```
#[macro_export]
macro_rules! impl_sql_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::sql::SqlPool::$variant($p) => $body,
            )+
        }
    };
}

pub use impl_sql_dispatch;
