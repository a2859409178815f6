//! db-prune library
//!
//! Runs an ordered batch of cleanup statements against a fleet of databases
//! (PostgreSQL, MySQL, SQL Server, SQLite and MongoDB) through one dispatch path.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod models;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::{DbError, DbResult, Severity};
