//! Data models for db-prune.
//!
//! This module re-exports all model types used throughout the application.

pub mod descriptor;
pub mod report;
pub mod statements;

// Re-export commonly used types
pub use descriptor::{BatchConfig, DatabaseDescriptor, Environment, Vendor, mask_uri};
pub use report::{
    DatabaseReport, DatabaseStatus, RunReport, StatementOutcome, StatementReport,
};
pub use statements::StatementSet;
