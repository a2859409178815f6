//! Run report models.
//!
//! A [`RunReport`] records what happened to every descriptor and statement of a
//! batch, including the recoverable failures that did not stop it.

use crate::models::{Environment, Vendor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatementOutcome {
    /// Empty statement, nothing was sent.
    Skipped,
    Executed { rows_affected: u64 },
    /// Recoverable failure (document store only).
    Failed { error: String },
}

/// How a descriptor was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseStatus {
    Completed,
    /// The statement file had no entry for this database.
    NoStatements,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementReport {
    pub statement: String,
    #[serde(flatten)]
    pub outcome: StatementOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseReport {
    pub name: String,
    pub vendor: Vendor,
    pub status: DatabaseStatus,
    pub statements: Vec<StatementReport>,
}

impl DatabaseReport {
    pub fn new(name: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            name: name.into(),
            vendor,
            status: DatabaseStatus::Completed,
            statements: Vec::new(),
        }
    }

    pub fn record(&mut self, statement: impl Into<String>, outcome: StatementOutcome) {
        self.statements.push(StatementReport {
            statement: statement.into(),
            outcome,
        });
    }

    fn count(&self, pred: impl Fn(&StatementOutcome) -> bool) -> usize {
        self.statements.iter().filter(|s| pred(&s.outcome)).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub databases: Vec<DatabaseReport>,
}

impl RunReport {
    pub fn start(environment: Option<Environment>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            environment,
            started_at: Utc::now(),
            finished_at: None,
            databases: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn executed_count(&self) -> usize {
        self.databases
            .iter()
            .map(|d| d.count(|o| matches!(o, StatementOutcome::Executed { .. })))
            .sum()
    }

    pub fn failed_count(&self) -> usize {
        self.databases
            .iter()
            .map(|d| d.count(|o| matches!(o, StatementOutcome::Failed { .. })))
            .sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.databases
            .iter()
            .map(|d| d.count(|o| matches!(o, StatementOutcome::Skipped)))
            .sum()
    }
}
