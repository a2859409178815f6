//! Execution dispatcher.
//!
//! Walks the configured databases in order and applies each database's
//! statements through the [`ConnectionRegistry`].
//!
//! | Situation                          | Severity    |
//! |------------------------------------|-------------|
//! | No statements for a database       | recoverable |
//! | Document store deletion fails      | recoverable |
//! | Connection cannot be established   | fatal       |
//! | Relational statement fails         | fatal       |
//!
//! Fatal errors end the run immediately; nothing after the failing statement
//! is executed and there is no rollback of what already ran.

use crate::db::{ConnectionHandle, ConnectionRegistry};
use crate::error::DbResult;
use crate::models::{
    BatchConfig, DatabaseDescriptor, DatabaseReport, DatabaseStatus, Environment, RunReport,
    StatementOutcome, StatementSet,
};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

/// Document field the deletion patterns are matched against.
pub const PATTERN_FIELD: &str = "email";

pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Run a whole configuration file.
    pub async fn run_batch(
        &self,
        config: &BatchConfig,
        statements: &StatementSet,
    ) -> DbResult<RunReport> {
        info!(environment = %config.environment, "Environment: {}", config.environment);
        self.run_in(Some(config.environment), &config.databases, statements)
            .await
    }

    /// Run `statements` against `descriptors`, in descriptor order.
    pub async fn run(
        &self,
        descriptors: &[DatabaseDescriptor],
        statements: &StatementSet,
    ) -> DbResult<RunReport> {
        self.run_in(None, descriptors, statements).await
    }

    async fn run_in(
        &self,
        environment: Option<Environment>,
        descriptors: &[DatabaseDescriptor],
        statements: &StatementSet,
    ) -> DbResult<RunReport> {
        let mut report = RunReport::start(environment);
        let span = info_span!("run", run_id = %report.run_id);

        async {
            for descriptor in descriptors {
                let mut db_report = DatabaseReport::new(&descriptor.name, descriptor.vendor);
                info!(
                    database = %descriptor.name,
                    vendor = %descriptor.vendor,
                    "Executing statements on {}",
                    descriptor.name
                );

                match statements.get(&descriptor.name) {
                    None => {
                        warn!(database = %descriptor.name, "No statements found for {}", descriptor.name);
                        db_report.status = DatabaseStatus::NoStatements;
                    }
                    Some(list) => {
                        if let Err(e) = self.run_database(descriptor, list, &mut db_report).await {
                            error!(
                                database = %descriptor.name,
                                error = %e,
                                executed = report.executed_count() + count_executed(&db_report),
                                "Aborting run"
                            );
                            return Err(e);
                        }
                    }
                }

                report.databases.push(db_report);
            }
            Ok(())
        }
        .instrument(span)
        .await?;

        report.finish();
        info!(
            run_id = %report.run_id,
            executed = report.executed_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "Run complete"
        );
        Ok(report)
    }

    async fn run_database(
        &self,
        descriptor: &DatabaseDescriptor,
        statements: &[String],
        report: &mut DatabaseReport,
    ) -> DbResult<()> {
        for statement in statements {
            info!(database = %descriptor.name, "{}", statement);
            if statement.is_empty() {
                report.record(statement.as_str(), StatementOutcome::Skipped);
                continue;
            }

            let handle = self
                .registry
                .acquire(descriptor.vendor, &descriptor.uri)
                .await?;
            let outcome = self.apply(&handle, descriptor, statement).await?;
            report.record(statement.as_str(), outcome);
        }
        Ok(())
    }

    /// Apply one non-empty statement. Only relational failures are returned
    /// as errors; document store failures become [`StatementOutcome::Failed`].
    async fn apply(
        &self,
        handle: &ConnectionHandle,
        descriptor: &DatabaseDescriptor,
        statement: &str,
    ) -> DbResult<StatementOutcome> {
        match handle {
            ConnectionHandle::Document(client) => {
                match client
                    .delete_matching(
                        &descriptor.database,
                        &descriptor.collection,
                        PATTERN_FIELD,
                        statement,
                    )
                    .await
                {
                    Ok(deleted) => {
                        info!(
                            database = %descriptor.name,
                            collection = %descriptor.collection,
                            deleted,
                            "Deleted matching documents"
                        );
                        Ok(StatementOutcome::Executed {
                            rows_affected: deleted,
                        })
                    }
                    Err(e) => {
                        warn!(database = %descriptor.name, error = %e, "Document deletion failed");
                        Ok(StatementOutcome::Failed {
                            error: e.to_string(),
                        })
                    }
                }
            }
            ConnectionHandle::Relational(conn) => {
                let rows_affected = conn.execute(statement).await?;
                info!(database = %descriptor.name, rows_affected, "Statement executed");
                Ok(StatementOutcome::Executed { rows_affected })
            }
        }
    }
}

fn count_executed(report: &DatabaseReport) -> usize {
    report
        .statements
        .iter()
        .filter(|s| matches!(s.outcome, StatementOutcome::Executed { .. }))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Connector, DocumentConnection};
    use crate::error::DbError;
    use crate::models::Vendor;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingStore {
        calls: Mutex<Vec<(String, String, String, String)>>,
    }

    #[async_trait]
    impl DocumentConnection for RecordingStore {
        async fn delete_matching(
            &self,
            database: &str,
            collection: &str,
            field: &str,
            pattern: &str,
        ) -> DbResult<u64> {
            self.calls.lock().unwrap().push((
                database.to_string(),
                collection.to_string(),
                field.to_string(),
                pattern.to_string(),
            ));
            if pattern == "(" {
                return Err(DbError::document("invalid regular expression"));
            }
            Ok(1)
        }

        async fn close(&self) {}
    }

    struct StoreConnector(Arc<RecordingStore>);

    #[async_trait]
    impl Connector for StoreConnector {
        async fn open(&self, _vendor: Vendor, _uri: &str) -> DbResult<ConnectionHandle> {
            Ok(ConnectionHandle::Document(self.0.clone()))
        }
    }

    fn mongo(name: &str) -> DatabaseDescriptor {
        DatabaseDescriptor::new(name, Vendor::MongoDB, "mongodb://h").with_collection("crm", "users")
    }

    #[tokio::test]
    async fn test_document_statements_use_email_field() {
        let store = Arc::new(RecordingStore::default());
        let registry = Arc::new(ConnectionRegistry::new(StoreConnector(store.clone())));
        let dispatcher = Dispatcher::new(registry);

        let statements: StatementSet = [("B", "^alice@")].into_iter().collect();
        let report = dispatcher.run(&[mongo("B")], &statements).await.unwrap();

        let calls = store.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            [(
                "crm".to_string(),
                "users".to_string(),
                "email".to_string(),
                "^alice@".to_string()
            )]
        );
        assert_eq!(report.executed_count(), 1);
    }

    #[tokio::test]
    async fn test_document_failure_is_recorded_and_run_continues() {
        let store = Arc::new(RecordingStore::default());
        let registry = Arc::new(ConnectionRegistry::new(StoreConnector(store.clone())));
        let dispatcher = Dispatcher::new(registry);

        let statements: StatementSet = [("B", "("), ("B", "^spam@"), ("C", "^x")]
            .into_iter()
            .collect();
        let report = dispatcher
            .run(&[mongo("B"), mongo("C")], &statements)
            .await
            .unwrap();

        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.executed_count(), 2);
        assert_eq!(store.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_statements_never_connect() {
        let store = Arc::new(RecordingStore::default());
        let registry = Arc::new(ConnectionRegistry::new(StoreConnector(store.clone())));
        let dispatcher = Dispatcher::new(registry.clone());

        let statements: StatementSet = [("B", ""), ("B", "")].into_iter().collect();
        let report = dispatcher.run(&[mongo("B")], &statements).await.unwrap();

        assert_eq!(report.skipped_count(), 2);
        assert!(registry.is_empty().await);
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_count_executed() {
        let mut db = DatabaseReport::new("A", Vendor::SQLite);
        db.record("", StatementOutcome::Skipped);
        db.record("x", StatementOutcome::Executed { rows_affected: 0 });
        assert_eq!(count_executed(&db), 1);
    }
}
