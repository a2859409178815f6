//! Statement file model.
//!
//! The statement file is line oriented: every line is `<database-name>=<statement>`.
//! Lines for the same database may be interleaved with other databases; their
//! relative order is the execution order.

use crate::error::{DbError, DbResult};
use std::collections::HashMap;
use std::path::Path;

/// Ordered statements per database name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementSet {
    statements: HashMap<String, Vec<String>>,
}

impl StatementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse statement file contents.
    ///
    /// The line is split on the first `=` only, so statements such as
    /// `DELETE FROM users WHERE id = 1` survive intact. Statements are trimmed;
    /// names are kept exactly as written. `name=` records an empty statement.
    pub fn parse(text: &str) -> DbResult<Self> {
        let mut set = Self::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (name, statement) = line.split_once('=').ok_or_else(|| {
                DbError::invalid_input(format!(
                    "Line {} is not of the form <database>=<statement>",
                    idx + 1
                ))
            })?;
            set.push(name, statement.trim());
        }
        Ok(set)
    }

    /// Read and parse the statement file at `path`.
    pub async fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DbError::config(e.to_string(), path.display().to_string()))?;

        Self::parse(&text).map_err(|e| match e {
            DbError::InvalidInput { message } => {
                DbError::config(message, path.display().to_string())
            }
            other => other,
        })
    }

    /// Append a statement for `name`.
    pub fn push(&mut self, name: impl Into<String>, statement: impl Into<String>) {
        self.statements
            .entry(name.into())
            .or_default()
            .push(statement.into());
    }

    /// Statements for `name`, in execution order. Lookup is exact.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.statements.get(name).map(Vec::as_slice)
    }

    /// Number of databases with at least one line.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl<N, S> FromIterator<(N, S)> for StatementSet
where
    N: Into<String>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, statement) in iter {
            set.push(name, statement);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order_per_database() {
        let set = StatementSet::parse(
            "A=DELETE FROM t\nB=^spam@\nA=DELETE FROM u\n",
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("A").unwrap(), ["DELETE FROM t", "DELETE FROM u"]);
        assert_eq!(set.get("B").unwrap(), ["^spam@"]);
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let set = StatementSet::parse("A=DELETE FROM users WHERE id = 1").unwrap();
        assert_eq!(set.get("A").unwrap(), ["DELETE FROM users WHERE id = 1"]);
    }

    #[test]
    fn test_parse_trims_statement_not_name() {
        let set = StatementSet::parse("A =  DELETE FROM t  ").unwrap();
        assert!(set.get("A").is_none());
        assert_eq!(set.get("A ").unwrap(), ["DELETE FROM t"]);
    }

    #[test]
    fn test_parse_keeps_empty_statements() {
        let set = StatementSet::parse("A=\nA=DELETE FROM t").unwrap();
        assert_eq!(set.get("A").unwrap(), ["", "DELETE FROM t"]);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let set = StatementSet::parse("\nA=x\n   \n").unwrap();
        assert_eq!(set.get("A").unwrap(), ["x"]);
    }

    #[test]
    fn test_parse_rejects_line_without_separator() {
        let err = StatementSet::parse("A=x\nDELETE FROM t").unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let set: StatementSet = [("users", "x")].into_iter().collect();
        assert!(set.get("Users").is_none());
        assert!(set.get("users").is_some());
    }
}
