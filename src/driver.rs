//! The underlying database driver contract.
//!
//! This crate does not talk to a database itself; it wraps something that
//! does. [`Driver`] is that seam: the statement-execution and schema-DDL
//! primitives of a concrete client, plus the connection-level probes the
//! interceptor needs (`reconnect`, `is_replica`).
//!
//! [`MemoryDriver`] is an in-memory implementation that records every
//! statement, for tests, doctests, and demonstration.

use std::collections::BTreeSet;
use std::fmt;

/// A result row, as the seam models it: one cell per column, rendered to
/// text. Typed decoding belongs to the concrete driver.
pub type Row = Vec<String>;

/// Error returned by a [`Driver`] operation.
///
/// Carries a coarse kind plus an optional driver-specific message.
///
/// # Examples
///
/// ```
/// use audit_core::{DriverError, DriverErrorKind};
///
/// let error = DriverError::new(DriverErrorKind::Statement);
/// assert_eq!(error.kind(), DriverErrorKind::Statement);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    kind: DriverErrorKind,
    message: Option<String>,
}

impl DriverError {
    /// Creates a new driver error with the specified kind.
    pub fn new(kind: DriverErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a new driver error with a driver-specific message.
    pub fn with_message(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> DriverErrorKind {
        self.kind
    }

    /// Returns the driver-specific message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            write!(f, "driver error ({}): {}", self.kind, msg)
        } else {
            write!(f, "driver error ({})", self.kind)
        }
    }
}

impl std::error::Error for DriverError {}

/// Kind of driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// A statement was rejected or failed during execution.
    Statement,
    /// The connection itself failed (lost, refused, reconnect failure).
    Connection,
    /// A DDL operation referenced a table that does not exist.
    UnknownTable,
    /// A DDL operation would create a table name that already exists.
    DuplicateTable,
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statement => write!(f, "statement failed"),
            Self::Connection => write!(f, "connection failure"),
            Self::UnknownTable => write!(f, "unknown table"),
            Self::DuplicateTable => write!(f, "duplicate table"),
        }
    }
}

/// Options accepted by table creation.
///
/// A temporary table is always exempt from audit-trigger management,
/// regardless of ignore rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOptions {
    /// Create the table as session-temporary.
    pub temporary: bool,
}

impl TableOptions {
    /// Options for a session-temporary table.
    pub fn temporary() -> Self {
        Self { temporary: true }
    }
}

/// Contract of the underlying database client.
///
/// The audited connection wraps an implementation of this trait and
/// delegates to it after running its hooks. Two execution paths matter:
///
/// - [`execute_raw`] is the unintercepted primitive. The session-sync
///   interceptor issues its own session-set statements through it, which
///   is what makes the interception non-recursive: the wrapper never
///   re-enters its own entry points.
/// - [`execute`], [`exec_query`], [`exec_update`], [`exec_delete`] are the
///   four entry points capable of reading or writing table data. The
///   wrapper syncs the session before each of them.
///
/// Implementations are used by one unit of work at a time; sequential
/// statement ordering within a connection is the pool's concern, not this
/// trait's.
///
/// [`execute_raw`]: Driver::execute_raw
/// [`execute`]: Driver::execute
/// [`exec_query`]: Driver::exec_query
/// [`exec_update`]: Driver::exec_update
/// [`exec_delete`]: Driver::exec_delete
pub trait Driver {
    /// Executes a statement with no interception semantics attached.
    ///
    /// Returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the statement is rejected or fails.
    fn execute_raw(&mut self, sql: &str) -> Result<u64, DriverError>;

    /// Executes a plain statement.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the statement is rejected or fails.
    fn execute(&mut self, sql: &str) -> Result<u64, DriverError>;

    /// Executes a parameterized query, returning its rows.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the statement is rejected or fails.
    fn exec_query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>, DriverError>;

    /// Executes a parameterized update, returning the affected row count.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the statement is rejected or fails.
    fn exec_update(&mut self, sql: &str, params: &[&str]) -> Result<u64, DriverError>;

    /// Executes a parameterized delete, returning the affected row count.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the statement is rejected or fails.
    fn exec_delete(&mut self, sql: &str, params: &[&str]) -> Result<u64, DriverError>;

    /// Creates a table.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the table cannot be created.
    fn create_table(&mut self, name: &str, options: &TableOptions) -> Result<(), DriverError>;

    /// Drops a table.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the table cannot be dropped.
    fn drop_table(&mut self, name: &str) -> Result<(), DriverError>;

    /// Renames a table.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the table cannot be renamed.
    fn rename_table(&mut self, old: &str, new: &str) -> Result<(), DriverError>;

    /// Re-establishes the connection. The new session holds no prior
    /// session state.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the connection cannot be re-established.
    fn reconnect(&mut self) -> Result<(), DriverError>;

    /// Capability probe: true if this connection is a read-only replica.
    ///
    /// May cost a round-trip in a real driver; the wrapper caches the
    /// answer per connection.
    fn is_replica(&self) -> bool;
}

/// An in-memory [`Driver`] that records every statement it executes.
///
/// `MemoryDriver` maintains a table set (duplicate creates and unknown
/// drops/renames are errors, like a real catalog), a replica flag, and a
/// reconnect counter. A substring-keyed failure injection hook lets tests
/// fail specific statements.
///
/// # Examples
///
/// ```
/// use audit_core::{Driver, MemoryDriver, TableOptions};
///
/// let mut driver = MemoryDriver::new();
/// driver.create_table("orders", &TableOptions::default()).unwrap();
/// driver.execute("INSERT INTO orders VALUES (1)").unwrap();
///
/// assert!(driver.has_table("orders"));
/// assert_eq!(driver.statements().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MemoryDriver {
    statements: Vec<String>,
    tables: BTreeSet<String>,
    replica: bool,
    reconnects: usize,
    fail_contains: Option<String>,
}

impl MemoryDriver {
    /// Creates a new primary (writable) in-memory driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a driver that reports itself as a read-only replica.
    pub fn replica() -> Self {
        Self {
            replica: true,
            ..Self::default()
        }
    }

    /// Returns every executed statement, in execution order.
    ///
    /// DDL issued through the table operations is recorded too, so tests
    /// can assert on complete statement sequences.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Counts executed statements containing the given fragment.
    pub fn statements_containing(&self, fragment: &str) -> usize {
        self.statements
            .iter()
            .filter(|sql| sql.contains(fragment))
            .count()
    }

    /// Returns true if the table exists in the in-memory catalog.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains(name)
    }

    /// Returns how many times `reconnect` was called.
    pub fn reconnect_count(&self) -> usize {
        self.reconnects
    }

    /// Fails any subsequent statement whose SQL contains the fragment.
    ///
    /// The failing statement is not recorded, matching a server that
    /// rejects it before execution.
    pub fn fail_when(&mut self, fragment: impl Into<String>) {
        self.fail_contains = Some(fragment.into());
    }

    /// Clears the failure injection hook.
    pub fn clear_failure(&mut self) {
        self.fail_contains = None;
    }

    fn run(&mut self, sql: &str) -> Result<u64, DriverError> {
        if let Some(fragment) = &self.fail_contains {
            if sql.contains(fragment.as_str()) {
                return Err(DriverError::with_message(
                    DriverErrorKind::Statement,
                    format!("injected failure: {sql}"),
                ));
            }
        }
        self.statements.push(sql.to_string());
        Ok(0)
    }
}

impl Driver for MemoryDriver {
    fn execute_raw(&mut self, sql: &str) -> Result<u64, DriverError> {
        self.run(sql)
    }

    fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        self.run(sql)
    }

    fn exec_query(&mut self, sql: &str, _params: &[&str]) -> Result<Vec<Row>, DriverError> {
        self.run(sql)?;
        Ok(Vec::new())
    }

    fn exec_update(&mut self, sql: &str, _params: &[&str]) -> Result<u64, DriverError> {
        self.run(sql)
    }

    fn exec_delete(&mut self, sql: &str, _params: &[&str]) -> Result<u64, DriverError> {
        self.run(sql)
    }

    fn create_table(&mut self, name: &str, options: &TableOptions) -> Result<(), DriverError> {
        if self.tables.contains(name) {
            return Err(DriverError::with_message(
                DriverErrorKind::DuplicateTable,
                name,
            ));
        }
        let sql = if options.temporary {
            format!("CREATE TEMPORARY TABLE {name}")
        } else {
            format!("CREATE TABLE {name}")
        };
        self.run(&sql)?;
        self.tables.insert(name.to_string());
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<(), DriverError> {
        if !self.tables.contains(name) {
            return Err(DriverError::with_message(
                DriverErrorKind::UnknownTable,
                name,
            ));
        }
        self.run(&format!("DROP TABLE {name}"))?;
        self.tables.remove(name);
        Ok(())
    }

    fn rename_table(&mut self, old: &str, new: &str) -> Result<(), DriverError> {
        if !self.tables.contains(old) {
            return Err(DriverError::with_message(DriverErrorKind::UnknownTable, old));
        }
        if self.tables.contains(new) {
            return Err(DriverError::with_message(
                DriverErrorKind::DuplicateTable,
                new,
            ));
        }
        self.run(&format!("ALTER TABLE {old} RENAME TO {new}"))?;
        self.tables.remove(old);
        self.tables.insert(new.to_string());
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), DriverError> {
        self.reconnects += 1;
        Ok(())
    }

    fn is_replica(&self) -> bool {
        self.replica
    }
}
