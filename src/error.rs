use std::fmt;

use crate::driver::DriverError;

/// Errors surfaced by the audited connection.
///
/// Failures carry the originating operation's cause: a statement (or its
/// preceding session sync) failing maps to [`Error::Driver`]; a trigger
/// install/uninstall aborting a schema change maps to [`Error::Trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The underlying driver rejected a statement, DDL operation, or
    /// reconnect. Session-sync failures surface here as the failure of
    /// the statement that triggered the sync.
    Driver(DriverError),
    /// A trigger install/uninstall failed, aborting the enclosing schema
    /// change.
    Trigger(TriggerFailure),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Driver(e) => write!(f, "{}", e),
            Error::Trigger(t) => write!(f, "{}", t),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Driver(e) => Some(e),
            Error::Trigger(t) => Some(t),
        }
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Error::Driver(e)
    }
}

impl From<TriggerFailure> for Error {
    fn from(t: TriggerFailure) -> Self {
        Error::Trigger(t)
    }
}

/// A failed trigger operation, fatal to the schema change that needed it.
///
/// A failed install during table creation aborts the creation as a whole:
/// no non-ignored table is ever left silently unaudited. A failed
/// uninstall during drop/rename likewise aborts rather than proceeding
/// with an orphaned trigger reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerFailure {
    /// Which trigger operation failed
    pub op: TriggerOp,
    /// The table the operation targeted
    pub table: String,
    /// The underlying DDL failure
    pub source: DriverError,
}

impl TriggerFailure {
    /// Creates a new trigger failure.
    pub fn new(op: TriggerOp, table: impl Into<String>, source: DriverError) -> Self {
        Self {
            op,
            table: table.into(),
            source,
        }
    }
}

impl fmt::Display for TriggerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "audit trigger {} failed for table '{}': {}",
            self.op, self.table, self.source
        )
    }
}

impl std::error::Error for TriggerFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// The direction of a trigger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOp {
    /// Trigger and backing function creation
    Install,
    /// Trigger removal
    Uninstall,
}

impl fmt::Display for TriggerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerOp::Install => write!(f, "install"),
            TriggerOp::Uninstall => write!(f, "uninstall"),
        }
    }
}
