//! The trigger-manager seam.
//!
//! Installing an audit trigger means issuing the database's trigger and
//! audit-function DDL for a table. That SQL is not owned by this crate;
//! [`TriggerManager`] is the port the schema hooks call through, and
//! [`MemoryTriggerManager`] is an in-memory implementation for tests and
//! demonstration.

use crate::driver::{DriverError, DriverErrorKind};
use crate::error::TriggerOp;
use std::collections::BTreeSet;

/// Issues the install/uninstall DDL for a table's audit trigger.
///
/// Implementations typically hold their own handle to the database (or a
/// DDL queue). Failures propagate as-is; the schema hooks translate them
/// into a failure of the enclosing schema-change operation.
///
/// The hooks guarantee, via the trigger registry, that `install` is never
/// called for a table that already has a trigger and `uninstall` never for
/// one that does not. Implementations may therefore treat both cases as
/// errors rather than silently tolerating them.
pub trait TriggerManager {
    /// Installs the audit trigger (and backing function) for a table.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the trigger DDL fails.
    fn install(&mut self, table: &str) -> Result<(), DriverError>;

    /// Removes the audit trigger for a table.
    ///
    /// # Errors
    ///
    /// Returns `DriverError` if the trigger DDL fails.
    fn uninstall(&mut self, table: &str) -> Result<(), DriverError>;
}

/// In-memory [`TriggerManager`] recording the exact operation sequence.
///
/// Double-installs and uninstalls of absent triggers are errors, like the
/// real trigger DDL would be, which makes tests catch any hook that
/// bypasses the registry guard.
///
/// # Examples
///
/// ```
/// use audit_core::{MemoryTriggerManager, TriggerManager, TriggerOp};
///
/// let mut triggers = MemoryTriggerManager::new();
/// triggers.install("orders").unwrap();
/// assert!(triggers.installed("orders"));
///
/// triggers.uninstall("orders").unwrap();
/// assert_eq!(
///     triggers.ops(),
///     &[
///         (TriggerOp::Install, "orders".to_string()),
///         (TriggerOp::Uninstall, "orders".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Default)]
pub struct MemoryTriggerManager {
    installed: BTreeSet<String>,
    ops: Vec<(TriggerOp, String)>,
    fail_install: BTreeSet<String>,
    fail_uninstall: BTreeSet<String>,
}

impl MemoryTriggerManager {
    /// Creates a manager with no installed triggers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a trigger is currently installed for the table.
    pub fn installed(&self, table: &str) -> bool {
        self.installed.contains(table)
    }

    /// Returns every install/uninstall call, in order.
    pub fn ops(&self) -> &[(TriggerOp, String)] {
        &self.ops
    }

    /// Makes future `install` calls for the table fail.
    pub fn fail_install_for(&mut self, table: impl Into<String>) {
        self.fail_install.insert(table.into());
    }

    /// Makes future `uninstall` calls for the table fail.
    pub fn fail_uninstall_for(&mut self, table: impl Into<String>) {
        self.fail_uninstall.insert(table.into());
    }
}

impl TriggerManager for MemoryTriggerManager {
    fn install(&mut self, table: &str) -> Result<(), DriverError> {
        if self.fail_install.contains(table) {
            return Err(DriverError::with_message(
                DriverErrorKind::Statement,
                format!("injected install failure: {table}"),
            ));
        }
        if !self.installed.insert(table.to_string()) {
            return Err(DriverError::with_message(
                DriverErrorKind::Statement,
                format!("trigger already exists for {table}"),
            ));
        }
        self.ops.push((TriggerOp::Install, table.to_string()));
        Ok(())
    }

    fn uninstall(&mut self, table: &str) -> Result<(), DriverError> {
        if self.fail_uninstall.contains(table) {
            return Err(DriverError::with_message(
                DriverErrorKind::Statement,
                format!("injected uninstall failure: {table}"),
            ));
        }
        if !self.installed.remove(table) {
            return Err(DriverError::with_message(
                DriverErrorKind::Statement,
                format!("no trigger installed for {table}"),
            ));
        }
        self.ops.push((TriggerOp::Uninstall, table.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_then_uninstall_round_trips() {
        let mut triggers = MemoryTriggerManager::new();

        triggers.install("orders").unwrap();
        assert!(triggers.installed("orders"));

        triggers.uninstall("orders").unwrap();
        assert!(!triggers.installed("orders"));
        assert_eq!(triggers.ops().len(), 2);
    }

    #[test]
    fn double_install_is_an_error() {
        let mut triggers = MemoryTriggerManager::new();
        triggers.install("orders").unwrap();

        assert!(triggers.install("orders").is_err());
        // Only the successful call is recorded.
        assert_eq!(triggers.ops().len(), 1);
    }

    #[test]
    fn uninstall_of_absent_trigger_is_an_error() {
        let mut triggers = MemoryTriggerManager::new();
        assert!(triggers.uninstall("orders").is_err());
        assert!(triggers.ops().is_empty());
    }

    #[test]
    fn injected_install_failure_leaves_no_trigger() {
        let mut triggers = MemoryTriggerManager::new();
        triggers.fail_install_for("orders");

        assert!(triggers.install("orders").is_err());
        assert!(!triggers.installed("orders"));
    }

    #[test]
    fn injected_uninstall_failure_keeps_trigger() {
        let mut triggers = MemoryTriggerManager::new();
        triggers.install("orders").unwrap();
        triggers.fail_uninstall_for("orders");

        assert!(triggers.uninstall("orders").is_err());
        assert!(triggers.installed("orders"));
    }
}
