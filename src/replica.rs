//! Replica detection for the session-sync interceptor.

use crate::driver::Driver;

/// Caches the replica capability probe for one connection.
///
/// A replica connection is read-only: session mutation there is both
/// impossible and meaningless, so the interceptor skips syncing entirely.
/// The probe itself may cost a round-trip (e.g. `pg_is_in_recovery()` on
/// PostgreSQL), so the answer is taken once per connection and served from
/// cache afterwards. [`reset`] discards it; a reconnect may land the
/// connection on a host with a different role.
///
/// [`reset`]: ReplicaGuard::reset
#[derive(Debug, Clone, Default)]
pub struct ReplicaGuard {
    cached: Option<bool>,
}

impl ReplicaGuard {
    /// Creates a guard that has not probed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the connection is a read-only replica, probing the
    /// driver on first use.
    pub fn is_replica<D: Driver>(&mut self, driver: &D) -> bool {
        *self.cached.get_or_insert_with(|| driver.is_replica())
    }

    /// Discards the cached probe result.
    pub fn reset(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverError, MemoryDriver, Row, TableOptions};

    /// Driver that counts how often it is probed.
    struct CountingDriver {
        inner: MemoryDriver,
        probes: std::cell::Cell<usize>,
    }

    impl CountingDriver {
        fn new() -> Self {
            Self {
                inner: MemoryDriver::replica(),
                probes: std::cell::Cell::new(0),
            }
        }
    }

    impl Driver for CountingDriver {
        fn execute_raw(&mut self, sql: &str) -> Result<u64, DriverError> {
            self.inner.execute_raw(sql)
        }
        fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
            self.inner.execute(sql)
        }
        fn exec_query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>, DriverError> {
            self.inner.exec_query(sql, params)
        }
        fn exec_update(&mut self, sql: &str, params: &[&str]) -> Result<u64, DriverError> {
            self.inner.exec_update(sql, params)
        }
        fn exec_delete(&mut self, sql: &str, params: &[&str]) -> Result<u64, DriverError> {
            self.inner.exec_delete(sql, params)
        }
        fn create_table(&mut self, name: &str, options: &TableOptions) -> Result<(), DriverError> {
            self.inner.create_table(name, options)
        }
        fn drop_table(&mut self, name: &str) -> Result<(), DriverError> {
            self.inner.drop_table(name)
        }
        fn rename_table(&mut self, old: &str, new: &str) -> Result<(), DriverError> {
            self.inner.rename_table(old, new)
        }
        fn reconnect(&mut self) -> Result<(), DriverError> {
            self.inner.reconnect()
        }
        fn is_replica(&self) -> bool {
            self.probes.set(self.probes.get() + 1);
            self.inner.is_replica()
        }
    }

    #[test]
    fn probe_happens_once() {
        let driver = CountingDriver::new();
        let mut guard = ReplicaGuard::new();

        assert!(guard.is_replica(&driver));
        assert!(guard.is_replica(&driver));
        assert!(guard.is_replica(&driver));

        assert_eq!(driver.probes.get(), 1);
    }

    #[test]
    fn reset_forces_a_new_probe() {
        let driver = CountingDriver::new();
        let mut guard = ReplicaGuard::new();

        guard.is_replica(&driver);
        guard.reset();
        guard.is_replica(&driver);

        assert_eq!(driver.probes.get(), 2);
    }

    #[test]
    fn primary_is_not_replica() {
        let driver = MemoryDriver::new();
        let mut guard = ReplicaGuard::new();
        assert!(!guard.is_replica(&driver));
    }
}
