//! The audited connection decorator.
//!
//! [`AuditedConnection`] wraps a [`Driver`] and implements the same
//! statement-execution and schema-DDL surface, running its hooks before
//! delegating. Interception is therefore statically visible: there is no
//! runtime method rewriting, and the two session-set statements the
//! interceptor issues go through the driver's unintercepted
//! [`execute_raw`] primitive, so they can never recurse into the hooks.
//!
//! [`execute_raw`]: Driver::execute_raw

use crate::actor::{ActorContext, ActorIdentity};
use crate::driver::{Driver, Row, TableOptions};
use crate::error::{Error, TriggerFailure, TriggerOp};
use crate::ignore::IgnoreRules;
use crate::registry::TriggerRegistry;
use crate::replica::ReplicaGuard;
use crate::session::{self, ConnectionAuditState};
use crate::trigger::TriggerManager;

/// A database connection whose mutations are attributed and whose audit
/// triggers follow schema changes.
///
/// The decorator owns the wrapped driver and five collaborators:
///
/// - [`ActorContext`]: the identity to attribute statements to
/// - [`IgnoreRules`]: tables exempt from trigger management
/// - [`TriggerRegistry`]: which tables currently carry a trigger
/// - [`ConnectionAuditState`]: memo of the last identity synced
/// - [`ReplicaGuard`]: suppresses session mutation on replicas
///
/// Before each data-affecting statement ([`execute`], [`exec_query`],
/// [`exec_update`], [`exec_delete`]) the session is synced to the current
/// actor; table DDL ([`create_table`], [`drop_table`], [`rename_table`])
/// keeps trigger coverage correct.
///
/// A connection serves one unit of work at a time (the pool's guarantee),
/// so none of this state is locked.
///
/// # Examples
///
/// ```
/// use audit_core::{
///     ActorIdentity, AuditedConnection, IgnoreRules, MemoryDriver,
///     MemoryTriggerManager, TableOptions,
/// };
///
/// let ignore = IgnoreRules::builder().exact("schema_migrations").build();
/// let mut conn = AuditedConnection::new(
///     MemoryDriver::new(),
///     MemoryTriggerManager::new(),
///     ignore,
/// );
///
/// conn.create_table("orders", &TableOptions::default())?;
/// assert!(conn.registry().has("orders"));
///
/// conn.bind_actor(ActorIdentity::new("42", "alice@example.com"));
/// conn.execute("INSERT INTO orders VALUES (1)")?;
/// conn.execute("INSERT INTO orders VALUES (2)")?;
///
/// // The two session-set statements were issued once, not per statement.
/// assert_eq!(conn.inner().statements_containing("SET SESSION"), 2);
/// # Ok::<(), audit_core::Error>(())
/// ```
///
/// [`execute`]: AuditedConnection::execute
/// [`exec_query`]: AuditedConnection::exec_query
/// [`exec_update`]: AuditedConnection::exec_update
/// [`exec_delete`]: AuditedConnection::exec_delete
/// [`create_table`]: AuditedConnection::create_table
/// [`drop_table`]: AuditedConnection::drop_table
/// [`rename_table`]: AuditedConnection::rename_table
#[derive(Debug)]
pub struct AuditedConnection<D: Driver, T: TriggerManager> {
    inner: D,
    triggers: T,
    context: ActorContext,
    ignore: IgnoreRules,
    registry: TriggerRegistry,
    audit_state: ConnectionAuditState,
    replica: ReplicaGuard,
}

impl<D: Driver, T: TriggerManager> AuditedConnection<D, T> {
    /// Wraps a driver with an empty registry and an unbound actor context.
    pub fn new(driver: D, triggers: T, ignore: IgnoreRules) -> Self {
        Self {
            inner: driver,
            triggers,
            context: ActorContext::unbound(),
            ignore,
            registry: TriggerRegistry::new(),
            audit_state: ConnectionAuditState::new(),
            replica: ReplicaGuard::new(),
        }
    }

    /// Seeds the trigger registry, typically from a catalog scan of
    /// triggers that already exist.
    #[must_use]
    pub fn with_registry(mut self, registry: TriggerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the actor context, e.g. to install a fallback identity.
    #[must_use]
    pub fn with_context(mut self, context: ActorContext) -> Self {
        self.context = context;
        self
    }

    // ========================================================================
    // Actor context
    // ========================================================================

    /// Binds the acting identity for the current unit of work.
    pub fn bind_actor(&mut self, identity: ActorIdentity) {
        self.context.bind(identity);
    }

    /// Clears the bound identity; subsequent statements attribute to the
    /// context's fallback or the sentinel.
    pub fn clear_actor(&mut self) {
        self.context.clear();
    }

    /// Returns the actor context.
    pub fn actor_context(&self) -> &ActorContext {
        &self.context
    }

    /// Returns the actor context for in-place mutation.
    pub fn actor_context_mut(&mut self) -> &mut ActorContext {
        &mut self.context
    }

    // ========================================================================
    // Statement execution (session-synced)
    // ========================================================================

    /// Executes a plain statement, syncing the session first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] if the session sync or the statement
    /// itself fails. A failed sync leaves the memo stale, so the next
    /// statement retries it.
    pub fn execute(&mut self, sql: &str) -> Result<u64, Error> {
        self.sync_session()?;
        self.inner.execute(sql).map_err(Error::from)
    }

    /// Executes a parameterized query, syncing the session first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] if the session sync or the query fails.
    pub fn exec_query(&mut self, sql: &str, params: &[&str]) -> Result<Vec<Row>, Error> {
        self.sync_session()?;
        self.inner.exec_query(sql, params).map_err(Error::from)
    }

    /// Executes a parameterized update, syncing the session first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] if the session sync or the update fails.
    pub fn exec_update(&mut self, sql: &str, params: &[&str]) -> Result<u64, Error> {
        self.sync_session()?;
        self.inner.exec_update(sql, params).map_err(Error::from)
    }

    /// Executes a parameterized delete, syncing the session first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] if the session sync or the delete fails.
    pub fn exec_delete(&mut self, sql: &str, params: &[&str]) -> Result<u64, Error> {
        self.sync_session()?;
        self.inner.exec_delete(sql, params).map_err(Error::from)
    }

    /// Executes a statement without syncing the session.
    ///
    /// Escape hatch for statements that must not be attributed (and must
    /// not trigger attribution), mirroring the driver's own raw primitive.
    /// Mutations issued through here may be recorded against a stale
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] if the statement fails.
    pub fn execute_raw(&mut self, sql: &str) -> Result<u64, Error> {
        self.inner.execute_raw(sql).map_err(Error::from)
    }

    /// Ensures the database session reflects the current actor identity.
    ///
    /// Replica connections are skipped outright. Otherwise the identity is
    /// resolved (sentinel fallback), compared against the per-connection
    /// memo, and only on a mismatch are the two session-set statements
    /// issued through the unintercepted primitive. The memo is updated
    /// after both statements succeed, never on failure.
    fn sync_session(&mut self) -> Result<(), crate::driver::DriverError> {
        if self.replica.is_replica(&self.inner) {
            return Ok(());
        }
        let actor = self.context.resolve();
        if self.audit_state.is_current(&actor) {
            return Ok(());
        }
        self.apply_session(&actor)
    }

    fn apply_session(&mut self, actor: &ActorIdentity) -> Result<(), crate::driver::DriverError> {
        tracing::debug!(
            actor_id = %actor.id,
            actor_name = %actor.unique_name,
            "syncing session attribution"
        );
        self.inner
            .execute_raw(&session::set_actor_id_statement(&actor.id))?;
        self.inner
            .execute_raw(&session::set_actor_name_statement(&actor.unique_name))?;
        self.audit_state.record(actor);
        Ok(())
    }

    /// Re-issues both session-set statements for the current identity,
    /// even if the memo believes them current.
    ///
    /// For use after operations outside this core's view have clobbered
    /// session state (e.g. a `DISCARD ALL` issued directly on the driver).
    /// No-op on replicas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] if a set statement fails.
    pub fn resync(&mut self) -> Result<(), Error> {
        if self.replica.is_replica(&self.inner) {
            return Ok(());
        }
        let actor = self.context.resolve();
        self.apply_session(&actor).map_err(Error::from)
    }

    /// Forgets the session memo so the next statement re-syncs, without
    /// touching the database.
    pub fn reset_session_cache(&mut self) {
        self.audit_state.clear();
    }

    // ========================================================================
    // Schema changes (trigger lifecycle)
    // ========================================================================

    /// Creates a table, then installs its audit trigger.
    ///
    /// The underlying create runs first. A trigger is then installed and
    /// registered unless the table is temporary, matches an ignore rule,
    /// or is already registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] if the create itself fails, or
    /// [`Error::Trigger`] if the trigger install fails. In the latter
    /// case the whole operation is reported failed, so a non-ignored
    /// table is never left silently unaudited.
    pub fn create_table(&mut self, name: &str, options: &TableOptions) -> Result<(), Error> {
        self.inner.create_table(name, options)?;
        if options.temporary || self.ignore.matches(name) || self.registry.has(name) {
            return Ok(());
        }
        self.install_trigger(name)
    }

    /// Drops a table, removing its audit trigger first.
    ///
    /// The trigger must not outlive (or block) the table being removed,
    /// so the uninstall happens before the underlying drop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Trigger`] if the uninstall fails (the drop is not
    /// attempted), or [`Error::Driver`] if the drop itself fails.
    pub fn drop_table(&mut self, name: &str) -> Result<(), Error> {
        if self.registry.has(name) {
            self.uninstall_trigger(name)?;
        }
        self.inner.drop_table(name).map_err(Error::from)
    }

    /// Renames a table, re-binding its audit trigger to the new name.
    ///
    /// A trigger's identity and body are bound to the table name, so a
    /// rename never transfers one in place: the old trigger is removed
    /// before the rename, and a fresh one installed under the new name
    /// afterwards, unless the new name is ignored or already registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Trigger`] if either trigger operation fails (the
    /// rename is not attempted when the uninstall fails), or
    /// [`Error::Driver`] if the rename itself fails.
    pub fn rename_table(&mut self, old: &str, new: &str) -> Result<(), Error> {
        if self.registry.has(old) {
            self.uninstall_trigger(old)?;
        }
        self.inner.rename_table(old, new)?;
        if self.ignore.matches(new) || self.registry.has(new) {
            return Ok(());
        }
        self.install_trigger(new)
    }

    fn install_trigger(&mut self, table: &str) -> Result<(), Error> {
        match self.triggers.install(table) {
            Ok(()) => {
                self.registry.register(table);
                tracing::info!(table, "audit trigger installed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(table, error = %e, "audit trigger install failed");
                Err(TriggerFailure::new(TriggerOp::Install, table, e).into())
            }
        }
    }

    fn uninstall_trigger(&mut self, table: &str) -> Result<(), Error> {
        match self.triggers.uninstall(table) {
            Ok(()) => {
                self.registry.unregister(table);
                tracing::info!(table, "audit trigger removed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(table, error = %e, "audit trigger uninstall failed");
                Err(TriggerFailure::new(TriggerOp::Uninstall, table, e).into())
            }
        }
    }

    // ========================================================================
    // Connection lifecycle
    // ========================================================================

    /// Re-establishes the underlying connection and forgets per-session
    /// state: the audit memo (the new session holds no variables) and the
    /// cached replica probe (the new connection may have a different
    /// role). The next statement performs a fresh sync.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] if the underlying reconnect fails; the
    /// memo is left untouched in that case, since no new session exists.
    pub fn reconnect(&mut self) -> Result<(), Error> {
        self.inner.reconnect()?;
        self.audit_state.clear();
        self.replica.reset();
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the wrapped driver.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Returns the trigger manager.
    pub fn trigger_manager(&self) -> &T {
        &self.triggers
    }

    /// Returns the trigger registry.
    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    /// Returns the ignore rules.
    pub fn ignore_rules(&self) -> &IgnoreRules {
        &self.ignore
    }

    /// Returns the session memo.
    pub fn audit_state(&self) -> &ConnectionAuditState {
        &self.audit_state
    }

    /// Unwraps the decorator, discarding audit state.
    pub fn into_inner(self) -> D {
        self.inner
    }
}
