//! Actor attribution and audit-trigger lifecycle management for database
//! sessions.
//!
//! This crate attributes every database mutation to the acting identity
//! and keeps database-side audit triggers synchronized with schema
//! evolution, without requiring call sites to participate explicitly:
//! - **Session sync**: before each data-affecting statement, the caller's
//!   identity is written into session variables read by the audit
//!   triggers, memoized per connection so the common case issues nothing
//! - **Trigger lifecycle**: table create/drop/rename automatically
//!   install, remove, and re-bind the table's audit trigger
//! - **Explicit interception**: a decorator over the driver contract, not
//!   runtime patching, so the hooks are statically visible
//!
//! # Core Types
//!
//! - [`AuditedConnection`]: decorator wrapping a [`Driver`], running the
//!   sync and schema hooks before delegating
//! - [`ActorContext`] / [`ActorIdentity`]: explicit per-unit-of-work
//!   identity, with sentinel fallback for unattributed work
//! - [`IgnoreRules`]: tables exempt from trigger management
//! - [`TriggerRegistry`]: which tables currently carry a trigger
//! - [`TriggerManager`]: the seam issuing the actual trigger DDL
//!
//! # Examples
//!
//! ```
//! use audit_core::{
//!     ActorIdentity, AuditedConnection, IgnoreRules, MemoryDriver,
//!     MemoryTriggerManager, TableOptions,
//! };
//!
//! let ignore = IgnoreRules::builder()
//!     .exact("schema_migrations")
//!     .build();
//!
//! let mut conn = AuditedConnection::new(
//!     MemoryDriver::new(),
//!     MemoryTriggerManager::new(),
//!     ignore,
//! );
//!
//! // Schema changes keep trigger coverage correct.
//! conn.create_table("orders", &TableOptions::default())?;
//! assert!(conn.registry().has("orders"));
//!
//! // Statements are attributed to the bound actor.
//! conn.bind_actor(ActorIdentity::new("42", "alice@example.com"));
//! conn.execute("INSERT INTO orders VALUES (1)")?;
//! # Ok::<(), audit_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod actor;
mod connection;
mod driver;
mod error;
mod ignore;
mod registry;
mod replica;
mod session;
mod trigger;

pub use actor::{ActorContext, ActorIdentity, SENTINEL_ACTOR_ID, SENTINEL_ACTOR_NAME};
pub use connection::AuditedConnection;
pub use driver::{Driver, DriverError, DriverErrorKind, MemoryDriver, Row, TableOptions};
pub use error::{Error, TriggerFailure, TriggerOp};
pub use ignore::{IgnoreRule, IgnoreRules, IgnoreRulesBuilder};
pub use registry::TriggerRegistry;
pub use replica::ReplicaGuard;
pub use session::ConnectionAuditState;
pub use trigger::{MemoryTriggerManager, TriggerManager};
