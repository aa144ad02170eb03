//! Per-connection memo of the last actor identity synced to the session,
//! and the session-set statements themselves.
//!
//! Database-side trigger logic reads two connection-scoped variables,
//! `audit.actor_id` and `audit.actor_name`, to attribute each mutation.
//! The interceptor sets them with two idempotent `SET SESSION` statements
//! and memoizes what it set, so the common case (same actor, statement
//! after statement) issues nothing.

use crate::actor::ActorIdentity;

/// Session variable holding the acting identity's id.
const ACTOR_ID_VAR: &str = "audit.actor_id";

/// Session variable holding the acting identity's unique name.
const ACTOR_NAME_VAR: &str = "audit.actor_name";

/// Memo of the last [`ActorIdentity`] synced to a connection's session.
///
/// Owned exclusively by the connection it describes; never shared. Starts
/// unset, is updated after both session-set statements succeed, and is
/// cleared on reconnect so the fresh session is re-synced on the next
/// statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionAuditState {
    last: Option<ActorIdentity>,
}

impl ConnectionAuditState {
    /// Creates an unset memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the session already holds exactly this identity.
    ///
    /// An unset memo is never current: the session's variables are
    /// unknown, so a sync is required.
    pub fn is_current(&self, actor: &ActorIdentity) -> bool {
        self.last.as_ref() == Some(actor)
    }

    /// Records the identity the session was just synced to.
    pub fn record(&mut self, actor: &ActorIdentity) {
        self.last = Some(actor.clone());
    }

    /// Forgets the memo, forcing a fresh sync on the next statement.
    pub fn clear(&mut self) {
        self.last = None;
    }

    /// Returns the last synced identity, if any.
    pub fn last(&self) -> Option<&ActorIdentity> {
        self.last.as_ref()
    }
}

/// Builds the statement setting the session's actor-id variable.
pub(crate) fn set_actor_id_statement(id: &str) -> String {
    format!("SET SESSION {ACTOR_ID_VAR} = {}", quote_literal(id))
}

/// Builds the statement setting the session's actor-name variable.
pub(crate) fn set_actor_name_statement(name: &str) -> String {
    format!("SET SESSION {ACTOR_NAME_VAR} = {}", quote_literal(name))
}

/// Quotes a string as a SQL literal, doubling embedded single quotes.
///
/// Identity values come from the application (names can contain
/// apostrophes) and are interpolated into the set statements, so they must
/// be quoted here.
fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push('\'');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}
