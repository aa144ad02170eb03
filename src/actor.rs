//! Actor identity and the per-unit-of-work context that carries it.
//!
//! Attribution is explicit: there is no thread-local or global "current
//! user". Each unit of work owns an [`ActorContext`] and the connection
//! decorator reads from it before every data-affecting statement. Units of
//! work never share a context, so concurrent callers cannot observe each
//! other's identity.

/// Sentinel actor id used when no identity is bound.
pub const SENTINEL_ACTOR_ID: &str = "-1";

/// Sentinel actor name used when no identity is bound.
pub const SENTINEL_ACTOR_NAME: &str = "UNKNOWN";

/// The identity responsible for a database mutation.
///
/// Produced by the surrounding application per logical caller (a request,
/// a job, a migration). This crate only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorIdentity {
    /// Stable identifier for this actor
    pub id: String,
    /// Human-meaningful unique name (e.g. an email address)
    pub unique_name: String,
}

impl ActorIdentity {
    /// Creates a new actor identity.
    pub fn new(id: impl Into<String>, unique_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unique_name: unique_name.into(),
        }
    }

    /// Returns the sentinel identity used when no caller context is bound.
    ///
    /// Attribution is best-effort for contexts without a bound identity
    /// (background jobs, migrations); those mutations are recorded against
    /// `"-1"` / `"UNKNOWN"` rather than rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use audit_core::ActorIdentity;
    ///
    /// let unknown = ActorIdentity::sentinel();
    /// assert_eq!(unknown.id, "-1");
    /// assert_eq!(unknown.unique_name, "UNKNOWN");
    /// ```
    pub fn sentinel() -> Self {
        Self::new(SENTINEL_ACTOR_ID, SENTINEL_ACTOR_NAME)
    }
}

/// Per-unit-of-work store for the currently acting identity.
///
/// `ActorContext` holds at most one bound [`ActorIdentity`], plus an
/// optional fallback identity consulted when nothing is bound. Resolution
/// order is: bound identity, then fallback, then the sentinel.
///
/// The fallback exists for deployments that attribute otherwise-anonymous
/// work to a service identity instead of the sentinel. It is inert unless
/// set.
///
/// # Examples
///
/// ```
/// use audit_core::{ActorContext, ActorIdentity};
///
/// let mut ctx = ActorContext::unbound();
/// assert_eq!(ctx.resolve(), ActorIdentity::sentinel());
///
/// ctx.bind(ActorIdentity::new("42", "alice@example.com"));
/// assert_eq!(ctx.resolve().id, "42");
///
/// ctx.clear();
/// assert!(ctx.get().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ActorContext {
    bound: Option<ActorIdentity>,
    fallback: Option<ActorIdentity>,
}

impl ActorContext {
    /// Creates a context with no bound identity.
    pub fn unbound() -> Self {
        Self::default()
    }

    /// Creates a context with the given identity already bound.
    pub fn bound(identity: ActorIdentity) -> Self {
        Self {
            bound: Some(identity),
            fallback: None,
        }
    }

    /// Sets the fallback identity consulted when nothing is bound.
    ///
    /// ```
    /// use audit_core::{ActorContext, ActorIdentity};
    ///
    /// let ctx = ActorContext::unbound()
    ///     .with_fallback(ActorIdentity::new("0", "system@internal"));
    ///
    /// // Nothing bound, so the fallback wins over the sentinel.
    /// assert_eq!(ctx.resolve().unique_name, "system@internal");
    /// ```
    #[must_use]
    pub fn with_fallback(mut self, identity: ActorIdentity) -> Self {
        self.fallback = Some(identity);
        self
    }

    /// Sets or replaces the fallback identity in place.
    pub fn set_fallback(&mut self, identity: ActorIdentity) {
        self.fallback = Some(identity);
    }

    /// Binds the acting identity for the current unit of work.
    pub fn bind(&mut self, identity: ActorIdentity) {
        self.bound = Some(identity);
    }

    /// Clears the bound identity. The fallback, if any, is untouched.
    pub fn clear(&mut self) {
        self.bound = None;
    }

    /// Returns the identity that would be used for attribution, if any.
    ///
    /// Bound identity first, then the fallback. Returns `None` when
    /// neither is set; callers apply the sentinel via [`resolve`].
    ///
    /// [`resolve`]: ActorContext::resolve
    pub fn get(&self) -> Option<&ActorIdentity> {
        self.bound.as_ref().or(self.fallback.as_ref())
    }

    /// Resolves the identity for attribution, applying the sentinel
    /// fallback when no identity is available.
    pub fn resolve(&self) -> ActorIdentity {
        self.get().cloned().unwrap_or_else(ActorIdentity::sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_context_resolves_to_sentinel() {
        let ctx = ActorContext::unbound();
        assert!(ctx.get().is_none());

        let resolved = ctx.resolve();
        assert_eq!(resolved.id, SENTINEL_ACTOR_ID);
        assert_eq!(resolved.unique_name, SENTINEL_ACTOR_NAME);
    }

    #[test]
    fn bound_identity_is_returned() {
        let ctx = ActorContext::bound(ActorIdentity::new("7", "bob@example.com"));

        assert_eq!(ctx.get().unwrap().id, "7");
        assert_eq!(ctx.resolve().unique_name, "bob@example.com");
    }

    #[test]
    fn bind_replaces_previous_identity() {
        let mut ctx = ActorContext::bound(ActorIdentity::new("1", "first@example.com"));
        ctx.bind(ActorIdentity::new("2", "second@example.com"));

        assert_eq!(ctx.resolve().id, "2");
    }

    #[test]
    fn clear_removes_bound_identity() {
        let mut ctx = ActorContext::bound(ActorIdentity::new("7", "bob@example.com"));
        ctx.clear();

        assert!(ctx.get().is_none());
        assert_eq!(ctx.resolve(), ActorIdentity::sentinel());
    }

    #[test]
    fn fallback_wins_over_sentinel_when_unbound() {
        let ctx = ActorContext::unbound()
            .with_fallback(ActorIdentity::new("0", "system@internal"));

        assert_eq!(ctx.resolve().id, "0");
        assert_eq!(ctx.resolve().unique_name, "system@internal");
    }

    #[test]
    fn bound_identity_wins_over_fallback() {
        let mut ctx = ActorContext::unbound()
            .with_fallback(ActorIdentity::new("0", "system@internal"));
        ctx.bind(ActorIdentity::new("42", "alice@example.com"));

        assert_eq!(ctx.resolve().id, "42");
    }

    #[test]
    fn clear_preserves_fallback() {
        let mut ctx = ActorContext::unbound()
            .with_fallback(ActorIdentity::new("0", "system@internal"));
        ctx.bind(ActorIdentity::new("42", "alice@example.com"));
        ctx.clear();

        assert_eq!(ctx.resolve().id, "0");
    }

    #[test]
    fn sentinel_identity_matches_constants() {
        let s = ActorIdentity::sentinel();
        assert_eq!(s, ActorIdentity::new(SENTINEL_ACTOR_ID, SENTINEL_ACTOR_NAME));
    }
}
