//! Table exemption rules for audit-trigger management.
//!
//! Some tables must never carry an audit trigger: migration bookkeeping,
//! the audit log itself, scratch tables. Exemptions are expressed as a
//! closed rule type rather than dynamic inspection so the logic stays
//! explicit and testable in isolation.

use regex::Regex;

/// A single exemption rule, matched against a table name.
#[derive(Debug, Clone)]
pub enum IgnoreRule {
    /// Matches exactly this table name.
    Exact(String),
    /// Matches any table name the pattern finds a match in.
    Pattern(Regex),
}

impl IgnoreRule {
    /// Returns true if this rule exempts the given table.
    pub fn matches(&self, table: &str) -> bool {
        match self {
            IgnoreRule::Exact(name) => name == table,
            IgnoreRule::Pattern(re) => re.is_match(table),
        }
    }
}

/// An ordered set of [`IgnoreRule`]s, fixed after construction.
///
/// The set is assumed small and static for the process lifetime;
/// [`matches`] evaluates rules in order per call with no caching.
///
/// # Examples
///
/// ```
/// use audit_core::IgnoreRules;
///
/// let rules = IgnoreRules::builder()
///     .exact("schema_migrations")
///     .pattern(r"^tmp_")
///     .expect("valid pattern")
///     .build();
///
/// assert!(rules.matches("schema_migrations"));
/// assert!(rules.matches("tmp_import_batch"));
/// assert!(!rules.matches("orders"));
/// ```
///
/// [`matches`]: IgnoreRules::matches
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// Returns an empty rule set that exempts nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns a builder for assembling a rule set.
    pub fn builder() -> IgnoreRulesBuilder {
        IgnoreRulesBuilder { rules: Vec::new() }
    }

    /// Returns true if any rule exempts the given table.
    pub fn matches(&self, table: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(table))
    }

    /// Returns the number of rules in the set.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the set contains no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builder for [`IgnoreRules`].
///
/// Rules are kept in insertion order. Pattern rules are compiled eagerly
/// so a malformed pattern fails at configuration time, not at match time.
#[derive(Debug)]
pub struct IgnoreRulesBuilder {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRulesBuilder {
    /// Adds an exact table-name rule.
    #[must_use]
    pub fn exact(mut self, table: impl Into<String>) -> Self {
        self.rules.push(IgnoreRule::Exact(table.into()));
        self
    }

    /// Adds a pattern rule, compiling the given regular expression.
    ///
    /// # Errors
    ///
    /// Returns the underlying `regex::Error` if the pattern does not
    /// compile.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.rules.push(IgnoreRule::Pattern(Regex::new(pattern)?));
        Ok(self)
    }

    /// Adds a pattern rule from an already-compiled regex.
    #[must_use]
    pub fn regex(mut self, re: Regex) -> Self {
        self.rules.push(IgnoreRule::Pattern(re));
        self
    }

    /// Finishes the builder, producing the immutable rule set.
    pub fn build(self) -> IgnoreRules {
        IgnoreRules { rules: self.rules }
    }
}
