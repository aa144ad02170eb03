//! Property tests for the audited connection.
//!
//! These validate the cross-module invariants: session-sync memoization,
//! literal quoting, and trigger-registry round trips, over generated
//! inputs.

use audit_core::{
    ActorIdentity, AuditedConnection, IgnoreRules, MemoryDriver, MemoryTriggerManager,
    TableOptions, TriggerManager, TriggerRegistry,
};
use proptest::prelude::*;

// Strategy: Generate arbitrary actor identities
fn arb_identity() -> impl Strategy<Value = ActorIdentity> {
    (
        prop::string::string_regex("[0-9]{1,6}").unwrap(),
        prop::string::string_regex("[a-z.']{1,12}@[a-z]{1,8}").unwrap(),
    )
        .prop_map(|(id, name)| ActorIdentity::new(id, name))
}

// Strategy: Generate plausible table names
fn arb_table_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").unwrap()
}

fn fresh_conn() -> AuditedConnection<MemoryDriver, MemoryTriggerManager> {
    AuditedConnection::new(
        MemoryDriver::new(),
        MemoryTriggerManager::new(),
        IgnoreRules::none(),
    )
}

proptest! {
    /// Property: For a fixed actor, any number of statements syncs the
    /// session at most once.
    ///
    /// The per-connection memo must keep the common case at zero extra
    /// statements: two session sets total, regardless of how many
    /// statements the unit of work issues.
    #[test]
    fn proptest_same_actor_syncs_once(
        identity in arb_identity(),
        statement_count in 1usize..20
    ) {
        let mut conn = fresh_conn();
        conn.bind_actor(identity);

        for i in 0..statement_count {
            conn.execute(&format!("SELECT {i}")).unwrap();
        }

        prop_assert_eq!(conn.inner().statements_containing("SET SESSION"), 2);
        prop_assert_eq!(
            conn.inner().statements().len(),
            statement_count + 2
        );
    }

    /// Property: The number of syncs equals the number of identity
    /// changes, not the number of statements.
    #[test]
    fn proptest_syncs_track_identity_changes(
        identities in prop::collection::vec(arb_identity(), 1..10)
    ) {
        let mut conn = fresh_conn();

        let mut expected_syncs = 0usize;
        let mut last: Option<ActorIdentity> = None;
        for identity in &identities {
            conn.bind_actor(identity.clone());
            conn.execute("SELECT 1").unwrap();
            conn.execute("SELECT 2").unwrap();

            if last.as_ref() != Some(identity) {
                expected_syncs += 1;
                last = Some(identity.clone());
            }
        }

        prop_assert_eq!(
            conn.inner().statements_containing("SET SESSION"),
            expected_syncs * 2
        );
    }

    /// Property: Identity values round-trip through literal quoting.
    ///
    /// Whatever the application puts in an identity (apostrophes
    /// included), the set statement must carry it as a correctly
    /// delimited SQL literal.
    #[test]
    fn proptest_identity_values_are_quoted(
        id in prop::string::string_regex("[a-zA-Z0-9' -]{1,20}").unwrap(),
        name in prop::string::string_regex("[a-zA-Z0-9' @.-]{1,20}").unwrap()
    ) {
        let mut conn = fresh_conn();
        conn.bind_actor(ActorIdentity::new(id.clone(), name.clone()));
        conn.execute("SELECT 1").unwrap();

        let statements = conn.inner().statements();
        let expected_id = format!(
            "SET SESSION audit.actor_id = '{}'",
            id.replace('\'', "''")
        );
        let expected_name = format!(
            "SET SESSION audit.actor_name = '{}'",
            name.replace('\'', "''")
        );
        prop_assert_eq!(&statements[0], &expected_id);
        prop_assert_eq!(&statements[1], &expected_name);
    }

    /// Property: Creating then dropping a table leaves the trigger
    /// registry exactly as it was.
    #[test]
    fn proptest_create_drop_round_trips_registry(
        table in arb_table_name(),
        seed_tables in prop::collection::btree_set(arb_table_name(), 0..5)
    ) {
        prop_assume!(!seed_tables.contains(&table));

        let mut triggers = MemoryTriggerManager::new();
        for seeded in &seed_tables {
            triggers.install(seeded).unwrap();
        }
        let mut conn = AuditedConnection::new(
            MemoryDriver::new(),
            triggers,
            IgnoreRules::none(),
        )
        .with_registry(TriggerRegistry::with_tables(seed_tables.iter().cloned()));

        let before = conn.registry().clone();
        conn.create_table(&table, &TableOptions::default()).unwrap();
        prop_assert!(conn.registry().has(&table));

        conn.drop_table(&table).unwrap();
        prop_assert_eq!(conn.registry(), &before);
    }

    /// Property: A rename never leaves both names registered, and the
    /// new name carries the trigger whenever it is not ignored.
    #[test]
    fn proptest_rename_moves_registration(
        old in arb_table_name(),
        new in arb_table_name()
    ) {
        prop_assume!(old != new);

        let mut conn = fresh_conn();
        conn.create_table(&old, &TableOptions::default()).unwrap();
        conn.rename_table(&old, &new).unwrap();

        prop_assert!(!conn.registry().has(&old));
        prop_assert!(conn.registry().has(&new));
        prop_assert_eq!(conn.registry().len(), 1);
    }

    /// Property: Replica connections issue no session statements for any
    /// identity.
    #[test]
    fn proptest_replica_never_syncs(identity in arb_identity()) {
        let mut conn = AuditedConnection::new(
            MemoryDriver::replica(),
            MemoryTriggerManager::new(),
            IgnoreRules::none(),
        );
        conn.bind_actor(identity);
        conn.execute("SELECT 1").unwrap();

        prop_assert_eq!(conn.inner().statements_containing("SET SESSION"), 0);
    }
}
