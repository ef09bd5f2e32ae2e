/// Canonical schema definitions
///
/// Each table is described exactly once as a declarative [`TableSpec`]
/// (columns, types, defaults, uniqueness, foreign keys). Two independent
/// consumers are generated from that single description so they can never
/// drift apart:
///
/// - [`bootstrap_ddl`] produces the DDL shipped in the initial migration
///   script (a unit test asserts the shipped script matches it), and
/// - the validation rules in [`rules`] back the `validator` derives on the
///   model payload structs, so runtime request validation and the stored
///   column constraints share one definition.
///
/// # Modules
///
/// - `table`: the `TableSpec`/`ColumnSpec` descriptor machinery
/// - `tables`: the five table descriptors (users, sessions, accounts,
///   verifications, todos)
/// - `rules`: per-field validation rules shared by all payload structs

pub mod rules;
pub mod table;
pub mod tables;

pub use table::{ColumnSpec, Reference, TableSpec};

/// Generates the full bootstrap DDL for a fresh database
///
/// Emits the `todo_priority` enum type, every table in dependency order
/// (parents before children), and the todo listing index. The output is the
/// exact content of the initial migration script.
pub fn bootstrap_ddl() -> String {
    let mut statements = vec![tables::priority_type_ddl()];
    for table in tables::ALL_TABLES {
        statements.push(table.create_table_ddl());
    }
    statements.push(tables::todos_listing_index_ddl());
    statements.join("\n\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_ddl_orders_parents_first() {
        let ddl = bootstrap_ddl();
        let users_at = ddl.find("CREATE TABLE IF NOT EXISTS users").unwrap();
        let todos_at = ddl.find("CREATE TABLE IF NOT EXISTS todos").unwrap();
        let sessions_at = ddl.find("CREATE TABLE IF NOT EXISTS sessions").unwrap();
        assert!(users_at < todos_at);
        assert!(users_at < sessions_at);
    }

    #[test]
    fn test_bootstrap_ddl_matches_shipped_migration() {
        let shipped = std::fs::read_to_string(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/migrations/0001_init.sql"
        ))
        .expect("initial migration script should exist");

        assert_eq!(
            shipped.trim(),
            bootstrap_ddl().trim(),
            "migrations/0001_init.sql must be regenerated from bootstrap_ddl()"
        );
    }

    #[test]
    fn test_cascading_foreign_keys_present() {
        let ddl = bootstrap_ddl();
        // Sessions, accounts, and todos all cascade when their user goes away
        assert_eq!(ddl.matches("REFERENCES users(id) ON DELETE CASCADE").count(), 3);
    }
}
