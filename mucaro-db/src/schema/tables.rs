/// Table descriptors for every entity
///
/// Ordered parents-before-children so the generated DDL can run top to
/// bottom on a fresh database.
///
/// - `users`: identity records; email and external identity id are unique
///   at the storage layer, not just in application validation
/// - `sessions`: active auth sessions, cascade-deleted with their user
/// - `accounts`: linked credential/provider records, cascade-deleted;
///   opaque to this crate beyond storage
/// - `verifications`: short-lived tokens keyed by identifier + value, no FK
/// - `todos`: tasks owned by exactly one user, cascade-deleted

use super::rules;
use super::table::{ColumnSpec, TableSpec};

pub const USERS: TableSpec = TableSpec {
    name: "users",
    columns: &[
        ColumnSpec::id(),
        ColumnSpec::required("external_id", "TEXT").unique(),
        ColumnSpec::required("email", "TEXT").unique(),
        ColumnSpec::optional("name", "TEXT"),
        ColumnSpec::optional("avatar_url", "TEXT"),
        ColumnSpec::required("email_verified", "BOOLEAN").default_value("FALSE"),
        ColumnSpec::required("created_at", "TIMESTAMPTZ").default_value("NOW()"),
        ColumnSpec::required("updated_at", "TIMESTAMPTZ").default_value("NOW()"),
    ],
};

pub const SESSIONS: TableSpec = TableSpec {
    name: "sessions",
    columns: &[
        ColumnSpec::id(),
        ColumnSpec::required("user_id", "UUID").cascade_references("users", "id"),
        ColumnSpec::required("token", "TEXT").unique(),
        ColumnSpec::required("expires_at", "TIMESTAMPTZ"),
        ColumnSpec::optional("ip_address", "TEXT"),
        ColumnSpec::optional("user_agent", "TEXT"),
        ColumnSpec::required("created_at", "TIMESTAMPTZ").default_value("NOW()"),
        ColumnSpec::required("updated_at", "TIMESTAMPTZ").default_value("NOW()"),
    ],
};

pub const ACCOUNTS: TableSpec = TableSpec {
    name: "accounts",
    columns: &[
        ColumnSpec::id(),
        ColumnSpec::required("user_id", "UUID").cascade_references("users", "id"),
        ColumnSpec::required("provider_id", "TEXT"),
        ColumnSpec::required("account_id", "TEXT"),
        ColumnSpec::optional("password_hash", "TEXT"),
        ColumnSpec::optional("access_token", "TEXT"),
        ColumnSpec::optional("refresh_token", "TEXT"),
        ColumnSpec::optional("scope", "TEXT"),
        ColumnSpec::required("created_at", "TIMESTAMPTZ").default_value("NOW()"),
        ColumnSpec::required("updated_at", "TIMESTAMPTZ").default_value("NOW()"),
    ],
};

pub const VERIFICATIONS: TableSpec = TableSpec {
    name: "verifications",
    columns: &[
        ColumnSpec::id(),
        ColumnSpec::required("identifier", "TEXT"),
        ColumnSpec::required("value", "TEXT"),
        ColumnSpec::required("expires_at", "TIMESTAMPTZ"),
        ColumnSpec::required("created_at", "TIMESTAMPTZ").default_value("NOW()"),
        ColumnSpec::required("updated_at", "TIMESTAMPTZ").default_value("NOW()"),
    ],
};

pub const TODOS: TableSpec = TableSpec {
    name: "todos",
    columns: &[
        ColumnSpec::id(),
        ColumnSpec::required("user_id", "UUID").cascade_references("users", "id"),
        ColumnSpec::required("title", "TEXT"),
        ColumnSpec::optional("description", "TEXT"),
        ColumnSpec::required("completed", "BOOLEAN").default_value("FALSE"),
        ColumnSpec::required("priority", "todo_priority").default_value("'medium'"),
        ColumnSpec::optional("due_date", "TIMESTAMPTZ"),
        ColumnSpec::required("created_at", "TIMESTAMPTZ").default_value("NOW()"),
        ColumnSpec::required("updated_at", "TIMESTAMPTZ").default_value("NOW()"),
    ],
};

/// All tables in creation order (parents before children)
pub const ALL_TABLES: &[TableSpec] = &[USERS, SESSIONS, ACCOUNTS, VERIFICATIONS, TODOS];

/// DDL for the `todo_priority` enum type
///
/// Wrapped so re-running the bootstrap script against an existing database
/// is harmless; CREATE TYPE has no IF NOT EXISTS form.
pub fn priority_type_ddl() -> String {
    let labels: Vec<String> = rules::PRIORITY_LABELS
        .iter()
        .map(|label| format!("'{label}'"))
        .collect();
    format!(
        "DO $$ BEGIN\n    CREATE TYPE todo_priority AS ENUM ({});\nEXCEPTION WHEN duplicate_object THEN NULL;\nEND $$;",
        labels.join(", ")
    )
}

/// Index backing the newest-first per-user todo listing
pub fn todos_listing_index_ddl() -> String {
    "CREATE INDEX IF NOT EXISTS todos_user_id_created_at_idx ON todos (user_id, created_at DESC);"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_constraints_live_in_storage() {
        assert!(USERS.column("email").unwrap().unique);
        assert!(USERS.column("external_id").unwrap().unique);
        assert!(SESSIONS.column("token").unwrap().unique);
    }

    #[test]
    fn test_verifications_have_no_foreign_key() {
        assert!(VERIFICATIONS.columns.iter().all(|c| c.references.is_none()));
    }

    #[test]
    fn test_todo_defaults() {
        assert_eq!(TODOS.column("completed").unwrap().default, Some("FALSE"));
        assert_eq!(TODOS.column("priority").unwrap().default, Some("'medium'"));
    }

    #[test]
    fn test_priority_type_lists_every_label() {
        let ddl = priority_type_ddl();
        for label in rules::PRIORITY_LABELS {
            assert!(ddl.contains(&format!("'{label}'")));
        }
    }
}
