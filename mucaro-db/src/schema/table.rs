/// Declarative table descriptors
///
/// `TableSpec` is deliberately dumb data: the DDL generator below and the
/// validation rules in `schema::rules` are the only behavior attached to a
/// schema, and both read from the same descriptor constants in
/// `schema::tables`.

/// A foreign-key reference from one column to another table's column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Referenced table name
    pub table: &'static str,

    /// Referenced column name
    pub column: &'static str,

    /// Whether deleting the parent row deletes dependent rows
    pub on_delete_cascade: bool,
}

/// A single column description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub primary_key: bool,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<&'static str>,
    pub references: Option<Reference>,
}

impl ColumnSpec {
    /// A required (NOT NULL) column with no default
    pub const fn required(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            primary_key: false,
            nullable: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    /// An optional (nullable) column
    pub const fn optional(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            nullable: true,
            ..Self::required(name, sql_type)
        }
    }

    /// The conventional UUID primary key column
    pub const fn id() -> Self {
        Self {
            primary_key: true,
            default: Some("gen_random_uuid()"),
            ..Self::required("id", "UUID")
        }
    }

    pub const fn unique(self) -> Self {
        Self { unique: true, ..self }
    }

    pub const fn default_value(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn cascade_references(self, table: &'static str, column: &'static str) -> Self {
        Self {
            references: Some(Reference {
                table,
                column,
                on_delete_cascade: true,
            }),
            ..self
        }
    }

    fn ddl(&self) -> String {
        let mut out = format!("    {} {}", self.name, self.sql_type);
        if self.primary_key {
            out.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            out.push_str(" NOT NULL");
        }
        if self.unique {
            out.push_str(" UNIQUE");
        }
        if let Some(default) = self.default {
            out.push_str(" DEFAULT ");
            out.push_str(default);
        }
        if let Some(reference) = self.references {
            out.push_str(&format!(" REFERENCES {}({})", reference.table, reference.column));
            if reference.on_delete_cascade {
                out.push_str(" ON DELETE CASCADE");
            }
        }
        out
    }
}

/// A complete table description
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSpec {
    /// Renders the CREATE TABLE statement for this descriptor
    pub fn create_table_ddl(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnSpec::ddl).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
            self.name,
            columns.join(",\n")
        )
    }

    /// Looks up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: TableSpec = TableSpec {
        name: "widgets",
        columns: &[
            ColumnSpec::id(),
            ColumnSpec::required("owner_id", "UUID").cascade_references("users", "id"),
            ColumnSpec::required("label", "TEXT").unique(),
            ColumnSpec::optional("note", "TEXT"),
            ColumnSpec::required("created_at", "TIMESTAMPTZ").default_value("NOW()"),
        ],
    };

    #[test]
    fn test_create_table_ddl() {
        let ddl = SAMPLE.create_table_ddl();
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS widgets (\n"));
        assert!(ddl.contains("    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),\n"));
        assert!(ddl.contains("    owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,\n"));
        assert!(ddl.contains("    label TEXT NOT NULL UNIQUE,\n"));
        assert!(ddl.contains("    note TEXT,\n"));
        assert!(ddl.contains("    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()\n"));
        assert!(ddl.ends_with(");"));
    }

    #[test]
    fn test_column_lookup() {
        assert!(SAMPLE.column("label").is_some());
        assert!(SAMPLE.column("missing").is_none());
        assert!(SAMPLE.column("note").unwrap().nullable);
    }
}
