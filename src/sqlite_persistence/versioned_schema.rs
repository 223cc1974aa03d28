use anyhow::{bail, Result};
use rusqlite::{params, Connection, OptionalExtension};

pub const BASE_DB_VERSION: usize = 99999;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = $crate::sqlite_persistence::Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

/// Declared column type.
///
/// `Untyped` columns are created without a declared type, which gives them
/// BLOB affinity: SQLite stores whatever value is bound (integer or text)
/// without any conversion.
#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Untyped,
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn declaration(&self) -> &'static str {
        match self {
            SqlType::Untyped => "",
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn from_declaration(declared: &str) -> Option<&'static SqlType> {
        match declared {
            "" => Some(&SqlType::Untyped),
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            _ => None,
        }
    }
}

pub struct Column<'a> {
    pub name: &'a str,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static>],
    /// (index name, comma separated column list)
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut def = column.name.to_string();
                let declared = column.sql_type.declaration();
                if !declared.is_empty() {
                    def.push(' ');
                    def.push_str(declared);
                }
                if column.is_primary_key {
                    def.push_str(" PRIMARY KEY");
                }
                if column.non_null {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect();

        let mut create_sql = format!("CREATE TABLE {} ({}", self.name, column_defs.join(", "));
        for unique_constraint in self.unique_constraints {
            create_sql.push_str(&format!(", UNIQUE ({})", unique_constraint.join(", ")));
        }
        create_sql.push_str(");");
        conn.execute(&create_sql, params![])?;

        for (index_name, columns) in self.indices {
            conn.execute(
                &format!("CREATE INDEX {} ON {}({});", index_name, self.name, columns),
                params![],
            )?;
        }
        Ok(())
    }

    pub fn drop(&self, conn: &Connection) -> Result<()> {
        conn.execute(&format!("DROP TABLE IF EXISTS {};", self.name), params![])?;
        Ok(())
    }

    fn validate_columns(&self, conn: &Connection) -> Result<()> {
        struct ActualColumn {
            name: String,
            declared_type: String,
            non_null: bool,
            is_primary_key: bool,
        }

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns = stmt
            .query_map(params![], |row| {
                Ok(ActualColumn {
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                    non_null: row.get::<_, i32>(3)? == 1,
                    is_primary_key: row.get::<_, i32>(5)? > 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if actual_columns.is_empty() {
            bail!("Table {} does not exist", self.name);
        }

        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}. Found column names: {}, expected: {}",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                actual_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual_columns.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} Column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            match SqlType::from_declaration(&actual.declared_type) {
                Some(sql_type) if sql_type == expected.sql_type => {}
                _ => bail!(
                    "Table {} Column {} type mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    actual.declared_type
                ),
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} Column {} non-null mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.non_null,
                    actual.non_null
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} Column {} primary key mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.is_primary_key,
                    actual.is_primary_key
                );
            }
        }
        Ok(())
    }

    fn validate_indices(&self, conn: &Connection) -> Result<()> {
        for (index_name, _columns) in self.indices {
            let index_exists = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();

            if !index_exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }
        Ok(())
    }

    fn validate_unique_constraints(&self, conn: &Connection) -> Result<()> {
        if self.unique_constraints.is_empty() {
            return Ok(());
        }

        // Unique constraints show up as unique indices in PRAGMA index_list
        let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", self.name))?;
        let unique_indices: Vec<String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|(_, is_unique)| *is_unique == 1)
            .map(|(name, _)| name)
            .collect();

        let mut unique_column_sets: Vec<Vec<String>> = Vec::with_capacity(unique_indices.len());
        for index_name in &unique_indices {
            let mut idx_stmt = conn.prepare(&format!("PRAGMA index_info({})", index_name))?;
            let mut cols: Vec<String> = idx_stmt
                .query_map([], |row| row.get::<_, String>(2))?
                .collect::<Result<Vec<_>, _>>()?;
            cols.sort();
            unique_column_sets.push(cols);
        }

        for expected_columns in self.unique_constraints {
            let mut expected_sorted: Vec<&str> = expected_columns.to_vec();
            expected_sorted.sort();

            let found = unique_column_sets
                .iter()
                .any(|actual| actual.iter().map(String::as_str).eq(expected_sorted.iter().copied()));

            if !found {
                bail!(
                    "Table {} is missing unique constraint on columns ({})",
                    self.name,
                    expected_columns.join(", ")
                );
            }
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    /// Drops every table of this schema, in reverse declaration order.
    pub fn drop(&self, conn: &Connection) -> Result<()> {
        for table in self.tables.iter().rev() {
            table.drop(conn)?;
        }
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate_columns(conn)?;
            table.validate_indices(conn)?;
            table.validate_unique_constraints(conn)?;
        }
        Ok(())
    }
}
