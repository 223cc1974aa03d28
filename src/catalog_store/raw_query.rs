//! Unchecked SQL pass-through for debugging.

use super::error::CatalogResult;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Map, Number, Value};

pub type RawRow = Map<String, Value>;

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
    }
}

/// Executes a single SQL statement and returns its rows keyed by column
/// name. Statements producing no columns return an empty list.
pub fn run_query(conn: &Connection, sql: &str) -> CatalogResult<Vec<RawRow>> {
    let mut stmt = conn.prepare(sql)?;

    if stmt.column_count() == 0 {
        stmt.execute([])?;
        return Ok(Vec::new());
    }

    let column_names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut mapped = Map::with_capacity(column_names.len());
        for (index, name) in column_names.iter().enumerate() {
            mapped.insert(name.clone(), json_value(row.get_ref(index)?));
        }
        result.push(mapped);
    }
    Ok(result)
}
