//! Identifier normalization, validation and quoting.
//!
//! Layer names double as PostgreSQL table names once a layer is imported, so
//! they are normalized before anything touches the database. Schema and table
//! names cannot be passed as statement parameters; everything spliced into
//! SQL text goes through [`quote_pg`] / [`qualify_pg`] first, and every value
//! goes through a `$n` parameter.

use crate::error::{MigrateError, Result};

/// PostgreSQL truncates identifiers beyond 63 bytes (NAMEDATALEN - 1).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Rewrite a layer name so it is usable as a table name.
///
/// Spaces and hyphens become underscores; everything else is kept as is.
pub fn normalize_layer_name(name: &str) -> String {
    name.replace([' ', '-'], "_")
}

/// Table name an imported layer lands in.
///
/// The import tool launders names to lower case.
pub fn table_name_for(layer_name: &str) -> String {
    layer_name.to_lowercase()
}

/// Check that `name` can be used as a table, schema or column name.
///
/// Fails on an empty name, an embedded NUL, or a name longer than
/// [`MAX_IDENTIFIER_LENGTH`] bytes, which the server would truncate.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config("empty database identifier".to_string()));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "database identifier {:?} has a null byte",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "database identifier {:?} is {} bytes, PostgreSQL allows {}",
            name,
            name.len(),
            MAX_IDENTIFIER_LENGTH
        )));
    }

    Ok(())
}

/// Double-quoted form of `name` for SQL text, with inner `"` doubled.
///
/// ```ignore
/// assert_eq!(quote_pg("layer_styles")?, "\"layer_styles\"");
/// ```
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// `"schema"."table"`, both parts checked and quoted.
pub fn qualify_pg(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_pg(schema)?, quote_pg(table)?))
}

/// Quote a value for a libpq `key=value` connection string.
///
/// Values are wrapped in single quotes with `\` and `'` backslash-escaped.
pub fn quote_conninfo(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}
