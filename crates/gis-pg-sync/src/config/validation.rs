//! Configuration validation.

use super::Config;
use crate::core::identifier::validate_identifier;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if let Some(connection) = &config.connection {
        connection.validate()?;
        validate_identifier(&connection.schema)
            .map_err(|e| MigrateError::Config(format!("connection.schema: {}", e)))?;
    }

    let migration = &config.migration;
    if migration.group_name.trim().is_empty() {
        return Err(MigrateError::Config(
            "migration.group_name is required".into(),
        ));
    }
    if migration.style_prefix.is_empty() {
        return Err(MigrateError::Config(
            "migration.style_prefix is required".into(),
        ));
    }
    validate_identifier(&migration.geometry_column)
        .map_err(|e| MigrateError::Config(format!("migration.geometry_column: {}", e)))?;
    validate_identifier(&migration.style_table)
        .map_err(|e| MigrateError::Config(format!("migration.style_table: {}", e)))?;

    if config.import.program.as_os_str().is_empty() {
        return Err(MigrateError::Config("import.program is required".into()));
    }

    Ok(())
}
