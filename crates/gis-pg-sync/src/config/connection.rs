//! Database connection parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MigrateError, Result};
use crate::project::ProjectHost;

/// PostgreSQL connection parameters for one synchronization run.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    #[serde(alias = "dbname")]
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Schema that receives imported tables (default: "public").
    #[serde(default = "default_public_schema")]
    pub schema: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: password.into(),
            schema: default_public_schema(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Read the connection from project variables `host`, `port`, `dbname`,
    /// `user`, `password` and the optional `schema`.
    pub fn from_environment(project: &dyn ProjectHost) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            match project.variable(name) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(MigrateError::Config(format!(
                    "project variable '{}' is not set",
                    name
                ))),
            }
        };

        let port_text = required("port")?;
        let port = port_text.trim().parse::<u16>().map_err(|_| {
            MigrateError::Config(format!(
                "project variable 'port' must be a port number, got '{}'",
                port_text
            ))
        })?;

        let mut config = Self::new(
            required("host")?,
            port,
            required("dbname")?,
            required("user")?,
            required("password")?,
        );
        if let Some(schema) = project.variable("schema").filter(|s| !s.trim().is_empty()) {
            config.schema = schema;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is set and the port is positive.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("connection.host", &self.host),
            ("connection.database", &self.database),
            ("connection.user", &self.user),
            ("connection.password", &self.password),
            ("connection.schema", &self.schema),
        ];
        for (name, value) in fields {
            if value.is_empty() {
                return Err(MigrateError::Config(format!("{} is required", name)));
            }
        }
        if self.port == 0 {
            return Err(MigrateError::Config(
                "connection.port must be a positive integer".into(),
            ));
        }
        Ok(())
    }

    /// Parameters in the shape the bulk import tool expects.
    pub fn dict_view(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("HOST", self.host.clone()),
            ("PORT", self.port.to_string()),
            ("USER", self.user.clone()),
            ("DBNAME", self.database.clone()),
            ("PASSWORD", self.password.clone()),
            ("SCHEMA", self.schema.clone()),
        ])
    }

    /// `host:port/database`, for log lines and error context.
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }

    /// Build a tokio-postgres configuration.
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&self.host);
        pg_config.port(self.port);
        pg_config.dbname(&self.database);
        pg_config.user(&self.user);
        pg_config.password(&self.password);
        pg_config.application_name("gis-pg-sync");
        pg_config
    }
}

fn default_pg_port() -> u16 {
    5432
}

fn default_public_schema() -> String {
    "public".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectDocument;

    fn project_with(vars: &[(&str, &str)]) -> ProjectDocument {
        vars.iter()
            .fold(ProjectDocument::default(), |doc, (k, v)| doc.with_variable(k, v))
    }

    fn full_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("host", "localhost"),
            ("port", "5432"),
            ("dbname", "gis"),
            ("user", "postgres"),
            ("password", "secret"),
        ]
    }

    #[test]
    fn test_from_environment() {
        let project = project_with(&full_vars());
        let config = ConnectionConfig::from_environment(&project).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "gis");
        assert_eq!(config.schema, "public");
    }

    #[test]
    fn test_from_environment_optional_schema() {
        let mut vars = full_vars();
        vars.push(("schema", "gis_data"));
        let config = ConnectionConfig::from_environment(&project_with(&vars)).unwrap();
        assert_eq!(config.schema, "gis_data");
    }

    #[test]
    fn test_from_environment_missing_variable() {
        let vars: Vec<_> = full_vars().into_iter().filter(|(k, _)| *k != "user").collect();
        let err = ConnectionConfig::from_environment(&project_with(&vars)).unwrap_err();
        assert!(matches!(err, MigrateError::Config(ref m) if m.contains("'user'")));
    }

    #[test]
    fn test_from_environment_non_numeric_port() {
        let vars: Vec<_> = full_vars()
            .into_iter()
            .map(|(k, v)| if k == "port" { (k, "fivefour") } else { (k, v) })
            .collect();
        let err = ConnectionConfig::from_environment(&project_with(&vars)).unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));
    }

    #[test]
    fn test_zero_port_rejected() {
        let config = ConnectionConfig::new("localhost", 0, "gis", "postgres", "secret");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dict_view() {
        let config = ConnectionConfig::new("db.local", 5433, "gis", "postgres", "secret");
        let view = config.dict_view();
        assert_eq!(view["HOST"], "db.local");
        assert_eq!(view["PORT"], "5433");
        assert_eq!(view["DBNAME"], "gis");
        assert_eq!(view["SCHEMA"], "public");
        assert_eq!(view.len(), 6);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ConnectionConfig::new("localhost", 5432, "gis", "postgres", "super_secret_123");
        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_123"));
    }
}
