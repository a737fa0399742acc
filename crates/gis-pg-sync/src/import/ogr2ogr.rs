//! GDAL `ogr2ogr` importer.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::{BulkImporter, ImportRequest};
use crate::config::ImportConfig;
use crate::core::identifier::quote_conninfo;
use crate::error::{MigrateError, Result};

/// Runs `ogr2ogr` once per layer.
#[derive(Debug, Clone)]
pub struct Ogr2OgrImporter {
    program: PathBuf,
    geometry_column: String,
    promote_to_multi: bool,
    spatial_index: bool,
    extra_args: Vec<String>,
}

impl Ogr2OgrImporter {
    pub fn new(config: &ImportConfig, geometry_column: &str) -> Self {
        Self {
            program: config.program.clone(),
            geometry_column: geometry_column.to_string(),
            promote_to_multi: config.promote_to_multi,
            spatial_index: config.spatial_index,
            extra_args: config.extra_args.clone(),
        }
    }

    /// Command line arguments for one import. The password is not among them.
    pub fn build_args(&self, request: &ImportRequest) -> Vec<OsString> {
        let conn = &request.connection;
        let pg = format!(
            "PG:host={} port={} dbname={} user={} active_schema={}",
            quote_conninfo(&conn.host),
            conn.port,
            quote_conninfo(&conn.database),
            quote_conninfo(&conn.user),
            quote_conninfo(&conn.schema),
        );

        let mut args: Vec<OsString> = vec![
            "--config".into(),
            "PG_USE_COPY".into(),
            "YES".into(),
            "-f".into(),
            "PostgreSQL".into(),
            pg.into(),
            request.input.clone().into_os_string(),
            "-nln".into(),
            format!("{}.{}", conn.schema, request.table).into(),
            "-lco".into(),
            format!("GEOMETRY_NAME={}", self.geometry_column).into(),
            "-lco".into(),
            "FID=id".into(),
            "-lco".into(),
            "DIM=2".into(),
        ];

        if request.overwrite {
            args.push("-overwrite".into());
        }
        if self.promote_to_multi {
            args.push("-nlt".into());
            args.push("PROMOTE_TO_MULTI".into());
        }
        args.push("-lco".into());
        args.push(
            if self.spatial_index {
                "SPATIAL_INDEX=GIST"
            } else {
                "SPATIAL_INDEX=NONE"
            }
            .into(),
        );
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

#[async_trait]
impl BulkImporter for Ogr2OgrImporter {
    async fn import(&self, request: &ImportRequest) -> Result<()> {
        let args = self.build_args(request);
        debug!(
            "{}: {} {:?}",
            request.layer,
            self.program.display(),
            args
        );

        let output = Command::new(&self.program)
            .args(&args)
            .env("PGPASSWORD", &request.connection.password)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                MigrateError::import(
                    &request.layer,
                    format!("failed to start {}: {}", self.program.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MigrateError::import(
                &request.layer,
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ogr2ogr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;

    fn request(overwrite: bool) -> ImportRequest {
        ImportRequest {
            layer: "My_Roads".into(),
            input: PathBuf::from("/data/My Roads.shp"),
            table: "My_Roads".into(),
            overwrite,
            connection: ConnectionConfig::new("localhost", 5432, "gis", "postgres", "hunter2"),
        }
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_build_args_defaults() {
        let importer = Ogr2OgrImporter::new(&ImportConfig::default(), "geom");
        let args = strings(&importer.build_args(&request(true)));

        assert_eq!(&args[3..5], ["-f", "PostgreSQL"]);
        assert_eq!(
            args[5],
            "PG:host='localhost' port=5432 dbname='gis' user='postgres' active_schema='public'"
        );
        assert_eq!(args[6], "/data/My Roads.shp");
        let nln = args.iter().position(|a| a == "-nln").unwrap();
        assert_eq!(args[nln + 1], "public.My_Roads");
        assert!(args.contains(&"GEOMETRY_NAME=geom".to_string()));
        assert!(args.contains(&"FID=id".to_string()));
        assert!(args.contains(&"-overwrite".to_string()));
        assert!(args.contains(&"PROMOTE_TO_MULTI".to_string()));
        assert!(args.contains(&"SPATIAL_INDEX=GIST".to_string()));
    }

    #[test]
    fn test_build_args_never_contains_password() {
        let importer = Ogr2OgrImporter::new(&ImportConfig::default(), "geom");
        let args = strings(&importer.build_args(&request(true)));
        assert!(args.iter().all(|a| !a.contains("hunter2")));
    }

    #[test]
    fn test_build_args_respects_flags() {
        let config = ImportConfig {
            promote_to_multi: false,
            spatial_index: false,
            extra_args: vec!["-skipfailures".into()],
            ..ImportConfig::default()
        };
        let importer = Ogr2OgrImporter::new(&config, "the_geom");
        let args = strings(&importer.build_args(&request(false)));

        assert!(!args.contains(&"-overwrite".to_string()));
        assert!(!args.contains(&"PROMOTE_TO_MULTI".to_string()));
        assert!(args.contains(&"SPATIAL_INDEX=NONE".to_string()));
        assert!(args.contains(&"GEOMETRY_NAME=the_geom".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("-skipfailures"));
    }

    #[tokio::test]
    async fn test_missing_program_is_import_error() {
        let config = ImportConfig {
            program: PathBuf::from("/nonexistent/ogr2ogr-missing"),
            ..ImportConfig::default()
        };
        let importer = Ogr2OgrImporter::new(&config, "geom");
        let err = importer.import(&request(true)).await.unwrap_err();
        assert!(matches!(err, MigrateError::Import { ref layer, .. } if layer == "My_Roads"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_import_error() {
        let config = ImportConfig {
            program: PathBuf::from("false"),
            ..ImportConfig::default()
        };
        let importer = Ogr2OgrImporter::new(&config, "geom");
        let err = importer.import(&request(true)).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("exit status: 1"));
    }
}
