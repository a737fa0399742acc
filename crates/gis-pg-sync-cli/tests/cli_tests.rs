//! CLI integration tests for gis-pg-sync.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for the failure paths that need no database.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command for the gis-pg-sync binary.
fn cmd() -> Command {
    Command::cargo_bin("gis-pg-sync").unwrap()
}

const VARIABLES: &str = r#"variables:
  host: 127.0.0.1
  port: "1"
  dbname: gis
  user: postgres
  password: secret
"#;

fn shp_layer(id: &str, name: &str) -> String {
    format!(
        r#"  - id: {id}
    name: {name}
    source: /data/{id}.shp
    provider: ogr
    kind: {{ type: vector, spatial: true }}
    styles: {{ current: default, variants: {{ default: "<qgis/>" }} }}
"#
    )
}

/// Write a project document into a fresh directory.
fn project(variables: bool, layers: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.yaml");
    let mut yaml = String::new();
    if variables {
        yaml.push_str(VARIABLES);
    }
    yaml.push_str("layers:\n");
    for (id, name) in layers {
        yaml.push_str(&shp_layer(id, name));
    }
    yaml.push_str(
        r#"  - id: dem
    name: dem
    source: /data/dem.tif
    provider: gdal
    kind: { type: raster }
"#,
    );
    std::fs::write(&path, yaml).unwrap();
    (dir, path)
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("hook"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("repair-styles"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_hook_subcommand_lists_events() {
    cmd()
        .args(["hook", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("open"))
        .stdout(predicate::str::contains("save"))
        .stdout(predicate::str::contains("close"));
}

#[test]
fn test_hook_rejects_unknown_event() {
    cmd()
        .args(["hook", "reload"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gis-pg-sync"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_project_default_path() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--project"))
        .stdout(predicate::str::contains("[default: project.yaml]"));
}

#[test]
fn test_output_json_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_project_exits_with_code_7() {
    cmd()
        .args(["--project", "nonexistent_project.yaml", "classify"])
        .assert()
        .code(7); // EXIT_IO_ERROR - file not found
}

#[test]
fn test_missing_config_exits_with_code_7() {
    let (_dir, path) = project(true, &[]);
    cmd()
        .args(["--config", "nonexistent_config_file.yaml"])
        .args(["--project", path_str(&path), "classify"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_config_exits_with_code_1() {
    let (_dir, path) = project(true, &[]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", path_str(file.path())])
        .args(["--project", path_str(&path), "classify"])
        .assert()
        .code(1); // EXIT_CONFIG_ERROR
}

#[test]
fn test_invalid_connection_config_exits_with_code_1() {
    let (_dir, path) = project(true, &[]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "connection: {{ host: '', dbname: gis, user: u, password: p }}").unwrap();

    cmd()
        .args(["--config", path_str(file.path())])
        .args(["--project", path_str(&path), "classify"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_project_variables_exit_with_code_1() {
    let (_dir, path) = project(false, &[("roads", "Roads")]);
    cmd()
        .args(["--project", path_str(&path), "run", "--dry-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("project variable"));
}

#[test]
fn test_duplicate_names_exit_with_code_3_and_leave_project() {
    let (_dir, path) = project(true, &[("a", "Roads"), ("b", "Roads"), ("c", "Rivers")]);
    let before = std::fs::read_to_string(&path).unwrap();

    cmd()
        .args(["--project", path_str(&path), "run"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Non-unique layer names in project: Roads"));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_unreachable_database_exits_with_code_2() {
    let (_dir, path) = project(true, &[("roads", "My Roads")]);
    let before = std::fs::read_to_string(&path).unwrap();

    cmd()
        .args(["--project", path_str(&path), "run"])
        .assert()
        .code(2);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_health_check_unreachable_exits_with_code_2() {
    let (_dir, path) = project(true, &[]);
    cmd()
        .args(["--project", path_str(&path), "health-check"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("FAILED"));
}

// =============================================================================
// Offline Commands
// =============================================================================

#[test]
fn test_classify_lists_buckets() {
    let (_dir, path) = project(false, &[("roads", "My Roads")]);
    cmd()
        .args(["--project", path_str(&path), "classify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Local vector: My Roads"))
        .stdout(predicate::str::contains("Local raster: dem"));
}

#[test]
fn test_classify_output_json() {
    let (_dir, path) = project(false, &[("roads", "My Roads")]);
    let output = cmd()
        .args(["--output-json", "--project", path_str(&path), "classify"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["vector_local"], serde_json::json!(["My Roads"]));
    assert_eq!(json["raster_local"], serde_json::json!(["dem"]));
    assert_eq!(json["vector_db"], serde_json::json!([]));
}

#[test]
fn test_dry_run_shows_plan_without_changes() {
    let (_dir, path) = project(true, &[("roads", "My Roads")]);
    let before = std::fs::read_to_string(&path).unwrap();

    cmd()
        .args(["--project", path_str(&path), "run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rename: My Roads -> My_Roads"))
        .stdout(predicate::str::contains("Import: My_Roads (/data/roads.shp) -> my_roads"))
        .stdout(predicate::str::contains("Target group: Postgres-layers"));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_dry_run_reports_duplicates() {
    let (_dir, path) = project(true, &[("a", "land use"), ("b", "land-use")]);
    cmd()
        .args(["--project", path_str(&path), "run", "--dry-run"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("land_use"));
}

#[test]
fn test_dry_run_reports_layers_sharing_a_table() {
    let (_dir, path) = project(true, &[("a", "Roads"), ("b", "roads")]);
    cmd()
        .args(["--project", path_str(&path), "run", "--dry-run"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Non-unique names: [\"Roads\", \"roads\"]"));
}

#[test]
fn test_disabled_hook_is_noop() {
    let (_dir, path) = project(true, &[("roads", "My Roads")]);
    let before = std::fs::read_to_string(&path).unwrap();

    cmd()
        .args(["--project", path_str(&path), "hook", "open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hook 'open' is disabled"));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

// =============================================================================
// No Subcommand Tests
// =============================================================================

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
