//! Style handling: transplanting styles between layers and the shared
//! database style registry.
//!
//! - [`transplant`] copies the active style of a local layer onto its
//!   database shadow under a deterministic name and prunes everything else.
//! - [`registry::StyleRegistry`] maintains the database's `layer_styles` table.

pub mod postgres;
pub mod registry;

pub use postgres::{PgConnector, PgStyleRegistry};
pub use registry::{GeometryFamily, RegistryConnector, StyleRecord, StyleRegistry};

use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::project::Layer;

/// Name of the single style a shadow layer carries, e.g. `Style-My_Roads`.
pub fn managed_style_name(prefix: &str, layer_name: &str) -> String {
    format!("{}{}", prefix, layer_name)
}

/// Copy the active style of `source` onto `target`.
///
/// Afterwards `target` carries exactly one style, named after `source`, and
/// that style is active. Applying it again with the same source yields the
/// same result. Returns the managed style name.
pub fn transplant(source: &Layer, target: &mut Layer, prefix: &str) -> Result<String> {
    let body = source
        .styles
        .current_body()
        .ok_or_else(|| MigrateError::style(&source.name, "layer has no active style"))?
        .to_string();

    let style_name = managed_style_name(prefix, &source.name);
    let styles = &mut target.styles;

    if styles.contains(&style_name) {
        styles.remove_style(&style_name);
    }
    styles.add_style(&style_name, &body);
    styles.set_current_style(&style_name);
    styles.retain_only(&style_name);

    debug!(
        "Transplanted style '{}' from {} onto {}",
        style_name, source.id, target.id
    );
    Ok(style_name)
}
