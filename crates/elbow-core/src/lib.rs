//! elbow-core: Schema records and pure logic for schema-driven API tests
//!
//! This crate loads endpoint contracts from disk, holds the run-scoped
//! configuration and variable bag, expands `${name}` placeholders and maps
//! declared HTTP methods to their parameter channel. It performs no HTTP.

pub mod config;
pub mod expand;
pub mod loader;
pub mod method;
pub mod report;
pub mod schema;
pub mod vars;

pub use config::{Config, ConfigError, LabelFn, Options};
pub use expand::{Expanded, expand, expand_fields, expand_value, expand_with};
pub use loader::{DEFAULT_EXTENSIONS, LoadError, load, load_file};
pub use method::{Attachment, Method, UnsupportedMethod};
pub use report::{CaseReport, CaseStatus, SuiteReport};
pub use schema::{Fields, Schema};
pub use vars::{Vars, value_to_param_string};

/// Load the schemas in `dir` using the extensions configured in `options`.
///
/// Read-only introspection, used by the `list` command.
///
/// # Errors
///
/// Returns [`LoadError`] on the first directory or file failure.
pub fn list_schemas(dir: &std::path::Path, options: &Options) -> Result<Vec<Schema>, LoadError> {
    load(dir, options.extensions.as_slice())
}
