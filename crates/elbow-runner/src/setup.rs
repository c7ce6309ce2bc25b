//! Setup chain: ordered requests run once before the suite
//!
//! Schemas come from the `setup/` subdirectory of the schema directory and
//! run strictly one after another, first declared method only. The first
//! failure stops the chain.

use std::path::Path;

use crate::error::SetupChainError;
use crate::executor::SuiteContext;

/// Subdirectory of the schema directory holding setup schemas.
pub const SETUP_DIR: &str = "setup";

/// Run the setup chain against `before_base_url` (or `base_url` if unset).
///
/// Exports land in the context's variable bag, so the main suite sees them.
///
/// # Errors
///
/// Returns [`SetupChainError`] if the setup directory cannot be loaded or any
/// step fails; later steps are not attempted.
pub fn run_setup(
    ctx: &SuiteContext,
    schema_dir: &Path,
    base_url: &str,
) -> Result<(), SetupChainError> {
    let options = ctx.options();
    let schemas = elbow_core::load(&schema_dir.join(SETUP_DIR), options.extensions.as_slice())?;
    let base_url = options.before_base_url.as_deref().unwrap_or(base_url);

    tracing::info!(steps = schemas.len(), %base_url, "running setup chain");
    for schema in &schemas {
        let Some(method) = schema.methods.first() else {
            return Err(SetupChainError::NoMethods {
                step: schema.filepath.display().to_string(),
            });
        };
        let step = options.label_for(method, schema);
        tracing::info!(%step, "setup step");
        ctx.execute(base_url, method, schema)
            .map_err(|source| SetupChainError::Step { step, source })?;
    }
    Ok(())
}
