//! elbow-runner: Request execution and suite assembly
//!
//! Builds requests from schema records, sends them with reqwest, validates
//! responses with jsonschema, and registers one test case per
//! (schema, method) pair with a runner.

mod checks;
pub mod error;
pub mod executor;
pub mod request;
pub mod setup;
pub mod suite;
pub mod validate;

pub use error::{CaseError, SetupChainError, SuiteError};
pub use executor::{Exchange, SuiteContext, lookup_path};
pub use setup::run_setup;
pub use suite::{CaseFn, HookFn, Registrar, SerialRunner, build_suite};
pub use validate::SchemaValidator;
