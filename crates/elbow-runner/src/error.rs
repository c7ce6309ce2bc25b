//! Error kinds for cases, the setup chain and suite construction

use elbow_core::{LoadError, UnsupportedMethod};

/// Failure of a single test case. Never aborts sibling cases.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error(transparent)]
    UnsupportedMethod(#[from] UnsupportedMethod),
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error("Invalid legacy params: {0}")]
    InvalidParams(String),
    #[error("No response from {url}: {message}")]
    Transport { url: String, message: String },
    #[error("Schema compilation failed: {0}")]
    SchemaCompilation(String),
    #[error("Response failed validation ({} errors)", errors.len())]
    Validation { errors: Vec<String> },
}

impl CaseError {
    /// Structured validator errors carried by [`CaseError::Validation`].
    #[must_use]
    pub fn validation_errors(&self) -> &[String] {
        match self {
            Self::Validation { errors } => errors,
            _ => &[],
        }
    }
}

/// Failure of the setup chain. Fatal to the whole suite.
#[derive(Debug, thiserror::Error)]
pub enum SetupChainError {
    #[error("Cannot load setup schemas: {0}")]
    Load(#[from] LoadError),
    #[error("Setup schema {step} declares no methods")]
    NoMethods { step: String },
    #[error("Setup step {step} failed: {source}")]
    Step {
        step: String,
        #[source]
        source: CaseError,
    },
}

/// Suite construction failure; no cases are registered.
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("HTTP client error: {0}")]
    Client(String),
}
