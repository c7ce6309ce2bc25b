//! JSON Schema compilation and validation
//!
//! Remote `$ref`s are fetched with a blocking HTTP GET. Compiled validators
//! are cached per schema file for the lifetime of one suite run. Documents
//! without a `$schema` keyword are read as draft-04; a declared `$schema`
//! selects its own draft.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use elbow_core::Schema;
use jsonschema::{Draft, Retrieve, Uri, Validator};
use serde_json::Value;

use crate::error::CaseError;

/// Errors kept per failed validation; a broken schema can produce hundreds.
const MAX_VALIDATION_ERRORS: usize = 20;

/// Draft assumed when a document does not declare `$schema`.
const DEFAULT_DRAFT: Draft = Draft::Draft4;

/// Resolves remote `$ref` URIs over HTTP.
struct HttpRetriever {
    client: reqwest::blocking::Client,
}

impl Retrieve for HttpRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(uri = %uri, "fetching remote schema");
        let resp = self.client.get(uri.as_str()).send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(format!("GET {uri} returned {}: {text}", status.as_u16()).into());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Compiles schema documents and validates response bodies.
pub struct SchemaValidator {
    client: reqwest::blocking::Client,
    cache: Mutex<HashMap<PathBuf, Arc<Validator>>>,
}

impl SchemaValidator {
    #[must_use]
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Compile `schema.document`, reusing an earlier compilation of the same file.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::SchemaCompilation`] if the document is not a valid
    /// JSON Schema or a remote reference cannot be retrieved.
    pub fn compile(&self, schema: &Schema) -> Result<Arc<Validator>, CaseError> {
        if let Some(hit) = self.cached(schema) {
            return Ok(hit);
        }

        let retriever = HttpRetriever {
            client: self.client.clone(),
        };
        let compiled = if schema.document.get("$schema").is_some() {
            jsonschema::options()
                .with_retriever(retriever)
                .build(&schema.document)
        } else {
            jsonschema::options()
                .with_draft(DEFAULT_DRAFT)
                .with_retriever(retriever)
                .build(&schema.document)
        };
        let validator = compiled.map_err(|e| CaseError::SchemaCompilation(e.to_string()))?;
        let validator = Arc::new(validator);

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(schema.filepath.clone(), Arc::clone(&validator));
        Ok(validator)
    }

    fn cached(&self, schema: &Schema) -> Option<Arc<Validator>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&schema.filepath)
            .cloned()
    }

    /// Validate `body`; an empty list means it conforms.
    #[must_use]
    pub fn validate(validator: &Validator, body: &Value) -> Vec<String> {
        validator
            .iter_errors(body)
            .take(MAX_VALIDATION_ERRORS)
            .map(|e| e.to_string())
            .collect()
    }
}
