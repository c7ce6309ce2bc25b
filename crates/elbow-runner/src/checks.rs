//! Response checks: status code, then body against the schema
//!
//! Every check either produces an error message or documents why it was
//! skipped. Compilation failures are not check results; they abort the case.

use elbow_core::{Method, Schema};
use serde_json::Value;

use crate::error::CaseError;
use crate::validate::SchemaValidator;

/// Input for response checks: response data plus the validator.
pub(crate) struct CheckInput<'a> {
    pub(crate) method: Method,
    pub(crate) schema: &'a Schema,
    pub(crate) status_code: u16,
    pub(crate) body: &'a Value,
    pub(crate) validator: &'a SchemaValidator,
}

/// Run both checks and collect every failure message.
///
/// # Errors
///
/// Returns [`CaseError::SchemaCompilation`] if the schema cannot be compiled.
pub(crate) fn run_checks(input: &CheckInput) -> Result<Vec<String>, CaseError> {
    let mut errors = Vec::new();

    // ── Check 1: declared status ──
    if let Some(expected) = input.schema.status {
        if expected != input.status_code {
            errors.push(format!(
                "expected status {expected}, got {}",
                input.status_code
            ));
        }
    }

    // ── Check 2: body vs JSON Schema ──
    // HEAD responses have no body to validate.
    if input.method != Method::Head {
        let compiled = input.validator.compile(input.schema)?;
        errors.extend(SchemaValidator::validate(&compiled, input.body));
    }

    Ok(errors)
}

/// Parse a response body: JSON when possible, raw text otherwise, null if empty.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
