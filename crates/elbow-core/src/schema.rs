//! Schema records: one HTTP endpoint contract per file
//!
//! The request-side fields (`endpoint`, `methods`, `headers`, ...) are read
//! into typed fields; the whole document is also kept verbatim because its
//! JSON Schema keywords describe the expected response body.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// String-keyed JSON object used for headers, query and body values.
pub type Fields = serde_json::Map<String, Value>;

/// Request-side fields of a schema document.
#[derive(Debug, Clone, Default, Deserialize)]
struct SchemaFields {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    methods: Vec<String>,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    headers: Fields,
    #[serde(default)]
    query: Fields,
    #[serde(default)]
    body: Fields,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    export: BTreeMap<String, String>,
}

/// A loaded endpoint contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    /// Path (or absolute URL) template, may contain `${var}` placeholders
    pub endpoint: String,
    pub description: String,
    /// Methods as declared; each produces one test case
    pub methods: Vec<String>,
    /// Expected response status (unchecked when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Fields::is_empty")]
    pub headers: Fields,
    #[serde(skip_serializing_if = "Fields::is_empty")]
    pub query: Fields,
    #[serde(skip_serializing_if = "Fields::is_empty")]
    pub body: Fields,
    /// Deprecated single bag attached via the method's channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Destination variable name → path into the response body
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub export: BTreeMap<String, String>,
    /// Absolute path of the file this schema was loaded from
    pub filepath: PathBuf,
    /// Full source document, validated against the response body
    #[serde(skip)]
    pub document: Value,
}

impl Schema {
    /// Build a schema from a parsed document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not an object or a known field has
    /// the wrong shape (e.g. `methods` is not a list of strings).
    pub fn from_document(document: Value, filepath: PathBuf) -> Result<Self, String> {
        if !document.is_object() {
            return Err("schema document must be an object".to_string());
        }
        let fields: SchemaFields =
            serde_json::from_value(document.clone()).map_err(|e| e.to_string())?;

        Ok(Self {
            endpoint: fields.endpoint.unwrap_or_default(),
            description: fields.description.unwrap_or_default(),
            methods: fields.methods,
            status: fields.status,
            headers: fields.headers,
            query: fields.query,
            body: fields.body,
            params: fields.params,
            export: fields.export,
            filepath,
            document,
        })
    }

    /// Default test case label: `"GET /path (description) [/abs/file.json]"`.
    #[must_use]
    pub fn label(&self, method: &str) -> String {
        format!(
            "{} {} ({}) [{}]",
            method.to_uppercase(),
            self.endpoint,
            self.description,
            self.filepath.display()
        )
    }
}
