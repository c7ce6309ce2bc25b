//! Suite configuration
//!
//! [`Options`] is the run-scoped configuration handed to the suite builder;
//! [`Config`] adds the base URL and schema directory so a whole run can be
//! described in one file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::loader::DEFAULT_EXTENSIONS;
use crate::schema::{Fields, Schema};
use crate::vars::Vars;

/// Custom test case label: `(method as declared, schema) -> label`.
#[derive(Clone)]
pub struct LabelFn(Arc<dyn Fn(&str, &Schema) -> String + Send + Sync>);

impl LabelFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &Schema) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn call(&self, method: &str, schema: &Schema) -> String {
        (self.0)(method, schema)
    }
}

impl std::fmt::Debug for LabelFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LabelFn")
    }
}

/// Run-scoped options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Per-case deadline in milliseconds (none by default)
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Custom label for test cases (defaults to [`Schema::label`])
    #[serde(skip)]
    pub label: Option<LabelFn>,

    /// Headers sent with every request, overridden by schema headers
    #[serde(default)]
    pub headers: Fields,

    /// Query parameters sent with every request, overridden by schema query
    #[serde(default)]
    pub query: Fields,

    /// Body fields sent with every body request, overridden by schema body
    #[serde(default)]
    pub body: Fields,

    /// Initial variable bag
    #[serde(default)]
    pub vars: Vars,

    /// File extensions treated as schema files (default: json)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Run the `setup/` chain once before the suite
    #[serde(default)]
    pub before: bool,

    /// Base URL for the setup chain (defaults to the suite base URL)
    #[serde(default)]
    pub before_base_url: Option<String>,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            label: None,
            headers: Fields::new(),
            query: Fields::new(),
            body: Fields::new(),
            vars: Vars::new(),
            extensions: default_extensions(),
            before: false,
            before_base_url: None,
        }
    }
}

impl Options {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Label for one (method, schema) test case.
    #[must_use]
    pub fn label_for(&self, method: &str, schema: &Schema) -> String {
        match &self.label {
            Some(label) => label.call(method, schema),
            None => schema.label(method),
        }
    }

    #[must_use]
    pub fn with_label<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Schema) -> String + Send + Sync + 'static,
    {
        self.label = Some(LabelFn::new(f));
        self
    }
}

/// Whole-run configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the server under test
    pub base_url: String,

    /// Directory holding schema files
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    #[serde(flatten)]
    pub options: Options,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schema")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            schema_dir: default_schema_dir(),
            options: Options::default(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.elbow.toml)
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but cannot be read or parsed
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".elbow.toml", ".elbow.json", "elbow.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Create example config file
    #[must_use]
    pub fn example() -> &'static str {
        r#"# elbow configuration

# Server under test
base_url = "http://localhost:8080"

# Directory of schema files (one endpoint contract per file)
schema_dir = "schema"

# Per-case timeout in milliseconds
# timeout_ms = 5000

# Extensions treated as schema files
# extensions = ["json", "yaml"]

# Run the schema_dir/setup chain once before the suite
# before = true
# before_base_url = "http://localhost:8081"

# Headers sent with every request (schema headers win on conflict)
[headers]
# Authorization = "Bearer ${API_TOKEN}"

# Query parameters sent with every request
[query]
# locale = "en"

# Body fields sent with every POST/PUT/DELETE request
[body]
# client = "elbow"

# Initial variables for ${name} placeholders
[vars]
# user_id = "1"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
