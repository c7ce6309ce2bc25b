//! Request execution and the per-run context
//!
//! One [`SuiteContext`] exists per suite run. It owns the HTTP client, the
//! validator cache and the variable bag. Exports written by a case are seen
//! by every case that starts after it completes; the bag sits behind a mutex
//! so runners that execute cases on several threads stay sound, but the
//! ordering contract only holds for cases that do not overlap.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use elbow_core::{Method, Options, Schema, Vars};
use serde_json::Value;

use crate::checks::{CheckInput, parse_body, run_checks};
use crate::error::{CaseError, SuiteError};
use crate::request::{PreparedRequest, prepare, transport_method};
use crate::validate::SchemaValidator;

/// A completed request/response pair that passed all checks.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub url: String,
    pub status_code: u16,
    pub body: Value,
    pub elapsed_ms: u64,
}

/// Shared state of one suite run.
pub struct SuiteContext {
    options: Options,
    vars: Mutex<Vars>,
    client: reqwest::blocking::Client,
    validator: SchemaValidator,
}

impl SuiteContext {
    /// Create a context; the variable bag starts as a copy of `options.vars`.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Client`] if the HTTP client cannot be built.
    pub fn new(options: Options) -> Result<Self, SuiteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout())
            .build()
            .map_err(|e| SuiteError::Client(e.to_string()))?;

        Ok(Self {
            vars: Mutex::new(options.vars.clone()),
            validator: SchemaValidator::new(client.clone()),
            client,
            options,
        })
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Snapshot of the variable bag.
    #[must_use]
    pub fn vars(&self) -> Vars {
        self.lock_vars().clone()
    }

    fn lock_vars(&self) -> MutexGuard<'_, Vars> {
        self.vars.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one `(method, schema)` case against `base_url`.
    ///
    /// Expands and builds the request, sends it, checks status and body, and
    /// on success copies the schema's `export` values into the variable bag.
    ///
    /// # Errors
    ///
    /// Any [`CaseError`]: unsupported method, bad URL or params, no response,
    /// schema compilation failure, or failed checks.
    pub fn execute(
        &self,
        base_url: &str,
        method: &str,
        schema: &Schema,
    ) -> Result<Exchange, CaseError> {
        let method: Method = method.parse()?;
        tracing::debug!(%method, endpoint = %schema.endpoint, "making request");

        let request = {
            let vars = self.lock_vars();
            prepare(base_url, method, schema, &self.options, &vars)?
        };
        let exchange = self.dispatch(&request)?;

        tracing::debug!(
            url = %exchange.url,
            status = exchange.status_code,
            "validating response"
        );
        let errors = run_checks(&CheckInput {
            method,
            schema,
            status_code: exchange.status_code,
            body: &exchange.body,
            validator: &self.validator,
        })?;
        if !errors.is_empty() {
            return Err(CaseError::Validation { errors });
        }

        self.export(schema, &exchange.body);
        Ok(exchange)
    }

    fn dispatch(&self, request: &PreparedRequest) -> Result<Exchange, CaseError> {
        let transport = |e: reqwest::Error| CaseError::Transport {
            url: request.url.clone(),
            message: e.to_string(),
        };

        let mut req = self
            .client
            .request(transport_method(request.method), &request.url);
        for (k, v) in &request.headers {
            req = req.header(k, v);
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let start = Instant::now();
        let resp = req.send().map_err(transport)?;
        let status_code = resp.status().as_u16();
        let text = resp.text().map_err(transport)?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(Exchange {
            url: request.url.clone(),
            status_code,
            body: parse_body(&text),
            elapsed_ms,
        })
    }

    /// Copy every `export` entry out of `body`. Missing paths store `null`.
    fn export(&self, schema: &Schema, body: &Value) {
        if schema.export.is_empty() {
            return;
        }
        let mut vars = self.lock_vars();
        for (name, path) in &schema.export {
            let value = lookup_path(body, path).cloned().unwrap_or(Value::Null);
            if value.is_null() {
                tracing::warn!(variable = %name, path = %path, "export path not found in response");
            }
            vars.set(name.clone(), value);
        }
    }
}

/// Read `path` out of `body`.
///
/// Dotted paths walk objects by key and arrays by index (`items.0.id`); a
/// path starting with `/` is an RFC 6901 JSON pointer. An empty path is the
/// whole body.
#[must_use]
pub fn lookup_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    if path.starts_with('/') {
        return body.pointer(path);
    }
    if path.is_empty() {
        return Some(body);
    }
    path.split('.').try_fold(body, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_dotted_paths() {
        let body = json!({
            "token": "abc",
            "setup": {"token": "setup1"},
            "items": [{"id": 7}, {"id": 8}]
        });
        assert_eq!(lookup_path(&body, "token"), Some(&json!("abc")));
        assert_eq!(lookup_path(&body, "setup.token"), Some(&json!("setup1")));
        assert_eq!(lookup_path(&body, "items.1.id"), Some(&json!(8)));
        assert_eq!(lookup_path(&body, "items.x"), None);
        assert_eq!(lookup_path(&body, "missing.deeper"), None);
        assert_eq!(lookup_path(&body, "token.length"), None);
        assert_eq!(lookup_path(&body, ""), Some(&body));
    }

    #[test]
    fn lookup_json_pointer() {
        let body = json!({"a.b": {"c": [1, 2]}});
        assert_eq!(lookup_path(&body, "/a.b/c/0"), Some(&json!(1)));
        assert_eq!(lookup_path(&body, "a.b"), None);
    }

    #[test]
    fn export_writes_values_and_nulls() {
        let ctx = SuiteContext::new(Options::default()).unwrap();
        let schema = Schema::from_document(
            json!({"export": {"sessionToken": "token", "gone": "nope"}}),
            std::path::PathBuf::from("/s/e.json"),
        )
        .unwrap();

        ctx.export(&schema, &json!({"token": "abc"}));

        let vars = ctx.vars();
        assert_eq!(vars.get("sessionToken").as_deref(), Some("abc"));
        assert_eq!(vars.raw("gone"), Some(&Value::Null));
    }

    #[test]
    fn vars_seeded_from_options() {
        let mut options = Options::default();
        options.vars.set("user", "mugo");
        let ctx = SuiteContext::new(options).unwrap();
        assert_eq!(ctx.vars().get("user").as_deref(), Some("mugo"));
    }

    #[test]
    fn unsupported_method_fails_before_any_request() {
        let ctx = SuiteContext::new(Options::default()).unwrap();
        let schema = Schema::from_document(
            json!({"endpoint": "/x", "methods": ["patch"]}),
            std::path::PathBuf::from("/s/p.json"),
        )
        .unwrap();
        // Port 9 (discard) is never contacted: the method is rejected first.
        let err = ctx.execute("http://127.0.0.1:9", "patch", &schema).unwrap_err();
        assert!(matches!(err, CaseError::UnsupportedMethod(_)));
    }
}
