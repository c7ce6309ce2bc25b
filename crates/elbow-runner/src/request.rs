//! Request construction: URL joining, field merging and expansion
//!
//! No I/O. Produces a [`PreparedRequest`] ready to hand to the transport.

use elbow_core::{Attachment, Fields, Method, Options, Schema, Vars, expand, expand_fields};
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::error::CaseError;

/// A fully resolved request.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// JSON body, only for body-attachment methods
    pub body: Option<Value>,
}

/// Transport-level method for a declared method.
#[must_use]
pub fn transport_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
    }
}

/// Build the request for `(method, schema)` against `base_url`.
///
/// Schema-level headers/query/body override the suite defaults in `options`;
/// each merged map is then expanded against `vars`. A legacy `params` object
/// is merged last into the method's attachment channel and wins on conflict.
///
/// # Errors
///
/// Returns [`CaseError::InvalidUrl`] if the URL cannot be built and
/// [`CaseError::InvalidParams`] if `params` is not an object.
pub fn prepare(
    base_url: &str,
    method: Method,
    schema: &Schema,
    options: &Options,
    vars: &Vars,
) -> Result<PreparedRequest, CaseError> {
    let endpoint = expand(&schema.endpoint, vars);
    let url = join_url(base_url, &endpoint)?;

    let mut headers = merged(&options.headers, &schema.headers);
    let mut query = merged(&options.query, &schema.query);
    let mut body = merged(&options.body, &schema.body);
    expand_fields(&mut headers, vars);
    expand_fields(&mut query, vars);
    expand_fields(&mut body, vars);

    if let Some(params) = &schema.params {
        tracing::warn!(
            schema = %schema.filepath.display(),
            "`params` is deprecated, use `query` or `body` instead"
        );
        let Value::Object(params) = params else {
            return Err(CaseError::InvalidParams(format!(
                "expected an object in {}, got {params}",
                schema.filepath.display()
            )));
        };
        let channel = match method.attachment() {
            Attachment::Query => &mut query,
            Attachment::Body => &mut body,
        };
        for (k, v) in params {
            channel.insert(k.clone(), v.clone());
        }
    }

    let body = match method.attachment() {
        Attachment::Body => Some(Value::Object(body)),
        Attachment::Query => {
            if !body.is_empty() {
                tracing::debug!(%method, "body fields ignored for query-attachment method");
            }
            None
        }
    };

    Ok(PreparedRequest {
        method,
        url: url.into(),
        headers: header_pairs(&headers),
        query: to_pairs(&query),
        body,
    })
}

/// `defaults` overridden by `overrides`.
fn merged(defaults: &Fields, overrides: &Fields) -> Fields {
    let mut out = defaults.clone();
    for (k, v) in overrides {
        out.insert(k.clone(), v.clone());
    }
    out
}

/// Join base and endpoint as if the base always ended in `/`.
///
/// An endpoint that is already an absolute http(s) URL is used as-is.
fn join_url(base_url: &str, endpoint: &str) -> Result<Url, CaseError> {
    let invalid = |url: &str, e: url::ParseError| CaseError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    };

    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return Url::parse(endpoint).map_err(|e| invalid(endpoint, e));
    }

    let base = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    let base = Url::parse(&base).map_err(|e| invalid(&base, e))?;
    // "./" keeps a segment like "users:search" from parsing as a scheme
    let relative = format!("./{}", endpoint.trim_start_matches('/'));
    base.join(&relative).map_err(|e| invalid(&relative, e))
}

fn to_pairs(fields: &Fields) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), elbow_core::value_to_param_string(v)))
        .collect()
}

/// Header pairs, skipping names or values HTTP cannot carry.
fn header_pairs(fields: &Fields) -> Vec<(String, String)> {
    to_pairs(fields)
        .into_iter()
        .filter(|(k, v)| {
            let ok =
                HeaderName::from_bytes(k.as_bytes()).is_ok() && HeaderValue::from_str(v).is_ok();
            if !ok {
                tracing::warn!(header = %k, "skipping header that is not valid HTTP");
            }
            ok
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn schema(doc: Value) -> Schema {
        Schema::from_document(doc, PathBuf::from("/s/test.json")).unwrap()
    }

    fn options_with(doc: Value) -> Options {
        serde_json::from_value(doc).unwrap()
    }

    #[test]
    fn join_handles_slashes() {
        let cases = [
            ("http://localhost:9095", "/simple", "http://localhost:9095/simple"),
            ("http://localhost:9095/", "/simple", "http://localhost:9095/simple"),
            ("http://localhost:9095/", "simple", "http://localhost:9095/simple"),
            ("http://localhost:9095/api", "/test", "http://localhost:9095/api/test"),
            ("http://localhost:9095/api/", "test?x=1", "http://localhost:9095/api/test?x=1"),
            ("http://localhost:9095/api", "", "http://localhost:9095/api/"),
            ("http://localhost:9095", "users:search", "http://localhost:9095/users:search"),
        ];
        for (base, endpoint, expected) in cases {
            assert_eq!(join_url(base, endpoint).unwrap().as_str(), expected, "{base} + {endpoint}");
        }
    }

    #[test]
    fn absolute_endpoint_used_as_is() {
        let url = join_url("http://localhost:1", "http://other:2/x").unwrap();
        assert_eq!(url.as_str(), "http://other:2/x");
    }

    #[test]
    fn invalid_base_is_error() {
        let err = join_url("not a url", "/x").unwrap_err();
        assert!(matches!(err, CaseError::InvalidUrl { .. }));
    }

    #[test]
    fn endpoint_expanded_from_vars() {
        let s = schema(json!({"endpoint": "/x/${sessionToken}", "methods": ["get"]}));
        let vars: Vars = [("sessionToken", "abc")].into_iter().collect();
        let req = prepare("http://h", Method::Get, &s, &Options::default(), &vars).unwrap();
        assert_eq!(req.url, "http://h/x/abc");
    }

    #[test]
    fn schema_fields_override_suite_defaults() {
        let s = schema(json!({
            "endpoint": "/headers",
            "methods": ["post"],
            "headers": {"x-b": "schema"},
            "query": {"page": 2},
            "body": {"name": "${user}"}
        }));
        let options = options_with(json!({
            "headers": {"x-a": "suite", "x-b": "suite"},
            "query": {"page": 1, "lang": "en"},
            "body": {"client": "elbow"}
        }));
        let vars: Vars = [("user", "mugo")].into_iter().collect();

        let mut req = prepare("http://h", Method::Post, &s, &options, &vars).unwrap();
        req.headers.sort();
        req.query.sort();

        assert_eq!(
            req.headers,
            vec![("x-a".into(), "suite".into()), ("x-b".into(), "schema".into())]
        );
        assert_eq!(
            req.query,
            vec![("lang".into(), "en".into()), ("page".into(), "2".into())]
        );
        assert_eq!(req.body, Some(json!({"client": "elbow", "name": "mugo"})));
    }

    #[test]
    fn get_carries_no_body() {
        let s = schema(json!({"endpoint": "/q", "methods": ["get"], "body": {"a": 1}}));
        let req = prepare("http://h", Method::Get, &s, &Options::default(), &Vars::new()).unwrap();
        assert_eq!(req.body, None);
    }

    #[test]
    fn body_methods_always_send_an_object() {
        let s = schema(json!({"endpoint": "/q", "methods": ["delete"]}));
        let req =
            prepare("http://h", Method::Delete, &s, &Options::default(), &Vars::new()).unwrap();
        assert_eq!(req.body, Some(json!({})));
    }

    #[test]
    fn legacy_params_follow_attachment_and_win() {
        let s = schema(json!({
            "endpoint": "/params",
            "methods": ["get", "post"],
            "query": {"a": "modern", "b": "modern"},
            "body": {"a": "modern"},
            "params": {"a": "legacy"}
        }));

        let mut get =
            prepare("http://h", Method::Get, &s, &Options::default(), &Vars::new()).unwrap();
        get.query.sort();
        assert_eq!(
            get.query,
            vec![("a".into(), "legacy".into()), ("b".into(), "modern".into())]
        );

        let post =
            prepare("http://h", Method::Post, &s, &Options::default(), &Vars::new()).unwrap();
        assert_eq!(post.body, Some(json!({"a": "legacy"})));
        assert_eq!(post.query.len(), 2);
    }

    #[test]
    fn non_object_params_rejected() {
        let s = schema(json!({"endpoint": "/p", "methods": ["get"], "params": "a=1"}));
        let err = prepare("http://h", Method::Get, &s, &Options::default(), &Vars::new())
            .unwrap_err();
        assert!(matches!(err, CaseError::InvalidParams(_)));
    }

    #[test]
    fn invalid_headers_skipped() {
        let s = schema(json!({
            "endpoint": "/h",
            "methods": ["get"],
            "headers": {"bad name": "x", "x-ok": "fine", "x-bad-value": "a\r\nb"}
        }));
        let req = prepare("http://h", Method::Get, &s, &Options::default(), &Vars::new()).unwrap();
        assert_eq!(req.headers, vec![("x-ok".into(), "fine".into())]);
    }

    #[test]
    fn transport_mapping_is_total() {
        for method in Method::ALL {
            assert_eq!(transport_method(method).as_str(), method.as_str());
        }
    }
}
