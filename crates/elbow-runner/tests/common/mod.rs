//! Disposable fixture servers and schema-directory helpers

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Read;
use std::net::TcpListener;
use std::path::Path;
use std::thread;

use serde_json::Value;
use tiny_http::{Header, Response, Server};

/// What a fixture handler sees of an incoming request.
#[derive(Debug, Clone)]
pub struct FixtureRequest {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// Start a JSON server on an ephemeral port; returns its base URL.
///
/// The handler maps each request to `(status, json body)`. The server thread
/// lives until the test process exits.
pub fn serve<F>(handler: F) -> String
where
    F: Fn(&FixtureRequest) -> (u16, Value) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut raw = String::new();
            let _ = request.as_reader().read_to_string(&mut raw);

            let url = request.url().to_string();
            let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
            let fixture = FixtureRequest {
                method: request.method().to_string(),
                path: path.to_string(),
                query: url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
                headers: request
                    .headers()
                    .iter()
                    .map(|h| (h.field.to_string().to_ascii_lowercase(), h.value.to_string()))
                    .collect(),
                body: serde_json::from_str(&raw).unwrap_or(Value::Null),
            };

            let (status, body) = handler(&fixture);
            let response = Response::from_string(body.to_string())
                .with_status_code(status)
                .with_header(
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
                );
            let _ = request.respond(response);
        }
    });

    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Write `doc` as pretty JSON to `dir/name`.
pub fn write_schema(dir: &Path, name: &str, doc: &Value) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), serde_json::to_string_pretty(doc).unwrap()).unwrap();
}
