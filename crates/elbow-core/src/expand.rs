//! `${name}` placeholder expansion
//!
//! Lookup order: the run's variable bag, then the process environment.
//! Unresolved placeholders stay verbatim and are reported, never fatal.

use serde_json::Value;

use crate::schema::Fields;
use crate::vars::Vars;

/// Result of expanding one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expanded {
    pub value: String,
    /// Placeholder names that could not be resolved, in order of appearance
    pub unresolved: Vec<String>,
}

/// Expand every placeholder in `input` using `lookup`.
///
/// Single left-to-right pass: substituted text is not rescanned.
pub fn expand_with<F>(input: &str, lookup: F) -> Expanded
where
    F: Fn(&str) -> Option<String>,
{
    let mut value = String::with_capacity(input.len());
    let mut unresolved = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        value.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(name) = placeholder_name(after) else {
            value.push_str("${");
            rest = after;
            continue;
        };
        match lookup(name) {
            Some(resolved) => value.push_str(&resolved),
            None => {
                value.push_str(&rest[start..start + name.len() + 3]);
                unresolved.push(name.to_string());
            }
        }
        rest = &after[name.len() + 1..];
    }
    value.push_str(rest);

    Expanded { value, unresolved }
}

/// Identifier directly followed by `}`, or `None` if `s` does not start one.
fn placeholder_name(s: &str) -> Option<&str> {
    let end = s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))?;
    (end > 0 && s[end..].starts_with('}')).then(|| &s[..end])
}

/// Expand a string against `vars` and the process environment.
#[must_use]
pub fn expand(input: &str, vars: &Vars) -> String {
    let expanded = expand_with(input, |name| vars.resolve(name));
    report_unresolved(input, &expanded.unresolved);
    expanded.value
}

/// Expand every string inside `value`, recursing into arrays and objects.
pub fn expand_value(value: &mut Value, vars: &Vars) {
    match value {
        Value::String(s) => *s = expand(s, vars),
        Value::Array(items) => items.iter_mut().for_each(|v| expand_value(v, vars)),
        Value::Object(map) => map.values_mut().for_each(|v| expand_value(v, vars)),
        _ => {}
    }
}

/// Expand all string fields of `fields` in place; returns the same map.
pub fn expand_fields<'a>(fields: &'a mut Fields, vars: &Vars) -> &'a mut Fields {
    for v in fields.values_mut() {
        expand_value(v, vars);
    }
    fields
}

fn report_unresolved(input: &str, names: &[String]) {
    for name in names {
        tracing::warn!(placeholder = %name, template = %input, "unresolved variable");
    }
}
