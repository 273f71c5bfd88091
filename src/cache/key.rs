//! Key Builder Module
//!
//! Deterministic cache key construction and the glob matching used by
//! namespace invalidation.
//!
//! Keys have the form `<app>:<namespace>:<part1>:<part2>:...`. Every segment,
//! the app prefix and namespace included, has `%` and `:` percent-encoded, so
//! a segment containing the separator can never alias a longer key.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

// == Key Builder ==
/// Builds namespaced cache keys under a fixed application prefix.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    /// Encoded application prefix
    prefix: String,
}

impl KeyBuilder {
    /// Creates a builder for the given application namespace.
    pub fn new(app_namespace: impl AsRef<str>) -> Self {
        Self {
            prefix: encode_part(app_namespace.as_ref()),
        }
    }

    // == Build Key ==
    /// Joins the app prefix, dataset namespace and parts into a key.
    ///
    /// Part order is significant. Composite filters should go through
    /// [`canonical_params`] first.
    pub fn build_key(&self, namespace: impl AsRef<str>, parts: &[&dyn Display]) -> String {
        let mut key = format!("{}:{}", self.prefix, encode_part(namespace.as_ref()));
        for part in parts {
            key.push(':');
            key.push_str(&encode_part(&part.to_string()));
        }
        key
    }

    /// The key built for `namespace` with no parts.
    pub fn namespace_root(&self, namespace: impl AsRef<str>) -> String {
        self.build_key(namespace, &[])
    }

    // == Namespace Pattern ==
    /// Glob matching every key built under `namespace` with at least one
    /// part, and nothing outside it. Pair with [`KeyBuilder::namespace_root`].
    pub fn namespace_pattern(&self, namespace: impl AsRef<str>) -> String {
        format!(
            "{}:{}:*",
            escape_glob(&self.prefix),
            escape_glob(&encode_part(namespace.as_ref()))
        )
    }
}

// == Canonical Params ==
/// Serializes a filter or pagination value with object keys sorted at every
/// depth, so equal values always produce the same string.
pub fn canonical_params<T: Serialize + ?Sized>(params: &T) -> Result<String> {
    let value = sort_keys(serde_json::to_value(params)?);
    Ok(serde_json::to_string(&value)?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(String, Value)> = map.into_iter().collect();
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(fields.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn encode_part(part: &str) -> String {
    if !part.contains(['%', ':']) {
        return part.to_string();
    }
    let mut encoded = String::with_capacity(part.len() + 4);
    for c in part.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            ':' => encoded.push_str("%3A"),
            other => encoded.push(other),
        }
    }
    encoded
}

fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// == Glob Match ==
/// Redis-style glob matching supporting `*`, `?` and `\` escapes.
///
/// Character classes are not supported; `[` and `]` match literally.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` in the pattern and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    backtrack = Some((p, t));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    t += 1;
                    continue;
                }
                '\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == text[t] {
                        p += 2;
                        t += 1;
                        continue;
                    }
                }
                c if c == text[t] => {
                    p += 1;
                    t += 1;
                    continue;
                }
                _ => {}
            }
        }
        match backtrack {
            Some((star, tried)) => {
                p = star + 1;
                t = tried + 1;
                backtrack = Some((star, tried + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
