//! Record-path selector adapter for generic structured-record documents.
//!
//! Paths address values inside a JSON document: `$.requirements[*]` selects
//! every element of the top-level `requirements` array, `semantics.type`
//! descends through nested objects relative to the current sub-document.
//! Segments are dotted field names, `[n]` indices, and `[*]` wildcards; the
//! leading `$` (document root) is optional.

use serde_json::Value;

use crate::selector::SelectorAdapter;

/// One step of a compiled record path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named object field.
    Field(String),
    /// An array index.
    Index(usize),
    /// Every element of an array (or every value of an object).
    Wildcard,
}

/// A validated record path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPath {
    pub segments: Vec<PathSegment>,
}

impl RecordPath {
    /// Parse a record path.
    ///
    /// Rejects empty paths, empty segments and malformed index brackets.
    pub fn parse(path: &str) -> Result<Self, String> {
        let trimmed = path.trim();
        let body = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let body = body.strip_prefix('.').unwrap_or(body);

        if body.is_empty() {
            return Err(format!("empty record path: '{}'", path));
        }

        let mut segments = Vec::new();
        for raw in body.split('.') {
            if raw.is_empty() {
                return Err(format!("empty segment in record path '{}'", path));
            }
            // A segment may carry bracket suffixes: items[0][*]
            let mut rest = raw;
            if let Some(bracket) = rest.find('[') {
                let (name, brackets) = rest.split_at(bracket);
                if !name.is_empty() {
                    segments.push(PathSegment::Field(name.to_string()));
                }
                rest = brackets;
                while let Some(stripped) = rest.strip_prefix('[') {
                    let close = stripped
                        .find(']')
                        .ok_or_else(|| format!("unclosed '[' in record path '{}'", path))?;
                    let inner = &stripped[..close];
                    if inner == "*" {
                        segments.push(PathSegment::Wildcard);
                    } else {
                        let index = inner.parse::<usize>().map_err(|_| {
                            format!("invalid index '{}' in record path '{}'", inner, path)
                        })?;
                        segments.push(PathSegment::Index(index));
                    }
                    rest = &stripped[close + 1..];
                }
                if !rest.is_empty() {
                    return Err(format!(
                        "unexpected trailing '{}' in record path '{}'",
                        rest, path
                    ));
                }
            } else {
                segments.push(PathSegment::Field(rest.to_string()));
            }
        }

        Ok(Self { segments })
    }

    /// Evaluate this path against a value, returning all matches.
    pub fn select<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];
        for segment in &self.segments {
            let mut next = Vec::new();
            for value in current {
                match segment {
                    PathSegment::Field(name) => {
                        if let Some(v) = value.get(name.as_str()) {
                            next.push(v);
                        }
                    }
                    PathSegment::Index(i) => {
                        if let Some(v) = value.get(i) {
                            next.push(v);
                        }
                    }
                    PathSegment::Wildcard => match value {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ => {}
                    },
                }
            }
            current = next;
        }
        current
    }
}

/// Renders a scalar JSON value as a selector match; null and containers do
/// not match.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Selector adapter over `serde_json` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAdapter;

impl SelectorAdapter for RecordAdapter {
    type Scope = Value;
    type Selector = RecordPath;

    fn compile(selector: &str) -> Result<RecordPath, String> {
        RecordPath::parse(selector)
    }

    fn select_docs(&self, selector: &RecordPath, scope: &Value) -> Vec<Value> {
        selector.select(scope).into_iter().cloned().collect()
    }

    fn select_values(&self, selector: &RecordPath, scope: &Value) -> Vec<String> {
        selector
            .select(scope)
            .into_iter()
            .filter_map(value_to_string)
            .collect()
    }
}
