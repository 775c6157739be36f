//! Query parameters and the bracket-notation query-string encoder.
//!
//! # Design
//! Parameters are ordinary `Serialize` types. The encoder lowers them to a
//! `serde_json::Value` and walks it recursively, producing nested bracket
//! key paths: objects become `key[subkey]=value`, array elements become
//! `key[]=value`, and the whole string gets a leading `?` only when at least
//! one pair was produced. Key segments and values are percent-escaped; the
//! structural brackets are emitted literally. The encoder only describes
//! value structure — operator semantics are the server's responsibility.
//!
//! The `where` filter mirrors the server's query language: a set of
//! per-field comparison operators plus `and`/`or` composition of
//! sub-filters.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

/// Escape everything except RFC 3986 unreserved characters.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Comparison operators understood by the `where` filter.
///
/// Serialized as the snake_case key of the nested filter object, e.g.
/// `where[title][equals]=test`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    Contains,
    NotEquals,
    In,
    All,
    NotIn,
    Exists,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Like,
    Within,
    Intersects,
    Near,
}

/// A `where` filter: per-field operator constraints plus boolean composition.
///
/// ```
/// use docstore_core::{Operator, Where};
///
/// let filter = Where::field("title", Operator::Equals, "test");
/// let either = Where::any(vec![
///     filter.clone(),
///     Where::field("views", Operator::GreaterThan, 100),
/// ]);
/// # let _ = either;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Where {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub and: Vec<Where>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub or: Vec<Where>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, BTreeMap<Operator, Value>>,
}

impl Where {
    /// Single-field constraint: `field(name, op, value)`.
    pub fn field(name: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Where::default().with(name, op, value)
    }

    /// Add another constraint on this filter. Constraints on the same field
    /// accumulate into one nested operator object.
    pub fn with(mut self, name: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        self.fields.entry(name.into()).or_default().insert(op, value.into());
        self
    }

    /// All sub-filters must match.
    pub fn all_of(clauses: Vec<Where>) -> Self {
        Where {
            and: clauses,
            ..Where::default()
        }
    }

    /// At least one sub-filter must match.
    pub fn any(clauses: Vec<Where>) -> Self {
        Where {
            or: clauses,
            ..Where::default()
        }
    }
}

/// Parameters accepted by every document operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaseParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Parameters accepted by `find` and `count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FindParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#where: Option<Where>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Serialize `params` into a query string, `?`-prefixed, or `""` when the
/// params produce no pairs.
pub fn to_query_string<T: Serialize>(params: &T) -> Result<String, Error> {
    let value = serde_json::to_value(params).map_err(Error::Serialize)?;
    Ok(encode(&value))
}

/// Encode an already-lowered value. Only a top-level object produces pairs;
/// `null` and anything else encode to the empty string.
pub(crate) fn encode(value: &Value) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = value {
        for (key, value) in map {
            push_pairs(&escape(key), value, &mut pairs);
        }
    }
    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

fn push_pairs(key: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (sub, value) in map {
                push_pairs(&format!("{key}[{}]", escape(sub)), value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                push_pairs(&format!("{key}[]"), item, out);
            }
        }
        Value::String(s) => out.push(format!("{key}={}", escape(s))),
        Value::Bool(b) => out.push(format!("{key}={b}")),
        Value::Number(n) => out.push(format!("{key}={n}")),
    }
}

fn escape(segment: &str) -> String {
    utf8_percent_encode(segment, QUERY_ESCAPE).to_string()
}
