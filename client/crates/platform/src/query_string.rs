//! Nested query-string encoding
//!
//! Query parameters are encoded in the bracket style common to web backends:
//! `filter[region]=eu&tags[0]=a&tags[1]=b`. Keys are emitted in sorted order
//! so identical parameter maps always produce identical strings.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::http::QueryValue;

/// How list elements are keyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrayFormat {
    /// `a[0]=x&a[1]=y`
    #[default]
    Indices,
    /// `a[]=x&a[]=y`
    Brackets,
    /// `a=x&a=y`
    Repeat,
}

impl ArrayFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "indices" => Some(ArrayFormat::Indices),
            "brackets" => Some(ArrayFormat::Brackets),
            "repeat" => Some(ArrayFormat::Repeat),
            _ => None,
        }
    }
}

/// Encode a parameter map into a query string (without the leading `?`)
///
/// Empty lists and maps produce no pairs.
pub fn encode(params: &BTreeMap<String, QueryValue>, format: ArrayFormat) -> String {
    let mut pairs = Vec::new();
    for (name, value) in params {
        flatten(name.clone(), value, format, &mut pairs);
    }
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn flatten(prefix: String, value: &QueryValue, format: ArrayFormat, out: &mut Vec<(String, String)>) {
    match value {
        QueryValue::Bool(b) => out.push((prefix, b.to_string())),
        QueryValue::Int(i) => out.push((prefix, i.to_string())),
        QueryValue::Str(s) => out.push((prefix, s.clone())),
        QueryValue::List(items) => {
            for (index, item) in items.iter().enumerate() {
                let key = match format {
                    ArrayFormat::Indices => format!("{prefix}[{index}]"),
                    ArrayFormat::Brackets => format!("{prefix}[]"),
                    ArrayFormat::Repeat => prefix.clone(),
                };
                flatten(key, item, format, out);
            }
        }
        QueryValue::Map(map) => {
            for (name, item) in map {
                flatten(format!("{prefix}[{name}]"), item, format, out);
            }
        }
    }
}
