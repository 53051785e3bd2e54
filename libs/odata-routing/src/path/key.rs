//! Key literals as they appear inside `(...)` in a resource path.

use std::fmt;

/// A typed key value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyValue {
    Int(i64),
    String(String),
    Guid(String),
    /// Any other literal, kept verbatim (e.g. `2024-01-01`, `Sales.Color'Red'`).
    Raw(String),
}

impl KeyValue {
    /// Parse one `OData` literal.
    #[must_use]
    pub fn parse_literal(literal: &str) -> Self {
        let literal = literal.trim();
        if literal.len() >= 2 && literal.starts_with('\'') && literal.ends_with('\'') {
            return KeyValue::String(literal[1..literal.len() - 1].replace("''", "'"));
        }
        if let Ok(n) = literal.parse::<i64>() {
            return KeyValue::Int(n);
        }
        if is_guid(literal) {
            return KeyValue::Guid(literal.to_ascii_lowercase());
        }
        KeyValue::Raw(literal.to_owned())
    }

    /// Value as stored in route data: strings unquoted, everything else verbatim.
    #[must_use]
    pub fn to_route_value(&self) -> String {
        match self {
            KeyValue::Int(n) => n.to_string(),
            KeyValue::String(s) | KeyValue::Guid(s) | KeyValue::Raw(s) => s.clone(),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(n) => write!(f, "{n}"),
            KeyValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            KeyValue::Guid(s) | KeyValue::Raw(s) => f.write_str(s),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Int(i64::from(value))
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_owned())
    }
}

fn is_guid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len && g.bytes().all(|b| b.is_ascii_hexdigit()))
}
