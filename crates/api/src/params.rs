//! Typed query parameter extraction.
//!
//! Each endpoint declares its parameters as a static schema of [`ParamSpec`]s.
//! [`extract`] resolves the decoded `(name, value)` pairs of a request against
//! that schema, so every declared parameter ends up with a value, its default
//! or [`ParamValue::Absent`].

use std::collections::HashMap;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("parameter '{name}' must be a boolean, got '{value}'")]
    InvalidBool { name: &'static str, value: String },
}

/// Expected type of a query parameter, with its default when omitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str { default: Option<&'static str> },
    Bool { default: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    /// String parameter without a default
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Str { default: None },
        }
    }

    pub const fn boolean(name: &'static str, default: bool) -> Self {
        Self {
            name,
            kind: ParamKind::Bool { default },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Bool(bool),
    Absent,
}

/// Resolved parameters for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    values: HashMap<&'static str, ParamValue>,
}

impl QueryParams {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// String value of `name`, `None` when absent or not a string parameter
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ParamValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ParamValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }
}

/// Resolve `pairs` against `specs`.
///
/// The first occurrence of a repeated parameter wins, empty values count as
/// absent and parameters outside the schema are ignored.
pub fn extract(specs: &[ParamSpec], pairs: &[(String, String)]) -> Result<QueryParams, Error> {
    let mut values = HashMap::with_capacity(specs.len());
    for spec in specs {
        let raw = pairs
            .iter()
            .find(|(name, _)| name == spec.name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty());

        let value = match (spec.kind, raw) {
            (ParamKind::Str { .. }, Some(raw)) => ParamValue::Str(raw.to_owned()),
            (ParamKind::Str { default: Some(d) }, None) => ParamValue::Str(d.to_owned()),
            (ParamKind::Str { default: None }, None) => ParamValue::Absent,
            (ParamKind::Bool { .. }, Some(raw)) => ParamValue::Bool(parse_bool(spec.name, raw)?),
            (ParamKind::Bool { default }, None) => ParamValue::Bool(default),
        };
        values.insert(spec.name, value);
    }
    Ok(QueryParams { values })
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, Error> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidBool {
            name,
            value: raw.to_owned(),
        }),
    }
}
