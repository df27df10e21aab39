//! Raw and validated request parameters
//!
//! [`RawParams`] holds what the client sent, untouched. Validation rules move
//! parameters out of it into [`SafeParams`]; whatever remains afterwards was
//! not expected and causes the request to be refused.

use std::collections::{BTreeMap, HashMap};

use crate::error::{ValidationError, ValidationResult};

/// Untrusted parameters keyed by name; values keep the order they were received
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    values: BTreeMap<String, Vec<String>>,
}

impl RawParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from name/value pairs; repeated names accumulate
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.push(name, value);
        }
        params
    }

    /// Parse the query string and an url-encoded body into one parameter set
    pub fn from_urlencoded(query: Option<&str>, body: &[u8]) -> ValidationResult<Self> {
        let mut params = Self::new();

        if let Some(query) = query.filter(|q| !q.is_empty()) {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
                .map_err(|e| ValidationError::Malformed(format!("query string: {}", e)))?;
            params.extend(pairs);
        }

        if !body.is_empty() {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
                .map_err(|e| ValidationError::Malformed(format!("request body: {}", e)))?;
            params.extend(pairs);
        }

        Ok(params)
    }

    /// Add one value for `name`
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    fn extend(&mut self, pairs: Vec<(String, String)>) {
        for (name, value) in pairs {
            self.push(name, value);
        }
    }

    /// Remove and return all values of `name`
    pub fn take(&mut self, name: &str) -> Option<Vec<String>> {
        self.values.remove(name)
    }

    /// Names that have not been consumed yet
    pub fn remaining(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Whether every parameter has been consumed
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A parameter value that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeValue {
    /// Single string
    Str(String),
    /// Zero or more strings
    StrList(Vec<String>),
    /// Single integer
    Num(i64),
    /// Zero or more integers
    NumList(Vec<i64>),
    /// Optional parameter that was not supplied
    Missing,
}

/// Validated parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeParams {
    values: HashMap<String, SafeValue>,
}

impl SafeParams {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validated value
    pub fn insert(&mut self, name: &str, value: SafeValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Raw access to a validated value
    pub fn get(&self, name: &str) -> Option<&SafeValue> {
        self.values.get(name)
    }

    /// Take an optional string
    pub fn take_str(&mut self, name: &str) -> Option<String> {
        match self.values.remove(name) {
            Some(SafeValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    /// Take a string that a rule has already made mandatory
    pub fn require_str(&mut self, name: &str) -> ValidationResult<String> {
        self.take_str(name)
            .ok_or_else(|| ValidationError::MissingParameter(name.to_string()))
    }

    /// Take a string list, empty when absent
    pub fn take_str_list(&mut self, name: &str) -> Vec<String> {
        match self.values.remove(name) {
            Some(SafeValue::StrList(values)) => values,
            Some(SafeValue::Str(value)) => vec![value],
            _ => Vec::new(),
        }
    }

    /// Take an optional integer
    pub fn take_num(&mut self, name: &str) -> Option<i64> {
        match self.values.remove(name) {
            Some(SafeValue::Num(value)) => Some(value),
            _ => None,
        }
    }

    /// Take an integer that a rule has already made mandatory
    pub fn require_num(&mut self, name: &str) -> ValidationResult<i64> {
        self.take_num(name)
            .ok_or_else(|| ValidationError::MissingParameter(name.to_string()))
    }

    /// Take an integer list, empty when absent
    pub fn take_num_list(&mut self, name: &str) -> Vec<i64> {
        match self.values.remove(name) {
            Some(SafeValue::NumList(values)) => values,
            Some(SafeValue::Num(value)) => vec![value],
            _ => Vec::new(),
        }
    }
}
