//! Named collections of JSON rows

use std::collections::BTreeMap;

use serde_json::Value;

use crate::provider::{QueryError, QueryResult};

/// Rows handed to an in-memory provider, keyed by collection name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    collections: BTreeMap<String, Vec<Value>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a collection
    pub fn with_collection(mut self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        self.insert(name, rows);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, rows: Vec<Value>) {
        self.collections.insert(name.into(), rows);
    }

    /// Builds a dataset from `{ "Collection": [rows..], .. }`
    pub fn from_json(value: Value) -> QueryResult<Self> {
        let Value::Object(map) = value else {
            return Err(QueryError::Execution(
                "Dataset must be a JSON object of arrays".into(),
            ));
        };
        let mut dataset = Self::new();
        for (name, rows) in map {
            match rows {
                Value::Array(rows) => dataset.insert(name, rows),
                _ => {
                    return Err(QueryError::Execution(format!(
                        "Collection '{}' is not an array",
                        name
                    )))
                }
            }
        }
        Ok(dataset)
    }

    pub fn rows(&self, name: &str) -> QueryResult<&[Value]> {
        self.collections
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| QueryError::UnknownCollection(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }
}
