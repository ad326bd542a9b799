use std::collections::HashMap;
use crate::core::error::{Error, Result};
use crate::schema::key::RecordKey;
use crate::schema::schema::{Relation, ValueType};

/// In-memory record: one primary key plus column values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    primary_key: Option<RecordKey>,
    values: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    pub fn with_key(primary_key: RecordKey) -> Self {
        Record {
            primary_key: Some(primary_key),
            values: HashMap::new(),
        }
    }

    pub fn primary_key(&self) -> Option<&RecordKey> {
        self.primary_key.as_ref()
    }

    pub fn set_primary_key(&mut self, primary_key: RecordKey) {
        self.primary_key = Some(primary_key);
    }

    /// Decode `encoded` against the relation's key template
    pub fn set_primary_key_str(&mut self, encoded: &str, relation: &Relation) -> Result<()> {
        self.primary_key = Some(relation.key(encoded)?);
        Ok(())
    }

    pub fn add_column_value(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Builder form of [`Record::add_column_value`]
    pub fn value(mut self, name: &str, value: impl Into<String>) -> Self {
        self.add_column_value(name, value);
        self
    }

    pub fn column_value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn remove_column_value(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn require_key(&self) -> Result<&RecordKey> {
        self.primary_key
            .as_ref()
            .ok_or_else(|| Error::validation("record has no primary key"))
    }

    /// Every value names a relation column and parses as that column's type
    pub fn validate(&self, relation: &Relation) -> Result<()> {
        for (name, value) in &self.values {
            let column = relation.column(name).ok_or_else(|| {
                Error::validation(format!(
                    "column '{}' is not part of relation '{}'", name, relation.name
                ))
            })?;

            let parses = match column.value_type {
                ValueType::Text => true,
                ValueType::Integer => value.trim().parse::<i64>().is_ok(),
                ValueType::Float => value.trim().parse::<f64>().is_ok(),
            };
            if !parses {
                return Err(Error::validation(format!(
                    "value '{}' of column '{}' is not a valid {:?}", value, name, column.value_type
                )));
            }
        }
        Ok(())
    }
}
