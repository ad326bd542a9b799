use std::fmt;
use crate::core::error::{Error, Result};

/// Matches any run of characters, across segments
pub const MULTI_WILDCARD: char = '*';
/// Matches exactly one character
pub const SINGLE_WILDCARD: char = '?';

fn has_wildcard(text: &str) -> bool {
    text.contains([MULTI_WILDCARD, SINGLE_WILDCARD])
}

/// Ordered segment names of a relation's primary key, e.g. "group:board:article"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    segments: Vec<String>,
    delimiter: char,
}

impl KeyTemplate {
    pub fn parse(pattern: &str, delimiter: char) -> Result<Self> {
        if delimiter == MULTI_WILDCARD || delimiter == SINGLE_WILDCARD {
            return Err(Error::configuration(format!(
                "key delimiter '{}' collides with a wildcard", delimiter
            )));
        }

        let segments: Vec<String> = pattern
            .split(delimiter)
            .map(|segment| segment.trim().to_string())
            .collect();

        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() || has_wildcard(segment) {
                return Err(Error::configuration(format!(
                    "invalid key pattern '{}': bad segment name '{}'", pattern, segment
                )));
            }
            if segments[..i].contains(segment) {
                return Err(Error::configuration(format!(
                    "invalid key pattern '{}': segment '{}' repeated", pattern, segment
                )));
            }
        }

        Ok(KeyTemplate { segments, delimiter })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.segments
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.segments.iter().position(|segment| segment == name)
    }
}

/// Hierarchical primary key bound to a template; segments may hold wildcards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    template: KeyTemplate,
    values: Vec<String>,
}

impl RecordKey {
    pub fn from_segments<S: Into<String>>(
        template: &KeyTemplate,
        values: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let key = RecordKey {
            template: template.clone(),
            values: values.into_iter().map(Into::into).collect(),
        };
        key.check()?;
        Ok(key)
    }

    /// Inverse of [`RecordKey::encode`]
    pub fn decode(encoded: &str, template: &KeyTemplate) -> Result<Self> {
        RecordKey::from_segments(template, encoded.split(template.delimiter()))
    }

    fn check(&self) -> Result<()> {
        let delimiter = self.template.delimiter();

        for value in &self.values {
            if value.is_empty() {
                return Err(Error::malformed_key(format!(
                    "key '{}' has an empty segment", self.encode()
                )));
            }
            if value.contains(delimiter) {
                return Err(Error::malformed_key(format!(
                    "key segment '{}' contains the delimiter '{}'", value, delimiter
                )));
            }
        }

        let expected = self.template.len();
        let actual = self.values.len();
        let open_ended = self
            .values
            .last()
            .is_some_and(|last| last.ends_with(MULTI_WILDCARD));

        if actual > expected || (actual < expected && !open_ended) {
            return Err(Error::malformed_key(format!(
                "key '{}' has {} segments, template '{}' expects {}",
                self.encode(),
                actual,
                self.template.names().join(&delimiter.to_string()),
                expected
            )));
        }
        Ok(())
    }

    pub fn encode(&self) -> String {
        self.values.join(&self.template.delimiter().to_string())
    }

    pub fn has_wildcard(&self) -> bool {
        self.values.iter().any(|value| has_wildcard(value))
    }

    pub fn template(&self) -> &KeyTemplate {
        &self.template
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Segment value by template name
    pub fn segment(&self, name: &str) -> Option<&str> {
        self.template
            .position(name)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    /// Fails with MalformedKey unless the key addresses exactly one record
    pub fn ensure_concrete(&self) -> Result<()> {
        if self.has_wildcard() {
            return Err(Error::malformed_key(format!(
                "key '{}' contains a wildcard", self.encode()
            )));
        }
        Ok(())
    }

    pub fn delete_strategy(&self) -> DeleteStrategy {
        DeleteStrategy::classify(&self.encode())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// How a key pattern is removed from the index, cheapest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStrategy {
    /// Single term delete, no wildcard
    Exact(String),
    /// One trailing '*': everything starting with the prefix
    Prefix(String),
    /// Any other wildcard layout: enumerate matches, delete one by one
    Pattern(String),
}

impl DeleteStrategy {
    pub fn classify(encoded: &str) -> DeleteStrategy {
        if !has_wildcard(encoded) {
            return DeleteStrategy::Exact(encoded.to_string());
        }
        if encoded.contains(SINGLE_WILDCARD) {
            return DeleteStrategy::Pattern(encoded.to_string());
        }

        let stars = encoded.matches(MULTI_WILDCARD).count();
        match encoded.strip_suffix(MULTI_WILDCARD) {
            Some(prefix) if stars == 1 => DeleteStrategy::Prefix(prefix.to_string()),
            _ => DeleteStrategy::Pattern(encoded.to_string()),
        }
    }
}
