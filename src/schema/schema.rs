use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use regex::Regex;
use serde::{Serialize, Deserialize};
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, Result};
use crate::core::types::{IndexPolicy, StorePolicy};
use crate::schema::key::{KeyTemplate, RecordKey};

/// Name of the primary-key pseudo-column
pub const PRIMARY_KEY: &str = "_key";

pub const DEFAULT_KEY_DELIMITER: char = ':';

pub const DEFAULT_ANALYZER: &str = "standard";

static COLUMN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("column name pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Text,
    Integer,
    Float,
}

/// Column definition with indexing policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub indexable: bool,
    #[serde(default)]
    pub tokenizable: bool,
    #[serde(default = "default_true")]
    pub storable: bool,
    #[serde(default)]
    pub compressible: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default = "default_boost")]
    pub boost: f32,
}

fn default_true() -> bool {
    true
}

fn default_boost() -> f32 {
    1.0
}

impl Column {
    /// Stored, not indexed text column
    pub fn new(name: &str) -> Self {
        Column {
            name: name.to_string(),
            value_type: ValueType::Text,
            indexable: false,
            tokenizable: false,
            storable: true,
            compressible: false,
            queryable: false,
            boost: 1.0,
        }
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexable = true;
        self
    }

    pub fn tokenized(mut self) -> Self {
        self.indexable = true;
        self.tokenizable = true;
        self
    }

    /// Tokenized column searched by default
    pub fn queryable(mut self) -> Self {
        self.indexable = true;
        self.tokenizable = true;
        self.queryable = true;
        self
    }

    pub fn stored(mut self, storable: bool) -> Self {
        self.storable = storable;
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compressible = true;
        self
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Usable as a filter or sort column
    pub fn is_filterable(&self) -> bool {
        self.indexable && !self.tokenizable
    }

    /// Usable as an analyzed query column
    pub fn is_searchable(&self) -> bool {
        self.indexable && self.tokenizable
    }

    pub fn store_policy(&self) -> StorePolicy {
        if self.compressible {
            StorePolicy::Compressed
        } else if self.storable {
            StorePolicy::Stored
        } else {
            StorePolicy::None
        }
    }

    pub fn index_policy(&self) -> IndexPolicy {
        if self.tokenizable {
            IndexPolicy::Tokenized
        } else if self.indexable {
            IndexPolicy::Exact
        } else {
            IndexPolicy::None
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !COLUMN_NAME.is_match(&self.name) {
            return Err(Error::validation(format!(
                "invalid column name '{}' (letters, digits and '_', starting with a letter)",
                self.name
            )));
        }
        if self.tokenizable && !self.indexable {
            return Err(Error::validation(format!(
                "column '{}' is tokenizable but not indexable", self.name
            )));
        }
        if self.tokenizable && self.value_type != ValueType::Text {
            return Err(Error::validation(format!(
                "column '{}' is tokenizable but holds {:?} values", self.name, self.value_type
            )));
        }
        if self.queryable && !self.is_searchable() {
            return Err(Error::validation(format!(
                "column '{}' is queryable but not indexable and tokenizable", self.name
            )));
        }
        if !self.boost.is_finite() || self.boost < 0.0 {
            return Err(Error::validation(format!(
                "column '{}' has invalid boost {}", self.name, self.boost
            )));
        }
        Ok(())
    }
}

/// Segment merge tuning handed to the engine writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    pub merge_factor: usize,
    pub max_merge_docs: usize,
}

impl Default for MergeSettings {
    fn default() -> Self {
        MergeSettings {
            merge_factor: 10,
            max_merge_docs: 10_000_000,
        }
    }
}

/// Declared shape of a record type and its storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub directory: PathBuf,
    pub key_pattern: String,
    #[serde(default = "default_delimiter")]
    pub key_delimiter: char,
    pub columns: Vec<Column>,
    #[serde(default = "default_analyzer")]
    pub analyzer: String,
    #[serde(default)]
    pub merge: MergeSettings,
    #[serde(default)]
    pub compression: CompressionType,
    #[serde(default)]
    pub expert_query_mode: bool,
}

fn default_delimiter() -> char {
    DEFAULT_KEY_DELIMITER
}

fn default_analyzer() -> String {
    DEFAULT_ANALYZER.to_string()
}

impl Relation {
    pub fn new(name: &str, directory: impl Into<PathBuf>, key_pattern: &str) -> Self {
        Relation {
            name: name.to_string(),
            directory: directory.into(),
            key_pattern: key_pattern.to_string(),
            key_delimiter: DEFAULT_KEY_DELIMITER,
            columns: Vec::new(),
            analyzer: default_analyzer(),
            merge: MergeSettings::default(),
            compression: CompressionType::default(),
            expert_query_mode: false,
        }
    }

    pub fn add_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn analyzer(mut self, analyzer: &str) -> Self {
        self.analyzer = analyzer.to_string();
        self
    }

    pub fn expert_query_mode(mut self, expert: bool) -> Self {
        self.expert_query_mode = expert;
        self
    }

    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    pub fn merge_settings(mut self, merge: MergeSettings) -> Self {
        self.merge = merge;
        self
    }

    /// Parse and validate a relation descriptor
    pub fn from_json(descriptor: &str) -> Result<Self> {
        let relation: Relation = serde_json::from_str(descriptor)?;
        relation.validate()?;
        Ok(relation)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let descriptor = std::fs::read_to_string(path).map_err(|err| {
            Error::with_source(
                crate::core::error::ErrorKind::Configuration,
                format!("cannot read relation descriptor {}", path.display()),
                err,
            )
        })?;
        Relation::from_json(&descriptor)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn is_column_name(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Columns searched when no explicit query column is selected
    pub fn queryable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| column.queryable)
    }

    pub fn key_template(&self) -> Result<KeyTemplate> {
        KeyTemplate::parse(&self.key_pattern, self.key_delimiter)
    }

    /// Decode an encoded key against this relation's template
    pub fn key(&self, encoded: &str) -> Result<RecordKey> {
        RecordKey::decode(encoded, &self.key_template()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::configuration("relation name is empty"));
        }
        if self.directory.as_os_str().is_empty() {
            return Err(Error::configuration(format!(
                "relation '{}' has no storage directory", self.name
            )));
        }
        if self.columns.is_empty() {
            return Err(Error::configuration(format!(
                "relation '{}' declares no columns", self.name
            )));
        }
        self.key_template()?;

        let mut names = HashSet::new();
        for column in &self.columns {
            column.validate()?;
            if !names.insert(column.name.as_str()) {
                return Err(Error::validation(format!(
                    "column '{}' declared twice in relation '{}'", column.name, self.name
                )));
            }
        }
        Ok(())
    }
}
