use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::record::Record;
use crate::core::types::StorePolicy;
use crate::query::ast::Query;
use crate::query::composer::{plain_text, QueryComposer};
use crate::query::types::{FilterAttribute, QueryAttribute};
use crate::reader::snapshot_reader::{Hits, StoredDocument};
use crate::schema::key::RecordKey;
use crate::schema::schema::{Column, Relation, ValueType, PRIMARY_KEY};
use crate::search::summarizer::Summarizer;

/// Columns results are ordered by, in priority order
#[derive(Debug, Clone, PartialEq)]
pub struct SortColumn {
    pub columns: Vec<String>,
    pub reverse: bool,
}

/// Search configuration bound to one relation
///
/// Every mutator checks the referenced column's capability right away,
/// so a model that was configured without error always composes into a
/// query the engine accepts.
pub struct SearchModel {
    relation: Arc<Relation>,
    primary_key: Option<String>,
    query_text: Option<String>,
    query_columns: Vec<QueryAttribute>,
    filters: Vec<FilterAttribute>,
    sort: Option<SortColumn>,
    hits_per_page: usize,
    summary_length: usize,
    summarizers: HashMap<String, Arc<dyn Summarizer>>,
}

impl SearchModel {
    pub fn new(relation: Arc<Relation>) -> Self {
        Self::with_config(relation, &Config::default())
    }

    pub fn with_config(relation: Arc<Relation>, config: &Config) -> Self {
        SearchModel {
            relation,
            primary_key: None,
            query_text: None,
            query_columns: Vec::new(),
            filters: Vec::new(),
            sort: None,
            hits_per_page: config.hits_per_page.max(1),
            summary_length: config.summary_length,
            summarizers: HashMap::new(),
        }
    }

    pub fn relation(&self) -> &Arc<Relation> {
        &self.relation
    }

    /// Limit every search to records under `key`; wildcards allowed
    pub fn set_primary_key(&mut self, key: &RecordKey) {
        self.primary_key = Some(key.encode());
    }

    pub fn clear_primary_key(&mut self) {
        self.primary_key = None;
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Shared keyword text for query columns without their own keyword
    pub fn set_query_text(&mut self, text: &str) {
        self.query_text = Some(text.to_string());
    }

    pub fn clear_query_text(&mut self) {
        self.query_text = None;
    }

    pub fn query_text(&self) -> Option<&str> {
        self.query_text.as_deref()
    }

    pub fn add_query_column(&mut self, attribute: QueryAttribute) -> Result<()> {
        let column = self.column(&attribute.column)?;
        if !column.is_searchable() {
            return Err(Error::validation(format!(
                "column '{}' cannot be queried: it must be indexable and tokenizable", column.name
            )));
        }
        self.query_columns.push(attribute);
        Ok(())
    }

    pub fn clear_query_columns(&mut self) {
        self.query_columns.clear();
    }

    /// Explicit query columns, or every queryable column when none were added
    pub fn query_attributes(&self) -> Vec<QueryAttribute> {
        if !self.query_columns.is_empty() {
            return self.query_columns.clone();
        }
        self.relation
            .queryable_columns()
            .map(|column| QueryAttribute::new(&column.name))
            .collect()
    }

    /// Checked against the relation right away, kind and value included
    pub fn add_filter(&mut self, filter: FilterAttribute) -> Result<()> {
        QueryComposer::new(&self.relation).filter_query(&filter)?;
        self.filters.push(filter);
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn filters(&self) -> &[FilterAttribute] {
        &self.filters
    }

    pub fn set_sort_column(&mut self, columns: &[&str], reverse: bool) -> Result<()> {
        if columns.is_empty() {
            return Err(Error::validation("sort needs at least one column"));
        }
        for name in columns {
            if *name == PRIMARY_KEY {
                continue;
            }
            let column = self.column(name)?;
            if !column.is_filterable() {
                return Err(Error::validation(format!(
                    "column '{}' cannot be sorted on: it must be indexable and not tokenizable",
                    column.name
                )));
            }
            // Sort values come from fast fields (indexed numbers) or stored values
            let readable = column.value_type != ValueType::Text || column.store_policy() != StorePolicy::None;
            if !readable {
                return Err(Error::validation(format!(
                    "column '{}' cannot be sorted on: its values are not stored", column.name
                )));
            }
        }

        self.sort = Some(SortColumn {
            columns: columns.iter().map(|name| name.to_string()).collect(),
            reverse,
        });
        Ok(())
    }

    pub fn clear_sort_column(&mut self) {
        self.sort = None;
    }

    pub fn sort_column(&self) -> Option<&SortColumn> {
        self.sort.as_ref()
    }

    pub fn set_hits_per_page(&mut self, hits_per_page: usize) -> Result<()> {
        if hits_per_page == 0 {
            return Err(Error::validation("hits per page must be positive"));
        }
        self.hits_per_page = hits_per_page;
        Ok(())
    }

    pub fn hits_per_page(&self) -> usize {
        self.hits_per_page
    }

    pub fn set_summary_length(&mut self, summary_length: usize) {
        self.summary_length = summary_length;
    }

    pub fn summary_length(&self) -> usize {
        self.summary_length
    }

    pub fn add_summarizer(&mut self, column: &str, summarizer: Arc<dyn Summarizer>) -> Result<()> {
        let column = self.column(column)?;
        if !column.storable && !column.compressible {
            return Err(Error::validation(format!(
                "column '{}' is not stored, there is nothing to summarize", column.name
            )));
        }
        self.summarizers.insert(column.name.clone(), summarizer);
        Ok(())
    }

    pub fn remove_summarizer(&mut self, column: &str) -> Option<Arc<dyn Summarizer>> {
        self.summarizers.remove(column)
    }

    /// Query for the current configuration
    ///
    /// The key scope, the filters and the analyzed text each become one
    /// required clause.
    pub fn compose(&self) -> Result<Query> {
        let mut composer = QueryComposer::new(&self.relation);

        if let Some(key) = &self.primary_key {
            composer.add_filter_clauses(&[FilterAttribute::equal(PRIMARY_KEY, key).essential()])?;
        }
        composer.add_filter_clauses(&self.filters)?;
        composer.add_analyzed_clauses(self.query_text.as_deref(), &self.query_attributes())?;

        debug!(relation = %self.relation.name, clauses = composer.len(), "search query composed");
        composer.build()
    }

    /// Words summarizers look for
    pub fn keywords(&self) -> Vec<String> {
        let mut texts: Vec<&str> = self
            .query_columns
            .iter()
            .filter_map(|attribute| attribute.keyword.as_deref())
            .collect();
        texts.extend(self.query_text.as_deref());

        let mut keywords = Vec::new();
        for text in texts {
            for word in plain_text(text).split_whitespace() {
                if !keywords.iter().any(|known: &String| known.eq_ignore_ascii_case(word)) {
                    keywords.push(word.to_string());
                }
            }
        }
        keywords
    }

    /// Records for the hits from `start` to `end`, both inclusive.
    /// `end` is clamped to the last hit.
    pub fn transplant_to_records(&self, hits: &Hits, start: usize, end: usize) -> Result<Vec<Record>> {
        if hits.is_empty() || start > end || start >= hits.len() {
            return Ok(Vec::new());
        }
        let end = end.min(hits.len() - 1);

        let mut records = Vec::with_capacity(end - start + 1);
        for i in start..=end {
            if let Some(document) = hits.doc(i)? {
                records.push(self.document_to_record(&document)?);
            }
        }
        Ok(records)
    }

    /// Inverse of the record to document mapping; unstored columns stay unset
    pub fn document_to_record(&self, document: &StoredDocument) -> Result<Record> {
        let mut record = Record::new();
        if let Some(key) = document.key() {
            record.set_primary_key_str(key, &self.relation)?;
        }
        for column in self.relation.columns() {
            if let Some(value) = document.get(&column.name) {
                record.add_column_value(&column.name, value);
            }
        }
        Ok(record)
    }

    /// Replace summarized column values in place
    pub fn summarize(&self, records: &mut [Record]) {
        if self.summarizers.is_empty() {
            return;
        }
        let keywords = self.keywords();

        for record in records.iter_mut() {
            for (column, summarizer) in &self.summarizers {
                let summary = record
                    .column_value(column)
                    .map(|value| summarizer.summarize(value, &keywords, self.summary_length));
                if let Some(summary) = summary {
                    record.add_column_value(column, summary);
                }
            }
        }
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.relation.column(name).ok_or_else(|| {
            Error::validation(format!(
                "column '{}' is not part of relation '{}'", name, self.relation.name
            ))
        })
    }
}
