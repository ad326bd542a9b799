use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::columnar::Column as FastColumn;
use tantivy::query::Query as EngineQuery;
use tantivy::schema::{OwnedValue, Value};
use tantivy::{DocAddress, Index, Score, Searcher, TantivyDocument};
use tracing::trace;
use crate::compression::compress::CompressedBlock;
use crate::core::error::Result;
use crate::index::engine::FieldMap;
use crate::query::ast::Query;
use crate::query::planner::QueryPlanner;
use crate::schema::schema::{Relation, ValueType, PRIMARY_KEY};

/// Point-in-time view of a relation's index
///
/// Sees the documents committed when it was acquired, no matter what
/// the writer does afterwards. Released on drop.
pub struct ReadView {
    searcher: Searcher,
    index: Index,
    fields: Arc<FieldMap>,
    relation: Arc<Relation>,
}

impl ReadView {
    pub(crate) fn new(searcher: Searcher, index: Index, fields: Arc<FieldMap>, relation: Arc<Relation>) -> Self {
        trace!(relation = %relation.name, "read view acquired");
        ReadView {
            searcher,
            index,
            fields,
            relation,
        }
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    pub fn num_docs(&self) -> u64 {
        self.searcher.num_docs()
    }

    pub fn count(&self, query: &Query) -> Result<usize> {
        let planned = self.plan(query)?;
        Ok(self.searcher.search(planned.as_ref(), &Count)?)
    }

    /// `limit` hits by score after skipping the best `offset`, plus
    /// the total number of matches
    pub fn search_page(&self, query: &Query, offset: usize, limit: usize) -> Result<Hits> {
        let planned = self.plan(query)?;
        let offset = offset.min(usize::try_from(self.num_docs()).unwrap_or(usize::MAX));
        let collector = (
            TopDocs::with_limit(limit.max(1)).and_offset(offset),
            TopDocs::with_limit(1),
            Count,
        );
        let (top, best, total) = self.searcher.search(planned.as_ref(), &collector)?;

        let entries = top
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (score, address))| Hit { ordinal: offset + i, score, address })
            .collect();

        Ok(Hits {
            searcher: self.searcher.clone(),
            fields: self.fields.clone(),
            entries,
            total,
            max_score: best.first().map_or(0.0, |(score, _)| *score),
        })
    }

    /// Every match in score order
    pub fn search_all(&self, query: &Query) -> Result<Hits> {
        let total = self.count(query)?;
        self.search_page(query, 0, total)
    }

    /// Encoded keys of every match, unscored and unordered
    pub fn keys(&self, query: &Query) -> Result<Vec<String>> {
        let planned = self.plan(query)?;
        let addresses = self.searcher.search(planned.as_ref(), &DocSetCollector)?;

        let mut keys = Vec::with_capacity(addresses.len());
        for address in addresses {
            let engine_doc: TantivyDocument = self.searcher.doc(address)?;
            if let Some(key) = engine_doc.get_first(self.fields.key).and_then(|value| value.as_str()) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }

    fn plan(&self, query: &Query) -> Result<Box<dyn EngineQuery>> {
        QueryPlanner::new(&self.index, &self.fields, &self.relation).plan(query)
    }
}

impl Drop for ReadView {
    fn drop(&mut self) {
        trace!(relation = %self.relation.name, "read view released");
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub ordinal: usize,   // Rank in the original score order
    pub score: Score,
    address: DocAddress,
}

/// Ranked hits of one search
pub struct Hits {
    searcher: Searcher,
    fields: Arc<FieldMap>,
    entries: Vec<Hit>,
    total: usize,
    max_score: Score,
}

impl Hits {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matches in the index, collected or not
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn get(&self, index: usize) -> Option<&Hit> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hit> {
        self.entries.iter()
    }

    /// Best score among all matches, collected or not
    pub fn max_score(&self) -> Score {
        self.max_score
    }

    /// Stored values of the hit at `index`
    pub fn doc(&self, index: usize) -> Result<Option<StoredDocument>> {
        match self.entries.get(index) {
            Some(hit) => self.load(hit.address).map(Some),
            None => Ok(None),
        }
    }

    /// Reorder by column values, missing values last.
    /// Hits with equal values keep their score order.
    ///
    /// Indexed numeric columns are read from fast fields, everything
    /// else from the stored document.
    pub fn sort_by_columns(&mut self, columns: &[String], reverse: bool, relation: &Relation) -> Result<()> {
        if columns.is_empty() || self.entries.len() < 2 {
            return Ok(());
        }

        let mut sources = Vec::with_capacity(columns.len());
        for name in columns {
            sources.push(self.sort_source(name)?);
        }

        let mut keyed = Vec::with_capacity(self.entries.len());
        for hit in &self.entries {
            let mut stored = None;
            let mut key = Vec::with_capacity(columns.len());
            for (name, source) in columns.iter().zip(&sources) {
                let value = match source {
                    SortSource::Fast(segments) => segments
                        .get(hit.address.segment_ord as usize)
                        .and_then(|column| column.value(hit.address.doc_id)),
                    SortSource::Stored => {
                        if stored.is_none() {
                            stored = Some(self.load(hit.address)?);
                        }
                        stored.as_ref().and_then(|document| SortValue::of(document, name, relation))
                    }
                };
                key.push(value);
            }
            keyed.push((key, *hit));
        }

        keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, reverse));
        self.entries = keyed.into_iter().map(|(_, hit)| hit).collect();
        Ok(())
    }

    fn sort_source(&self, name: &str) -> Result<SortSource> {
        let value_type = match self.fields.column(name) {
            Some(fields) if fields.indexed && fields.value_type != ValueType::Text => fields.value_type,
            _ => return Ok(SortSource::Stored),
        };

        let mut segments = Vec::new();
        for reader in self.searcher.segment_readers() {
            let fast_fields = reader.fast_fields();
            segments.push(match value_type {
                ValueType::Integer => FastValues::Integer(fast_fields.i64(name)?),
                _ => FastValues::Float(fast_fields.f64(name)?),
            });
        }
        Ok(SortSource::Fast(segments))
    }

    fn load(&self, address: DocAddress) -> Result<StoredDocument> {
        let engine_doc: TantivyDocument = self.searcher.doc(address)?;
        let key = engine_doc
            .get_first(self.fields.key)
            .and_then(|value| value.as_str())
            .map(String::from);

        let mut values = HashMap::new();
        for (name, fields) in self.fields.iter() {
            if let Some(packed) = fields.packed {
                if let Some(bytes) = engine_doc.get_first(packed).and_then(|value| value.as_bytes()) {
                    values.insert(name.to_string(), CompressedBlock::unpack_text(bytes)?);
                }
            } else if let (true, Some(main)) = (fields.stored_main, fields.main) {
                if let Some(text) = engine_doc.get_first(main).and_then(stored_text) {
                    values.insert(name.to_string(), text);
                }
            }
        }

        Ok(StoredDocument { key, values })
    }
}

enum SortSource {
    Fast(Vec<FastValues>),  // One column reader per segment
    Stored,
}

enum FastValues {
    Integer(FastColumn<i64>),
    Float(FastColumn<f64>),
}

impl FastValues {
    fn value(&self, doc: u32) -> Option<SortValue> {
        match self {
            FastValues::Integer(column) => column.first(doc).map(SortValue::Integer),
            FastValues::Float(column) => column.first(doc).map(SortValue::Number),
        }
    }
}

fn stored_text(value: &OwnedValue) -> Option<String> {
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }
    if let Some(number) = value.as_i64() {
        return Some(number.to_string());
    }
    value.as_f64().map(|number| number.to_string())
}

/// Values a hit carries back out of the index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredDocument {
    key: Option<String>,
    values: HashMap<String, String>,
}

impl StoredDocument {
    /// Encoded primary key
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Stored value by column name, or the key for `_key`
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == PRIMARY_KEY {
            return self.key();
        }
        self.values.get(name).map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl SortValue {
    fn of(document: &StoredDocument, name: &str, relation: &Relation) -> Option<SortValue> {
        let raw = document.get(name)?;
        let numeric = relation
            .column(name)
            .is_some_and(|column| column.value_type != ValueType::Text);

        if numeric {
            raw.trim().parse::<f64>().ok().map(SortValue::Number)
        } else {
            Some(SortValue::Text(raw.to_string()))
        }
    }

    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Integer(a), SortValue::Integer(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Text(_), _) => Ordering::Greater,
            (_, SortValue::Text(_)) => Ordering::Less,
            (a, b) => a.as_f64().total_cmp(&b.as_f64()),
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            SortValue::Integer(v) => *v as f64,
            SortValue::Number(v) => *v,
            SortValue::Text(_) => f64::NAN,
        }
    }
}

fn compare_keys(a: &[Option<SortValue>], b: &[Option<SortValue>], reverse: bool) -> Ordering {
    for (left, right) in a.iter().zip(b) {
        let ordering = match (left, right) {
            (Some(l), Some(r)) => {
                let ordering = l.compare(r);
                if reverse { ordering.reverse() } else { ordering }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(values: &[Option<f64>]) -> Vec<Option<SortValue>> {
        values.iter().map(|v| v.map(SortValue::Number)).collect()
    }

    #[test]
    fn missing_values_sort_last_both_ways() {
        let present = key(&[Some(1.0)]);
        let missing = key(&[None]);

        assert_eq!(compare_keys(&present, &missing, false), Ordering::Less);
        assert_eq!(compare_keys(&present, &missing, true), Ordering::Less);
    }

    #[test]
    fn reverse_flips_present_values() {
        let low = key(&[Some(1.0)]);
        let high = key(&[Some(2.0)]);

        assert_eq!(compare_keys(&low, &high, false), Ordering::Less);
        assert_eq!(compare_keys(&low, &high, true), Ordering::Greater);
    }

    #[test]
    fn integers_compare_without_float_rounding() {
        let high = vec![Some(SortValue::Integer(i64::MAX))];
        let lower = vec![Some(SortValue::Integer(i64::MAX - 1))];
        assert_eq!(compare_keys(&high, &lower, false), Ordering::Greater);
    }

    #[test]
    fn later_columns_break_ties() {
        let a = key(&[Some(1.0), Some(5.0)]);
        let b = key(&[Some(1.0), Some(3.0)]);
        assert_eq!(compare_keys(&a, &b, false), Ordering::Greater);
    }

    #[test]
    fn primary_key_lookup() {
        let document = StoredDocument {
            key: Some("a:1".into()),
            values: HashMap::from([("title".to_string(), "hello".to_string())]),
        };
        assert_eq!(document.get(PRIMARY_KEY), Some("a:1"));
        assert_eq!(document.get("title"), Some("hello"));
        assert_eq!(document.get("missing"), None);
    }
}
