use std::fs;
use std::sync::Arc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use crate::analysis::analyzer::{Analyzer, AnalyzerRegistry};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result, ResultExt};
use crate::core::record::Record;
use crate::core::types::{Document, Field, FieldValue, IndexPolicy, StorePolicy};
use crate::index::engine::IndexEngine;
use crate::query::ast::Query;
use crate::reader::snapshot_reader::ReadView;
use crate::schema::key::{DeleteStrategy, RecordKey};
use crate::schema::schema::{Column, Relation, ValueType, PRIMARY_KEY};
use crate::search::executor::QueryExecutor;
use crate::search::model::SearchModel;
use crate::search::results::SearchResults;
use crate::writer::index_writer::EngineWriter;

/// Owner of one relation's index and its single writer
///
/// Mutations are serialized on an internal lock and each one is
/// committed before it returns, so a following `exists` or search
/// observes it. Reads go through short-lived [`ReadView`]s and never
/// wait for the writer beyond acquiring the view.
pub struct IndexManager {
    relation: Arc<Relation>,
    config: Config,
    analyzer: Arc<Analyzer>,
    state: Mutex<ManagerState>,
}

struct ManagerState {
    engine: IndexEngine,
    writer: Option<EngineWriter>,  // None only while optimize/destroy swap it
    broken: bool,                  // Last destroy could not recreate the index
}

impl ManagerState {
    fn ensure_usable(&self) -> Result<()> {
        if self.broken {
            return Err(Error::engine("index could not be recreated; destroy it again"));
        }
        Ok(())
    }

    fn writer(&mut self, config: &Config) -> Result<&mut EngineWriter> {
        self.ensure_usable()?;
        if self.writer.is_none() {
            self.writer = Some(self.engine.writer(config)?);
        }
        self.writer
            .as_mut()
            .ok_or_else(|| Error::engine("index writer is unavailable"))
    }
}

impl IndexManager {
    pub fn open(relation: Arc<Relation>, analyzers: &AnalyzerRegistry, config: Config) -> Result<Self> {
        relation.validate()?;
        let analyzer = analyzers.resolve(&relation.analyzer)?;

        let engine = IndexEngine::open(relation.clone(), &analyzer)?;
        let writer = engine.writer(&config)?;

        info!(
            relation = %relation.name,
            path = %relation.directory.display(),
            documents = engine.num_docs(),
            "index manager opened"
        );

        Ok(IndexManager {
            relation,
            config,
            analyzer,
            state: Mutex::new(ManagerState {
                engine,
                writer: Some(writer),
                broken: false,
            }),
        })
    }

    pub fn relation(&self) -> &Arc<Relation> {
        &self.relation
    }

    pub fn analyzer(&self) -> &Arc<Analyzer> {
        &self.analyzer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Add a record whose key is not indexed yet
    pub fn insert(&self, record: &Record) -> Result<()> {
        let key = record.require_key()?;
        key.ensure_concrete()?;
        let document = record_to_document(&self.relation, record)?;
        let encoded = key.encode();

        let mut state = self.state.lock();
        if count_key(&state.engine.read_view(), &encoded)? > 0 {
            return Err(Error::duplicate_key(format!(
                "key '{}' already exists in relation '{}'", encoded, self.relation.name
            )));
        }

        self.apply(&mut state, "insert", |writer| writer.add_document(&document))?;
        debug!(relation = %self.relation.name, key = %encoded, "record inserted");
        Ok(())
    }

    /// Replace the record stored under the key in one commit
    pub fn update(&self, record: &Record) -> Result<()> {
        let key = record.require_key()?;
        key.ensure_concrete()?;
        let document = record_to_document(&self.relation, record)?;
        let encoded = key.encode();

        let mut state = self.state.lock();
        self.replace(&mut state, &encoded, &document)?;
        debug!(relation = %self.relation.name, key = %encoded, "record updated");
        Ok(())
    }

    /// Insert or update, whichever leaves exactly one document for the key
    pub fn merge(&self, record: &Record) -> Result<()> {
        let key = record.require_key()?;
        key.ensure_concrete()?;
        let document = record_to_document(&self.relation, record)?;
        let encoded = key.encode();

        let mut state = self.state.lock();
        let existing = count_key(&state.engine.read_view(), &encoded)?;
        if existing == 0 {
            self.apply(&mut state, "merge", |writer| writer.add_document(&document))?;
        } else {
            self.replace(&mut state, &encoded, &document)?;
        }
        debug!(relation = %self.relation.name, key = %encoded, existing, "record merged");
        Ok(())
    }

    /// Remove every record the key matches; wildcards allowed.
    /// Returns the number of documents removed.
    pub fn delete(&self, key: &RecordKey) -> Result<u64> {
        let strategy = key.delete_strategy();
        let mut state = self.state.lock();
        let before = state.engine.num_docs();

        match &strategy {
            DeleteStrategy::Exact(encoded) => {
                self.apply(&mut state, "delete", |writer| {
                    writer.delete_key(encoded);
                    Ok(())
                })?;
            }
            DeleteStrategy::Prefix(prefix) => {
                let query = state.engine.plan(&Query::prefix(PRIMARY_KEY, prefix))?;
                self.apply(&mut state, "delete", |writer| writer.delete_matching(query))?;
            }
            DeleteStrategy::Pattern(pattern) => {
                let keys = matching_keys(&state.engine.read_view(), pattern)?;
                self.apply(&mut state, "delete", |writer| {
                    for matched in &keys {
                        writer.delete_key(matched);
                    }
                    Ok(())
                })?;
            }
        }

        let removed = before.saturating_sub(state.engine.num_docs());
        debug!(relation = %self.relation.name, key = %key, ?strategy, removed, "records deleted");
        Ok(removed)
    }

    pub fn exists(&self, key: &RecordKey) -> Result<bool> {
        key.ensure_concrete()?;
        let encoded = key.encode();

        let view = self.read_view();
        let count = count_key(&view, &encoded)?;
        if count > 1 {
            warn!(relation = %self.relation.name, key = %encoded, count, "key is indexed more than once");
        }
        Ok(count == 1)
    }

    /// Merge the index down to one segment; blocks until done
    pub fn optimize(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.ensure_usable()?;

        if let Some(writer) = state.writer.take() {
            writer.close()?;
        }
        let mut writer = state.engine.writer(&self.config)?;
        writer.merge_all(state.engine.index())?;
        state.writer = Some(writer);
        state.engine.reload()?;

        info!(relation = %self.relation.name, documents = state.engine.num_docs(), "index optimized");
        Ok(())
    }

    /// Drop every document and start over from an empty directory
    pub fn destroy(&self) -> Result<()> {
        let mut state = self.state.lock();

        if let Some(writer) = state.writer.take() {
            if let Err(err) = writer.close() {
                warn!(relation = %self.relation.name, error = %err, "writer close failed during destroy");
            }
        }

        let directory = &self.relation.directory;
        match self.recreate() {
            Ok((engine, writer)) => {
                state.engine = engine;
                state.writer = Some(writer);
                state.broken = false;
                info!(relation = %self.relation.name, path = %directory.display(), "index destroyed and recreated");
                Ok(())
            }
            Err(err) => {
                // The old engine points at a removed directory; refuse writes until a destroy succeeds
                state.broken = true;
                warn!(relation = %self.relation.name, path = %directory.display(), error = %err, "index recreation failed");
                Err(Error::with_source(ErrorKind::IndexEngine, "cannot recreate index", err))
            }
        }
    }

    fn recreate(&self) -> Result<(IndexEngine, EngineWriter)> {
        let directory = &self.relation.directory;
        if directory.is_dir() {
            fs::remove_dir_all(directory).context(ErrorKind::IndexEngine, "cannot remove index directory")?;
        }
        let engine = IndexEngine::open(self.relation.clone(), &self.analyzer)?;
        let writer = engine.writer(&self.config)?;
        Ok((engine, writer))
    }

    /// Release the writer; the manager is gone afterwards
    pub fn close(self) -> Result<()> {
        let state = self.state.into_inner();
        if let Some(writer) = state.writer {
            writer.close()?;
        }
        info!(relation = %self.relation.name, "index manager closed");
        Ok(())
    }

    /// Read view over the last committed state
    pub fn read_view(&self) -> ReadView {
        self.state.lock().engine.read_view()
    }

    pub fn num_docs(&self) -> u64 {
        self.state.lock().engine.num_docs()
    }

    /// Search model bound to this relation with the manager's defaults
    pub fn search_model(&self) -> SearchModel {
        SearchModel::with_config(self.relation.clone(), &self.config)
    }

    pub fn search(&self, model: &SearchModel, page: usize) -> Result<SearchResults> {
        let view = self.read_view();
        QueryExecutor::new(&view).execute(model, page)
    }

    fn replace(&self, state: &mut ManagerState, encoded: &str, document: &Document) -> Result<()> {
        self.apply(state, "update", |writer| {
            writer.delete_key(encoded);
            writer.add_document(document)
        })
    }

    /// Run buffered writer operations and commit them as one unit
    fn apply<F>(&self, state: &mut ManagerState, operation: &str, ops: F) -> Result<()>
    where
        F: FnOnce(&mut EngineWriter) -> Result<()>,
    {
        let writer = state.writer(&self.config)?;

        if let Err(err) = ops(writer) {
            if let Err(rollback_err) = writer.rollback() {
                warn!(
                    relation = %self.relation.name,
                    operation,
                    error = %rollback_err,
                    "rollback after failed operation did not complete"
                );
            }
            return Err(err);
        }

        writer.commit()?;
        state.engine.reload()
    }
}

fn count_key(view: &ReadView, encoded: &str) -> Result<usize> {
    view.count(&Query::text_term(PRIMARY_KEY, encoded))
}

fn matching_keys(view: &ReadView, pattern: &str) -> Result<Vec<String>> {
    view.keys(&Query::wildcard(PRIMARY_KEY, pattern))
}

/// Map a record onto an engine document
///
/// Every relation column needs a value. Store and index policies and
/// the boost come from the column declaration.
pub fn record_to_document(relation: &Relation, record: &Record) -> Result<Document> {
    record.validate(relation)?;
    let key = record.require_key()?;

    let mut document = Document::new();
    document.add_field(Field {
        name: PRIMARY_KEY.to_string(),
        value: FieldValue::Text(key.encode()),
        store: StorePolicy::Stored,
        index: IndexPolicy::Exact,
        boost: 1.0,
    });

    for column in relation.columns() {
        let raw = record.column_value(&column.name).ok_or_else(|| {
            Error::validation(format!(
                "record '{}' has no value for column '{}'", key, column.name
            ))
        })?;

        document.add_field(Field {
            name: column.name.clone(),
            value: typed_value(column, raw)?,
            store: column.store_policy(),
            index: column.index_policy(),
            boost: column.boost,
        });
    }

    Ok(document)
}

fn typed_value(column: &Column, raw: &str) -> Result<FieldValue> {
    let context = || format!("value '{}' of column '{}' is not {:?}", raw, column.name, column.value_type);
    Ok(match column.value_type {
        ValueType::Text => FieldValue::Text(raw.to_string()),
        ValueType::Integer => FieldValue::Integer(raw.trim().parse::<i64>().context(ErrorKind::Validation, &context())?),
        ValueType::Float => FieldValue::Float(raw.trim().parse::<f64>().context(ErrorKind::Validation, &context())?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation() -> Relation {
        Relation::new("post", "/tmp/post", "board:no")
            .add_column(Column::new("title").queryable().boost(2.0))
            .add_column(Column::new("body").tokenized().compressed())
            .add_column(Column::new("views").value_type(ValueType::Integer).indexed())
            .add_column(Column::new("memo").stored(false))
    }

    fn record(relation: &Relation) -> Record {
        let mut record = Record::new()
            .value("title", "hello")
            .value("body", "long text")
            .value("views", "7")
            .value("memo", "internal");
        record.set_primary_key_str("free:1", relation).unwrap();
        record
    }

    #[test]
    fn document_carries_column_policies() {
        let relation = relation();
        let document = record_to_document(&relation, &record(&relation)).unwrap();

        let key = document.get_field(PRIMARY_KEY).unwrap();
        assert_eq!(key.value, FieldValue::Text("free:1".into()));
        assert_eq!((key.store, key.index), (StorePolicy::Stored, IndexPolicy::Exact));

        let title = document.get_field("title").unwrap();
        assert_eq!(title.index, IndexPolicy::Tokenized);
        assert_eq!(title.boost, 2.0);

        assert_eq!(document.get_field("body").unwrap().store, StorePolicy::Compressed);
        assert_eq!(document.get_field("views").unwrap().value, FieldValue::Integer(7));

        let memo = document.get_field("memo").unwrap();
        assert_eq!((memo.store, memo.index), (StorePolicy::None, IndexPolicy::None));
    }

    #[test]
    fn every_column_needs_a_value() {
        let relation = relation();
        let mut record = record(&relation);
        record.remove_column_value("memo");

        let err = record_to_document(&relation, &record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn record_without_key_cannot_be_mapped() {
        let relation = relation();
        let record = Record::new().value("title", "x");
        assert_eq!(record_to_document(&relation, &record).unwrap_err().kind(), ErrorKind::Validation);
    }
}
