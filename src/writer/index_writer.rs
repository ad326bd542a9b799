use std::sync::Arc;
use tantivy::query::Query as EngineQuery;
use tantivy::{Index, IndexWriter, TantivyDocument, Term};
use tracing::{debug, warn};
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::error::{Error, Result};
use crate::core::types::{Document, FieldValue};
use crate::index::engine::FieldMap;
use crate::schema::schema::{ValueType, PRIMARY_KEY};

/// Single writer of one relation's index
///
/// Buffered operations become visible only after `commit`; a failed
/// commit is rolled back so the writer never carries half a batch into
/// the next one.
pub struct EngineWriter {
    writer: IndexWriter,
    fields: Arc<FieldMap>,
    compression: CompressionType,
    pending: usize,
}

impl EngineWriter {
    pub(crate) fn new(writer: IndexWriter, fields: Arc<FieldMap>, compression: CompressionType) -> Self {
        EngineWriter {
            writer,
            fields,
            compression,
            pending: 0,
        }
    }

    pub fn add_document(&mut self, document: &Document) -> Result<()> {
        let engine_doc = self.engine_document(document)?;
        self.writer.add_document(engine_doc)?;
        self.pending += 1;
        Ok(())
    }

    /// Buffer removal of the record stored under `key`
    pub fn delete_key(&mut self, key: &str) {
        self.writer.delete_term(Term::from_field_text(self.fields.key, key));
        self.pending += 1;
    }

    /// Buffer removal of every document the query matches
    pub fn delete_matching(&mut self, query: Box<dyn EngineQuery>) -> Result<()> {
        self.writer.delete_query(query)?;
        self.pending += 1;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        match self.writer.commit() {
            Ok(opstamp) => {
                debug!(opstamp, operations = self.pending, "index commit");
                self.pending = 0;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, operations = self.pending, "commit failed, rolling back");
                self.rollback()?;
                Err(err.into())
            }
        }
    }

    /// Drop everything buffered since the last commit
    pub fn rollback(&mut self) -> Result<()> {
        self.writer.rollback()?;
        self.pending = 0;
        Ok(())
    }

    /// Merge all searchable segments into one and drop unused files
    pub fn merge_all(&mut self, index: &Index) -> Result<()> {
        let segments = index.searchable_segment_ids()?;
        if segments.len() > 1 {
            self.writer.merge(&segments).wait()?;
            debug!(merged = segments.len(), "segments merged");
        }
        self.writer.garbage_collect_files().wait()?;
        Ok(())
    }

    /// Wait for background merges and release the index lock
    pub fn close(self) -> Result<()> {
        if self.pending > 0 {
            warn!(operations = self.pending, "closing writer with uncommitted operations");
        }
        self.writer.wait_merging_threads()?;
        Ok(())
    }

    fn engine_document(&self, document: &Document) -> Result<TantivyDocument> {
        let mut engine_doc = TantivyDocument::default();

        for field in &document.fields {
            if field.name == PRIMARY_KEY {
                match &field.value {
                    FieldValue::Text(key) => engine_doc.add_text(self.fields.key, key),
                    other => {
                        return Err(Error::validation(format!("primary key must be text, got {}", other)));
                    }
                }
                continue;
            }

            let target = self.fields.column(&field.name).ok_or_else(|| {
                Error::validation(format!("document field '{}' has no column", field.name))
            })?;

            if let Some(main) = target.main {
                match (target.value_type, &field.value) {
                    (ValueType::Text, FieldValue::Text(text)) => engine_doc.add_text(main, text),
                    (ValueType::Integer, FieldValue::Integer(value)) => engine_doc.add_i64(main, *value),
                    (ValueType::Float, FieldValue::Float(value)) => engine_doc.add_f64(main, *value),
                    (ValueType::Float, FieldValue::Integer(value)) => engine_doc.add_f64(main, *value as f64),
                    (value_type, value) => {
                        return Err(Error::validation(format!(
                            "field '{}' expects {:?}, got '{}'", field.name, value_type, value
                        )));
                    }
                }
            }

            if let Some(packed) = target.packed {
                let bytes = CompressedBlock::pack_text(&field.value.to_string(), self.compression)?;
                engine_doc.add_bytes(packed, bytes.as_slice());
            }
        }

        Ok(engine_doc)
    }
}
