use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use tantivy::merge_policy::LogMergePolicy;
use tantivy::query::Query as EngineQuery;
use tantivy::schema::{
    BytesOptions, Field, IndexRecordOption, NumericOptions, Schema, TextFieldIndexing, TextOptions,
    STORED, STRING,
};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};
use crate::analysis::analyzer::Analyzer;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result, ResultExt};
use crate::core::types::StorePolicy;
use crate::query::ast::Query;
use crate::query::planner::QueryPlanner;
use crate::reader::snapshot_reader::ReadView;
use crate::schema::schema::{Column, Relation, ValueType, PRIMARY_KEY};
use crate::writer::index_writer::EngineWriter;

/// Name prefix of the stored field holding a compressed column value
pub const PACKED_PREFIX: &str = "_z_";

/// File the engine writes once an index exists in a directory
const META_FILE: &str = "meta.json";

const RAW_TOKENIZER: &str = "raw";

/// Engine fields backing one relation column
#[derive(Debug, Clone, Copy)]
pub struct ColumnFields {
    pub main: Option<Field>,    // Indexed and/or plainly stored value
    pub packed: Option<Field>,  // Compressed stored value
    pub indexed: bool,
    pub stored_main: bool,      // `main` also keeps the value
    pub value_type: ValueType,
}

impl ColumnFields {
    pub fn is_stored(&self) -> bool {
        self.packed.is_some() || self.stored_main
    }
}

/// Resolved engine field handles of a relation
#[derive(Debug, Clone)]
pub struct FieldMap {
    pub key: Field,
    columns: HashMap<String, ColumnFields>,
}

impl FieldMap {
    fn resolve(schema: &Schema, relation: &Relation) -> Result<Self> {
        let lookup = |name: &str| {
            schema.get_field(name).map_err(|err| {
                Error::with_source(
                    ErrorKind::Configuration,
                    format!("index of relation '{}' has no field '{}'", relation.name, name),
                    err,
                )
            })
        };

        let key = lookup(PRIMARY_KEY)?;
        let mut columns = HashMap::with_capacity(relation.columns.len());

        for column in &relation.columns {
            let layout = FieldLayout::of(column);
            let main = if layout.main { Some(lookup(&column.name)?) } else { None };
            let packed = if layout.packed { Some(lookup(&packed_name(&column.name))?) } else { None };

            columns.insert(column.name.clone(), ColumnFields {
                main,
                packed,
                indexed: column.indexable,
                stored_main: layout.stored_main,
                value_type: column.value_type,
            });
        }

        Ok(FieldMap { key, columns })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnFields> {
        self.columns.get(name)
    }

    /// Indexed field behind a column name or the primary key
    pub fn indexed_field(&self, name: &str) -> Result<Field> {
        if name == PRIMARY_KEY {
            return Ok(self.key);
        }
        match self.columns.get(name) {
            Some(ColumnFields { main: Some(field), indexed: true, .. }) => Ok(*field),
            Some(_) => Err(Error::validation(format!("column '{}' is not indexed", name))),
            None => Err(Error::validation(format!("unknown column '{}'", name))),
        }
    }

    /// Value type of a column; the primary key is text
    pub fn value_type(&self, name: &str) -> ValueType {
        self.columns
            .get(name)
            .map(|fields| fields.value_type)
            .unwrap_or(ValueType::Text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnFields)> {
        self.columns.iter().map(|(name, fields)| (name.as_str(), fields))
    }
}

pub fn packed_name(column: &str) -> String {
    format!("{}{}", PACKED_PREFIX, column)
}

/// Which engine fields a column needs
struct FieldLayout {
    main: bool,
    stored_main: bool,
    packed: bool,
}

impl FieldLayout {
    fn of(column: &Column) -> Self {
        let store = column.store_policy();
        FieldLayout {
            main: column.indexable || store == StorePolicy::Stored,
            stored_main: store == StorePolicy::Stored,
            packed: store == StorePolicy::Compressed,
        }
    }
}

fn build_schema(relation: &Relation) -> Schema {
    let mut builder = Schema::builder();
    builder.add_text_field(PRIMARY_KEY, STRING | STORED);

    for column in &relation.columns {
        let layout = FieldLayout::of(column);

        if layout.main {
            match column.value_type {
                ValueType::Text => {
                    let mut options = TextOptions::default();
                    if column.indexable {
                        let indexing = if column.tokenizable {
                            TextFieldIndexing::default()
                                .set_tokenizer(&relation.analyzer)
                                .set_index_option(IndexRecordOption::WithFreqsAndPositions)
                        } else {
                            TextFieldIndexing::default()
                                .set_tokenizer(RAW_TOKENIZER)
                                .set_index_option(IndexRecordOption::Basic)
                        };
                        options = options.set_indexing_options(indexing);
                    }
                    if layout.stored_main {
                        options = options.set_stored();
                    }
                    builder.add_text_field(&column.name, options);
                }
                ValueType::Integer => {
                    builder.add_i64_field(&column.name, numeric_options(column, &layout));
                }
                ValueType::Float => {
                    builder.add_f64_field(&column.name, numeric_options(column, &layout));
                }
            }
        }

        if layout.packed {
            builder.add_bytes_field(&packed_name(&column.name), BytesOptions::default().set_stored());
        }
    }

    builder.build()
}

fn numeric_options(column: &Column, layout: &FieldLayout) -> NumericOptions {
    let mut options = NumericOptions::default();
    if column.indexable {
        options = options.set_indexed().set_fast();
    }
    if layout.stored_main {
        options = options.set_stored();
    }
    options
}

/// One relation's on-disk index plus its reader
pub struct IndexEngine {
    relation: Arc<Relation>,
    index: Index,
    fields: Arc<FieldMap>,
    reader: IndexReader,
}

impl IndexEngine {
    /// Open the relation's index, creating it when the directory holds none
    pub fn open(relation: Arc<Relation>, analyzer: &Analyzer) -> Result<Self> {
        let directory = &relation.directory;

        let index = if directory.join(META_FILE).exists() {
            debug!(relation = %relation.name, path = %directory.display(), "opening existing index");
            Index::open_in_dir(directory)
                .context(ErrorKind::IndexEngine, "cannot open index directory")?
        } else {
            info!(relation = %relation.name, path = %directory.display(), "creating index");
            fs::create_dir_all(directory)?;
            Index::create_in_dir(directory, build_schema(&relation))
                .context(ErrorKind::IndexEngine, "cannot create index")?
        };

        index.tokenizers().register(&relation.analyzer, analyzer.clone());

        let fields = Arc::new(FieldMap::resolve(&index.schema(), &relation)?);
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(IndexEngine {
            relation,
            index,
            fields,
            reader,
        })
    }

    pub fn relation(&self) -> &Arc<Relation> {
        &self.relation
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn fields(&self) -> &Arc<FieldMap> {
        &self.fields
    }

    /// Make the last commit visible to new read views
    pub fn reload(&self) -> Result<()> {
        self.reader.reload()?;
        Ok(())
    }

    pub fn writer(&self, config: &Config) -> Result<EngineWriter> {
        let threads = config.writer_threads.max(1);
        let writer: IndexWriter = self
            .index
            .writer_with_num_threads(threads, config.writer_memory_budget)
            .context(ErrorKind::IndexEngine, "cannot acquire index writer")?;

        let mut policy = LogMergePolicy::default();
        policy.set_min_num_segments(self.relation.merge.merge_factor);
        policy.set_max_docs_before_merge(self.relation.merge.max_merge_docs);
        writer.set_merge_policy(Box::new(policy));

        debug!(relation = %self.relation.name, threads, "index writer acquired");
        Ok(EngineWriter::new(writer, self.fields.clone(), self.relation.compression))
    }

    pub fn read_view(&self) -> ReadView {
        ReadView::new(
            self.reader.searcher(),
            self.index.clone(),
            self.fields.clone(),
            self.relation.clone(),
        )
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn plan(&self, query: &Query) -> Result<Box<dyn EngineQuery>> {
        QueryPlanner::new(&self.index, &self.fields, &self.relation).plan(query)
    }
}
