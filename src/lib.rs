pub mod core;
pub mod schema;
pub mod analysis;
pub mod compression;
pub mod index;
pub mod writer;
pub mod reader;
pub mod query;
pub mod search;

/*
┌──────────────────────────────────────────────────────────────────────────────────────────┐
│                               RELIX STRUCT ARCHITECTURE                                   │
└──────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────────── SCHEMA LAYER ────────────────────────────────────┐
│                                                                                          │
│  ┌──────────────────────────────┐  ┌───────────────────────┐  ┌──────────────────────┐  │
│  │ struct Relation              │  │ struct Column         │  │ struct RecordKey     │  │
│  │ • name, directory            │  │ • name, value_type    │  │ • template           │  │
│  │ • key_pattern, key_delimiter │  │ • indexable           │  │ • values: Vec<String>│  │
│  │ • columns: Vec<Column>       │  │ • tokenizable         │  │ • encode / decode    │  │
│  │ • analyzer: String           │  │ • storable            │  │ • delete_strategy()  │  │
│  │ • merge: MergeSettings       │  │ • compressible        │  └──────────────────────┘  │
│  │ • compression                │  │ • queryable, boost    │                            │
│  │ • expert_query_mode          │  └───────────────────────┘  ┌──────────────────────┐  │
│  └──────────────────────────────┘                             │ enum DeleteStrategy  │  │
│                                    ┌───────────────────────┐  │ • Exact(key)         │  │
│  ┌──────────────────────────────┐  │ struct Record         │  │ • Prefix(prefix)     │  │
│  │ struct KeyTemplate           │  │ • primary_key         │  │ • Pattern(pattern)   │  │
│  │ • segments, delimiter        │  │ • values: HashMap     │  └──────────────────────┘  │
│  └──────────────────────────────┘  └───────────────────────┘                            │
└──────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────────── INDEXING LAYER ──────────────────────────────────┐
│                                                                                          │
│  ┌────────────────────────────────────────────────────────────────────────────────┐     │
│  │                           struct IndexManager                                   │     │
│  │  relation: Arc<Relation>          // Shared, read-only after open               │     │
│  │  config: Config                   // Writer budget, paging defaults             │     │
│  │  analyzer: Arc<Analyzer>          // Registered with the engine as tokenizer    │     │
│  │  state: Mutex<ManagerState>       // Serializes every mutation                  │     │
│  │    ├─ engine: IndexEngine                                                       │     │
│  │    └─ writer: Option<EngineWriter>                                              │     │
│  └────────────────────────────────────────────────────────────────────────────────┘     │
│                                                                                          │
│  ┌────────────────────────┐  ┌────────────────────────┐  ┌────────────────────────┐     │
│  │ struct IndexEngine     │  │ struct EngineWriter    │  │ struct FieldMap        │     │
│  │ • index: tantivy Index │  │ • writer: IndexWriter  │  │ • key: Field           │     │
│  │ • reader: IndexReader  │  │ • fields: Arc<FieldMap>│  │ • columns: name →      │     │
│  │ • fields: Arc<FieldMap>│  │ • compression          │  │   ColumnFields         │     │
│  └────────────────────────┘  └────────────────────────┘  └────────────────────────┘     │
└──────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────────── SEARCH LAYER ────────────────────────────────────┐
│                                                                                          │
│  ┌───────────────────────┐  ┌────────────────────────┐  ┌────────────────────────────┐  │
│  │ struct SearchModel    │  │ struct QueryComposer   │  │ struct QueryPlanner        │  │
│  │ • primary_key scope   │  │ • clauses: Vec<Query>  │  │ • Query → tantivy Query    │  │
│  │ • query_columns       │  └────────────────────────┘  └────────────────────────────┘  │
│  │ • filters, sort       │                                                              │
│  │ • hits_per_page       │  ┌────────────────────────┐  ┌────────────────────────────┐  │
│  │ • summarizers         │  │ struct ReadView        │  │ struct SearchResults       │  │
│  └───────────────────────┘  │ • searcher (snapshot)  │  │ • records: Vec<Record>     │  │
│                             │ • count / search       │  │ • total_records, page      │  │
│  ┌───────────────────────┐  └────────────────────────┘  │ • max_score, took_ms       │  │
│  │ enum Query (AST)      │                              └────────────────────────────┘  │
│  │ • Term  • Prefix      │  ┌────────────────────────┐                                  │
│  │ • Wildcard  • Range   │  │ struct Hits            │                                  │
│  │ • Bool  • Parsed      │  │ • entries: Vec<Hit>    │                                  │
│  └───────────────────────┘  │ • total                │                                  │
│                             └────────────────────────┘                                  │
└──────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────────── RELATIONSHIPS ───────────────────────────────────┐
│                                                                                          │
│  Record ──record_to_document──> Document ──EngineWriter──> tantivy segment               │
│                                                                                          │
│  IndexManager ──owns──> IndexEngine ──creates──> ReadView ──plans_with──> QueryPlanner   │
│       │                                                                                  │
│       └──owns──> EngineWriter (single writer, commit per mutation)                       │
│                                                                                          │
│  SearchModel ──compose──> QueryComposer ──build──> Query                                 │
│       │                                                                                  │
│       └──QueryExecutor──> ReadView::search ──> Hits ──transplant_to_records──> Record    │
│                                                                                          │
│  Analyzer ──tokenizer + filters──> tantivy TextAnalyzer (registered by relation name)    │
│                                                                                          │
└──────────────────────────────────────────────────────────────────────────────────────────┘
*/
