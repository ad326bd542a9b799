#![allow(dead_code)]

use std::sync::Arc;
use relix::analysis::analyzer::AnalyzerRegistry;
use relix::core::config::Config;
use relix::core::record::Record;
use relix::index::index_manager::IndexManager;
use relix::query::ast::Query;
use relix::schema::schema::{Column, Relation, ValueType, PRIMARY_KEY};
use tempfile::TempDir;

/// Manager over a relation stored in its own temporary directory
pub struct Fixture {
    pub dir: TempDir,
    pub manager: IndexManager,
}

impl Fixture {
    pub fn new(build: impl FnOnce(&std::path::Path) -> Relation) -> Self {
        let dir = TempDir::new().unwrap();
        let relation = build(dir.path());
        let manager = open(relation);
        Fixture { dir, manager }
    }

    pub fn articles() -> Self {
        Fixture::new(article_relation)
    }

    pub fn relation(&self) -> &Relation {
        self.manager.relation()
    }

    pub fn article(&self, key: &str, title: &str, status: &str, views: i64) -> Record {
        article(self.relation(), key, title, status, views)
    }

    /// Encoded keys currently indexed, sorted
    pub fn keys(&self) -> Vec<String> {
        let view = self.manager.read_view();
        let mut keys = view.keys(&Query::wildcard(PRIMARY_KEY, "*")).unwrap();
        keys.sort();
        keys
    }
}

pub fn test_config() -> Config {
    Config {
        writer_memory_budget: 20_000_000,
        ..Config::default()
    }
}

pub fn open(relation: Relation) -> IndexManager {
    IndexManager::open(Arc::new(relation), &AnalyzerRegistry::new(), test_config()).unwrap()
}

pub fn article_relation(dir: &std::path::Path) -> Relation {
    Relation::new("article", dir.join("article"), "board:no")
        .add_column(Column::new("title").queryable().boost(2.0))
        .add_column(Column::new("body").tokenized().compressed())
        .add_column(Column::new("status").indexed())
        .add_column(Column::new("views").value_type(ValueType::Integer).indexed())
        .add_column(Column::new("rating").value_type(ValueType::Float).indexed())
        .add_column(Column::new("memo").stored(false))
}

pub fn article(relation: &Relation, key: &str, title: &str, status: &str, views: i64) -> Record {
    let mut record = Record::new()
        .value("title", title)
        .value("body", format!("{} explained at length", title))
        .value("status", status)
        .value("views", views.to_string())
        .value("rating", "4.5")
        .value("memo", "editor only");
    record.set_primary_key_str(key, relation).unwrap();
    record
}
