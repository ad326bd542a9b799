use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use relix::analysis::analyzer::AnalyzerRegistry;
use relix::core::config::Config;
use relix::core::record::Record;
use relix::index::index_manager::IndexManager;
use relix::query::types::FilterAttribute;
use relix::schema::schema::{Column, Relation, ValueType};
use std::sync::Arc;
use tempfile::TempDir;

const WORDS: [&str; 8] = ["the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"];

fn relation(dir: &TempDir) -> Relation {
    Relation::new("bench", dir.path().join("bench"), "category:id")
        .add_column(Column::new("title").queryable())
        .add_column(Column::new("content").tokenized().compressed())
        .add_column(Column::new("score").value_type(ValueType::Integer).indexed())
}

fn open(dir: &TempDir) -> IndexManager {
    IndexManager::open(Arc::new(relation(dir)), &AnalyzerRegistry::new(), Config::default()).unwrap()
}

/// Helper to create test records
fn create_record(manager: &IndexManager, id: u64, content_size: usize) -> Record {
    let mut rng = rand::thread_rng();
    let content: String = (0..content_size)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ");

    let mut record = Record::new()
        .value("title", format!("Document {}", id))
        .value("content", content)
        .value("score", rng.gen_range(0..100).to_string());
    record
        .set_primary_key_str(&format!("category_{}:{}", id % 10, id), manager.relation())
        .unwrap();
    record
}

fn populated(dir: &TempDir, count: u64) -> IndexManager {
    let manager = open(dir);
    for id in 0..count {
        manager.insert(&create_record(&manager, id, 50)).unwrap();
    }
    manager
}

/// Benchmark single record insertion, one commit each
fn bench_single_insert(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let manager = open(&dir);

    c.bench_function("single_record_insert", |b| {
        let mut id = 0;
        b.iter(|| {
            manager.insert(&create_record(&manager, id, 100)).unwrap();
            id += 1;
        });
    });
}

fn bench_merge(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let manager = populated(&dir, 200);

    c.bench_function("merge_existing_record", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let record = create_record(&manager, rng.gen_range(0..200), 100);
            manager.merge(&record).unwrap();
        });
    });
}

/// Benchmark search at different index sizes
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for size in [100u64, 1_000] {
        let dir = TempDir::new().unwrap();
        let manager = populated(&dir, size);

        group.bench_with_input(BenchmarkId::new("text", size), &manager, |b, manager| {
            let mut model = manager.search_model();
            model.set_query_text("quick fox");
            b.iter(|| black_box(manager.search(&model, 1).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("filter_sorted", size), &manager, |b, manager| {
            let mut model = manager.search_model();
            model.add_filter(FilterAttribute::long_range("score", Some(10), Some(60)).essential()).unwrap();
            model.set_sort_column(&["score"], true).unwrap();
            b.iter(|| black_box(manager.search(&model, 2).unwrap()));
        });
    }

    group.finish();
}

fn bench_prefix_delete(c: &mut Criterion) {
    c.bench_function("prefix_delete", |b| {
        b.iter_with_setup(
            || {
                let dir = TempDir::new().unwrap();
                let manager = populated(&dir, 100);
                (dir, manager)
            },
            |(_dir, manager)| {
                let key = manager.relation().key("category_3:*").unwrap();
                black_box(manager.delete(&key).unwrap());
            },
        );
    });
}

criterion_group!(benches, bench_single_insert, bench_merge, bench_search, bench_prefix_delete);
criterion_main!(benches);
