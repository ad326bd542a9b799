mod common;

use std::sync::Arc;
use common::Fixture;
use relix::core::error::ErrorKind;
use relix::core::record::Record;
use relix::query::types::{FilterAttribute, Occur, QueryAttribute};
use relix::schema::schema::{Column, Relation, ValueType, PRIMARY_KEY};
use relix::search::summarizer::{HeadSummarizer, KeywordSummarizer};

fn keys_of(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.primary_key().unwrap().encode())
        .collect()
}

#[test]
fn draft_then_published() {
    let fixture = Fixture::new(|dir| {
        Relation::new("doc", dir.join("doc"), "kind:id")
            .add_column(Column::new("title").queryable())
            .add_column(Column::new("status").indexed())
    });
    let relation = fixture.relation();

    let mut record = Record::new().value("title", "hello world").value("status", "draft");
    record.set_primary_key_str("doc:1", relation).unwrap();
    fixture.manager.insert(&record).unwrap();

    let search = |status: &str| {
        let mut model = fixture.manager.search_model();
        model.add_filter(FilterAttribute::equal("status", status)).unwrap();
        fixture.manager.search(&model, 1).unwrap()
    };

    let drafts = search("draft");
    assert_eq!(drafts.total_records, 1);
    assert_eq!(keys_of(&drafts.records), ["doc:1"]);
    assert_eq!(drafts.records[0].column_value("title"), Some("hello world"));

    record.add_column_value("status", "published");
    fixture.manager.update(&record).unwrap();

    assert_eq!(search("draft").total_records, 0);
    assert_eq!(keys_of(&search("published").records), ["doc:1"]);
}

fn library() -> Fixture {
    let fixture = Fixture::articles();
    let rows = [
        ("free:1", "Learning Rust ownership", "published", 120),
        ("free:2", "Async Rust with tokio", "published", 300),
        ("free:3", "Java streams in practice", "draft", 80),
        ("notice:1", "Rust release notes", "draft", 5),
        ("notice:2", "Maintenance window", "published", 40),
    ];
    for (key, title, status, views) in rows {
        fixture.manager.insert(&fixture.article(key, title, status, views)).unwrap();
    }
    fixture
}

#[test]
fn text_search_uses_queryable_columns() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.set_query_text("rust");

    let results = fixture.manager.search(&model, 1).unwrap();
    let mut keys = keys_of(&results.records);
    keys.sort();

    assert_eq!(keys, ["free:1", "free:2", "notice:1"]);
    assert!(results.max_score > 0.0);
}

#[test]
fn analyzer_stems_query_and_text() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.set_query_text("streaming");

    let results = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(keys_of(&results.records), ["free:3"]);
}

#[test]
fn explicit_column_keywords_and_occurs() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.add_query_column(QueryAttribute::new("title").keyword("rust").occur(Occur::Must)).unwrap();
    model.add_query_column(QueryAttribute::new("body").keyword("tokio").occur(Occur::MustNot)).unwrap();

    let results = fixture.manager.search(&model, 1).unwrap();
    let mut keys = keys_of(&results.records);
    keys.sort();
    assert_eq!(keys, ["free:1", "notice:1"]);
}

#[test]
fn text_and_filters_must_both_match() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.set_query_text("rust");
    model.add_filter(FilterAttribute::equal("status", "draft")).unwrap();

    let results = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(keys_of(&results.records), ["notice:1"]);
}

#[test]
fn numeric_range_filter() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.add_filter(FilterAttribute::long_range("views", Some(80), Some(300)).inclusive(true, false)).unwrap();

    let results = fixture.manager.search(&model, 1).unwrap();
    let mut keys = keys_of(&results.records);
    keys.sort();
    assert_eq!(keys, ["free:1", "free:3"]);
}

#[test]
fn essential_filter_is_required() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.add_filter(FilterAttribute::equal("status", "published").essential()).unwrap();
    model.add_filter(FilterAttribute::int_range("views", Some(100), None)).unwrap();

    let results = fixture.manager.search(&model, 1).unwrap();
    let mut keys = keys_of(&results.records);
    keys.sort();
    assert_eq!(keys, ["free:1", "free:2", "notice:2"]);
}

#[test]
fn optional_filters_need_one_match() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.add_filter(FilterAttribute::equal("status", "archived")).unwrap();
    model.add_filter(FilterAttribute::int_range("views", Some(200), None)).unwrap();

    let results = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(keys_of(&results.records), ["free:2"]);
}

#[test]
fn primary_key_scope_limits_results() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.set_primary_key(&fixture.relation().key("notice:*").unwrap());
    model.set_query_text("rust");

    let results = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(keys_of(&results.records), ["notice:1"]);
}

#[test]
fn sort_by_numeric_column() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.add_filter(FilterAttribute::equal(PRIMARY_KEY, "*")).unwrap();
    model.set_sort_column(&["views"], true).unwrap();

    let results = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(keys_of(&results.records), ["free:2", "free:1", "free:3", "notice:2", "notice:1"]);

    model.set_sort_column(&["status", PRIMARY_KEY], false).unwrap();
    let results = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(keys_of(&results.records), ["free:3", "notice:1", "free:1", "free:2", "notice:2"]);
}

#[test]
fn pages_split_the_hit_list() {
    let fixture = Fixture::articles();
    for i in 0..25 {
        let key = format!("free:{}", i);
        fixture.manager.insert(&fixture.article(&key, "paged", "draft", i)).unwrap();
    }

    let mut model = fixture.manager.search_model();
    model.add_filter(FilterAttribute::equal("status", "draft")).unwrap();
    model.set_sort_column(&["views"], false).unwrap();
    model.set_hits_per_page(10).unwrap();

    let first = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(first.records.len(), 10);
    assert_eq!(first.total_records, 25);
    assert_eq!(first.page_count(), 3);
    assert_eq!(first.records[0].column_value("views"), Some("0"));

    let last = fixture.manager.search(&model, 3).unwrap();
    assert_eq!(last.records.len(), 5);
    assert_eq!(last.records[0].column_value("views"), Some("20"));
    assert!(!last.has_next_page());

    let beyond = fixture.manager.search(&model, 4).unwrap();
    assert!(beyond.is_empty());
    assert_eq!(beyond.total_records, 25);
}

#[test]
fn summaries_shorten_values() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.set_query_text("tokio");
    model.set_summary_length(12);
    model.add_summarizer("title", Arc::new(HeadSummarizer::default())).unwrap();
    model.add_summarizer("body", Arc::new(KeywordSummarizer::default())).unwrap();

    let results = fixture.manager.search(&model, 1).unwrap();
    let record = &results.records[0];

    assert_eq!(record.column_value("title"), Some("Async Rust..."));
    assert!(record.column_value("body").unwrap().contains("tokio"));
}

#[test]
fn expert_mode_passes_query_syntax() {
    let fixture = Fixture::new(|dir| common::article_relation(dir).expert_query_mode(true));
    for (key, title) in [("free:1", "rust and java"), ("free:2", "rust alone")] {
        fixture.manager.insert(&fixture.article(key, title, "draft", 1)).unwrap();
    }

    let mut model = fixture.manager.search_model();
    model.set_query_text("+rust -java");
    let results = fixture.manager.search(&model, 1).unwrap();

    assert_eq!(keys_of(&results.records), ["free:2"]);
}

#[test]
fn assisted_mode_reads_syntax_as_words() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.set_query_text("title:(tokio");

    let results = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(keys_of(&results.records), ["free:2"]);
}

#[test]
fn empty_model_cannot_search() {
    let fixture = library();
    let model = fixture.manager.search_model();

    let err = fixture.manager.search(&model, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyQuery);
}

#[test]
fn read_view_is_a_snapshot() {
    let fixture = library();
    let view = fixture.manager.read_view();

    fixture.manager.insert(&fixture.article("free:99", "late", "draft", 1)).unwrap();

    assert_eq!(view.num_docs(), 5);
    assert_eq!(fixture.manager.num_docs(), 6);
}

#[test]
fn float_range_filter() {
    let fixture = library();
    let mut model = fixture.manager.search_model();
    model.add_filter(FilterAttribute::double_range("rating", Some(4.0), Some(5.0))).unwrap();
    assert_eq!(fixture.manager.search(&model, 1).unwrap().total_records, 5);

    model.clear_filters();
    model.add_filter(FilterAttribute::double_range("rating", Some(4.5), None).inclusive(false, true)).unwrap();
    assert_eq!(fixture.manager.search(&model, 1).unwrap().total_records, 0);
}

#[test]
fn range_kind_must_fit_the_column() {
    let fixture = library();
    let mut model = fixture.manager.search_model();

    let err = model.add_filter(FilterAttribute::float_range("views", Some(1.0), None)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = model.add_filter(FilterAttribute::equal("views", "many")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(model.filters().is_empty());
}

fn numbered(count: i64) -> Fixture {
    let fixture = Fixture::articles();
    for i in 0..count {
        let key = format!("free:{}", i);
        fixture.manager.insert(&fixture.article(&key, "numbered", "draft", i)).unwrap();
    }
    fixture
}

fn views_of(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|record| record.column_value("views").unwrap())
        .collect()
}

#[test]
fn sorted_pages_cover_every_match() {
    let fixture = numbered(12);
    let mut model = fixture.manager.search_model();
    model.add_filter(FilterAttribute::equal("status", "draft")).unwrap();
    model.set_sort_column(&["views"], true).unwrap();
    model.set_hits_per_page(5).unwrap();

    let first = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(views_of(&first.records), ["11", "10", "9", "8", "7"]);
    assert_eq!(first.total_records, 12);

    let last = fixture.manager.search(&model, 3).unwrap();
    assert_eq!(views_of(&last.records), ["1", "0"]);
}

#[test]
fn unsorted_pages_come_from_the_engine_offset() {
    let fixture = numbered(12);
    let mut model = fixture.manager.search_model();
    model.add_filter(FilterAttribute::equal("status", "draft")).unwrap();
    model.set_hits_per_page(5).unwrap();

    let mut seen = Vec::new();
    for page in 1..=3 {
        let results = fixture.manager.search(&model, page).unwrap();
        assert_eq!(results.total_records, 12);
        seen.extend(keys_of(&results.records));
    }
    assert_eq!(seen.len(), 12);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 12);
}

#[test]
fn indexed_numbers_sort_without_being_stored() {
    let fixture = Fixture::new(|dir| {
        Relation::new("player", dir.join("player"), "team:no")
            .add_column(Column::new("name").indexed())
            .add_column(Column::new("rank").value_type(ValueType::Integer).indexed().stored(false))
    });
    for (key, rank) in [("a:1", 3), ("b:1", 1), ("c:1", 2)] {
        let mut record = Record::new().value("name", "player").value("rank", rank.to_string());
        record.set_primary_key_str(key, fixture.relation()).unwrap();
        fixture.manager.insert(&record).unwrap();
    }

    let mut model = fixture.manager.search_model();
    model.add_filter(FilterAttribute::equal("name", "player")).unwrap();
    model.set_sort_column(&["rank"], false).unwrap();

    let results = fixture.manager.search(&model, 1).unwrap();
    assert_eq!(keys_of(&results.records), ["b:1", "c:1", "a:1"]);
    assert_eq!(results.records[0].column_value("rank"), None);
}
