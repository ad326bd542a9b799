/// Relix API demo
///
/// Walks through the life of one relation:
/// - insert, update, merge and delete records by key
/// - text search, filters and sorting through a SearchModel
/// - optimize and close

use relix::analysis::analyzer::AnalyzerRegistry;
use relix::core::config::Config;
use relix::core::record::Record;
use relix::index::index_manager::IndexManager;
use relix::query::types::FilterAttribute;
use relix::schema::schema::{Column, Relation, ValueType};
use relix::search::results::SearchResults;
use relix::search::summarizer::HeadSummarizer;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("\n╔═══════════════════════════════════════════════╗");
    println!("║          Relix - Relation Index Demo          ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    // Step 1: Describe and open the relation
    println!("Step 1: Opening relation...");
    let dir = tempfile::TempDir::new()?;
    let relation = Relation::new("article", dir.path().join("article"), "board:no")
        .add_column(Column::new("title").queryable().boost(2.0))
        .add_column(Column::new("body").tokenized().compressed())
        .add_column(Column::new("status").indexed())
        .add_column(Column::new("views").value_type(ValueType::Integer).indexed());
    let manager = IndexManager::open(Arc::new(relation), &AnalyzerRegistry::new(), Config::default())?;
    println!("  Opened '{}'\n", manager.relation().name);

    // Step 2: INSERT
    println!("Step 2: INSERT - Adding records...");
    let rows = [
        ("free:1", "Rust Programming", "Learn the Rust language from ownership to async", "published", 120),
        ("free:2", "Database Systems", "SQL and NoSQL databases compared", "draft", 45),
        ("notice:1", "Web Development", "Building web apps with Rust and WebAssembly", "published", 300),
    ];
    for (key, title, body, status, views) in rows {
        manager.insert(&article(&manager, key, title, body, status, views)?)?;
    }
    println!("  Inserted {} records\n", manager.num_docs());

    // Step 3: SEARCH
    println!("Step 3: SEARCH - Querying records...");
    let mut model = manager.search_model();
    model.set_query_text("rust");
    report("'rust'", &manager.search(&model, 1)?);

    model.add_filter(FilterAttribute::equal("status", "published").essential())?;
    model.set_sort_column(&["views"], true)?;
    report("'rust', published, by views", &manager.search(&model, 1)?);

    let mut model = manager.search_model();
    model.add_filter(FilterAttribute::long_range("views", Some(100), None))?;
    model.add_summarizer("body", Arc::new(HeadSummarizer::default()))?;
    model.set_summary_length(20);
    report("views >= 100, summarized", &manager.search(&model, 1)?);
    println!();

    // Step 4: UPDATE and MERGE
    println!("Step 4: UPDATE - Replacing records...");
    manager.update(&article(&manager, "free:2", "Advanced Databases", "Deep dive into storage engines", "published", 46)?)?;
    manager.merge(&article(&manager, "free:3", "Merged Article", "Inserted because the key was new", "draft", 1)?)?;
    println!("  {} records after update and merge\n", manager.num_docs());

    // Step 5: DELETE
    println!("Step 5: DELETE - Removing by key pattern...");
    let removed = manager.delete(&manager.relation().key("free:*")?)?;
    println!("  Removed {} records under 'free:'\n", removed);

    // Step 6: OPTIMIZE and CLOSE
    println!("Step 6: OPTIMIZE - Merging segments...");
    manager.optimize()?;
    println!("  {} records remain", manager.num_docs());
    manager.close()?;

    println!("\nDone!");
    Ok(())
}

fn article(
    manager: &IndexManager,
    key: &str,
    title: &str,
    body: &str,
    status: &str,
    views: i64,
) -> relix::core::error::Result<Record> {
    let mut record = Record::new()
        .value("title", title)
        .value("body", body)
        .value("status", status)
        .value("views", views.to_string());
    record.set_primary_key_str(key, manager.relation())?;
    Ok(record)
}

fn report(label: &str, results: &SearchResults) {
    println!("  {}: {} of {} results ({} ms)", label, results.len(), results.total_records, results.took_ms);
    for record in &results.records {
        let key = record.primary_key().map(|key| key.encode()).unwrap_or_default();
        println!(
            "    {} | {} | {}",
            key,
            record.column_value("title").unwrap_or("-"),
            record.column_value("body").unwrap_or("-"),
        );
    }
}
