use std::time::Instant;
use tracing::debug;
use crate::core::error::Result;
use crate::reader::snapshot_reader::ReadView;
use crate::search::model::SearchModel;
use crate::search::results::SearchResults;

/// Runs search models against one read view
pub struct QueryExecutor<'v> {
    view: &'v ReadView,
}

impl<'v> QueryExecutor<'v> {
    pub fn new(view: &'v ReadView) -> Self {
        QueryExecutor { view }
    }

    /// One page of results, `page` counted from 1
    pub fn execute(&self, model: &SearchModel, page: usize) -> Result<SearchResults> {
        let started = Instant::now();
        let page = page.max(1);
        let per_page = model.hits_per_page();
        let query = model.compose()?;
        let first = (page - 1).saturating_mul(per_page);

        // Sorted pages come out of the whole match set; unsorted ones straight from the engine
        let (hits, first) = match model.sort_column() {
            Some(sort) => {
                let mut hits = self.view.search_all(&query)?;
                hits.sort_by_columns(&sort.columns, sort.reverse, model.relation())?;
                (hits, first)
            }
            None => (self.view.search_page(&query, first, per_page)?, 0),
        };

        let last = first.saturating_add(per_page - 1);
        let mut records = model.transplant_to_records(&hits, first, last)?;
        model.summarize(&mut records);

        let results = SearchResults {
            records,
            total_records: hits.total(),
            page,
            hits_per_page: per_page,
            max_score: hits.max_score(),
            took_ms: started.elapsed().as_millis() as u64,
        };

        debug!(
            relation = %model.relation().name,
            page,
            returned = results.records.len(),
            total = results.total_records,
            took_ms = results.took_ms,
            "search executed"
        );
        Ok(results)
    }
}
