use crate::core::record::Record;

/// One page of search results
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub records: Vec<Record>,
    pub total_records: usize,  // Matches in the index, all pages
    pub page: usize,           // 1-based
    pub hits_per_page: usize,
    pub max_score: f32,
    pub took_ms: u64,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn page_count(&self) -> usize {
        if self.hits_per_page == 0 {
            return 0;
        }
        self.total_records.div_ceil(self.hits_per_page)
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.page_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(total_records: usize, page: usize) -> SearchResults {
        SearchResults {
            records: Vec::new(),
            total_records,
            page,
            hits_per_page: 10,
            max_score: 0.0,
            took_ms: 0,
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(results(0, 1).page_count(), 0);
        assert_eq!(results(10, 1).page_count(), 1);
        assert_eq!(results(11, 1).page_count(), 2);
    }

    #[test]
    fn next_page() {
        assert!(results(11, 1).has_next_page());
        assert!(!results(11, 2).has_next_page());
    }
}
