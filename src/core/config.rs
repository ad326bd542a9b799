use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub writer_memory_budget: usize,    // Heap handed to the engine writer
    pub writer_threads: usize,          // Indexing threads of the engine writer

    pub hits_per_page: usize,           // SearchModel default page size
    pub summary_length: usize,          // SearchModel default summary cap (chars)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            writer_memory_budget: 50 * 1024 * 1024,  // 50MB, engine minimum is 15MB per thread
            writer_threads: 1,

            hits_per_page: 10,
            summary_length: 200,
        }
    }
}
