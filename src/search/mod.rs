pub mod model;
pub mod executor;
pub mod results;
pub mod summarizer;
