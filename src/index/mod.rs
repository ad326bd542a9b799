pub mod engine;
pub mod index_manager;
