pub mod schema;
pub mod key;
