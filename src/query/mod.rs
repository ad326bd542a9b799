pub mod ast;
pub mod types;
pub mod composer;
pub mod planner;
