pub mod cache;
pub mod llm;
pub mod observability;
pub mod persistence;
