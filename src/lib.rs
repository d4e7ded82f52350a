pub mod cli;
pub mod config;
pub mod llm;
pub mod store;
