pub mod config;
pub mod indexer;
pub mod output;
pub mod tokens;
