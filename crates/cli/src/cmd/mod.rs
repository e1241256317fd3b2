//! CLI command implementations

pub mod config;
pub mod create;
pub mod delete;
pub mod export;
pub mod import;
pub mod list;
pub mod load;
pub mod meta;
pub mod new_id;
pub mod reindex;
pub mod tree;
pub mod update;
