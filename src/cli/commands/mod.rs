//! CLI command implementations

pub mod utils;

pub mod backup;
pub mod completions;
pub mod config;
pub mod init;
pub mod order;
pub mod reference;
pub mod sync;
