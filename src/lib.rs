pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod inventory;
pub mod matcher;
pub mod pipeline;
pub mod prompt;
