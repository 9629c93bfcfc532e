//! CLI module graph.

pub mod command;
pub mod config;
pub mod migrate;
pub mod normalize;
pub mod output;
