//! Blueprint Quote: command-line composition of the quotation pipeline.
//!
//! Reads detector output, prices it with [`quotation_core`], and writes
//! documents with [`quotation_report`].

pub mod cli;
pub mod config;

pub use cli::{execute, Cli, Commands};
pub use config::QuoteConfig;
