//! # `gtd_board`
//!
//! Data core for a personal GTD board over multiple databases. A
//! [`registry::ConnectionRegistry`] owns one connection per configured
//! backend (MySQL or SQLite) and routes logical tables to them; a
//! [`lookup::LookupCache`] turns classification ids into display labels;
//! a [`tasks::TaskRepository`] loads the full working set, persists edits
//! back to each record's owning database, and relocates records between
//! databases; [`board`] holds the filter and dropdown model the card
//! canvas consumes.
//!
//! Everything is single-threaded and blocking: the embedding application
//! owns the window loop and calls into this crate from its UI callbacks.

pub mod backend;
pub mod board;
pub mod config;
pub mod error;
pub mod lookup;
pub mod registry;
pub mod tasks;

pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
