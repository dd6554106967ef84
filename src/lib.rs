//! Builds a daily wide table from a catalog of published CSV datasets.
//!
//! Each dataset is fetched, tokenized, cleaned into a date-indexed series,
//! aligned on a shared daily grid with forward-filled gaps, extended with
//! 7-day rolling sums for new-listings columns, and written as JSON records.

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod rolling;
pub mod series;
pub mod stats;
pub mod table;
