//! Core services: traversal, aggregation, filtering, sinks and reporting

pub mod aggregate;
pub mod error_log;
pub mod filter;
pub mod format;
pub mod report;
pub mod sink;
pub mod traverse;
