//! Configuration files and record-stream readers

pub mod config;
pub mod records;
