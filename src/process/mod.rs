// src/process/mod.rs
pub mod date_parser;
pub mod names;
pub mod normalize;
pub mod occupancy;
pub mod raw_table;
pub mod reader;
pub mod sections;
pub mod utils;

#[cfg(test)]
pub(crate) mod fixtures;

pub use date_parser::ExplicitDate;
pub use normalize::NormalizedTables;
pub use raw_table::{Cell, RawRow, RawSheet};
