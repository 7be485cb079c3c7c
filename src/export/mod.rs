// src/export/mod.rs
pub mod batch;
pub mod document;
pub mod file;
pub mod http;
pub mod store;
pub mod table_service;

pub use batch::{export_bulletins, export_tables, ExportPlan, RunSummary};
pub use document::DocumentStore;
pub use file::{export_file, ExportFormat, FileExportOptions, WriteMode};
pub use store::{export_to_store, ExistPolicy, ExportSummary, IdentityStrategy, RecordStore};
pub use table_service::TableServiceStore;
