// src/export/file.rs

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::bulletin::Bulletin;
use crate::error::{BulletinError, Result};
use crate::schema::{Frame, Record, TableName};

static EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*)\.([A-Za-z]+)$").expect("valid extension regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(BulletinError::UnsupportedFormat(ext.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

#[derive(Debug, Clone, Default)]
pub struct FileExportOptions {
    /// Stamp every row with the bulletin date under this column.
    pub date_column: Option<String>,
    pub mode: WriteMode,
}

/// `<base>_<table>.<ext>` with `[YYYY]`, `[MM]` and `[DD]` filled from `date`.
/// Templates without an extension export CSV.
pub fn resolve_output_path(
    template: &str,
    date: NaiveDate,
    table: TableName,
) -> Result<(PathBuf, ExportFormat)> {
    let (base, ext) = match EXTENSION.captures(template) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (template.to_string(), "csv".to_string()),
    };
    let format = ExportFormat::from_extension(&ext)?;
    let base = base
        .replace("[YYYY]", &date.format("%Y").to_string())
        .replace("[MM]", &date.format("%m").to_string())
        .replace("[DD]", &date.format("%d").to_string());
    Ok((PathBuf::from(format!("{base}_{table}.{ext}")), format))
}

/// Write one bulletin table to the file named by `template`.
#[tracing::instrument(level = "info", skip(bulletin, options), fields(date = %bulletin.date()))]
pub fn export_file(
    bulletin: &Bulletin,
    table: TableName,
    template: &str,
    options: &FileExportOptions,
) -> Result<PathBuf> {
    let (path, format) = resolve_output_path(template, bulletin.date(), table)?;
    let mut frame = bulletin.frame(table)?;
    if let Some(column) = &options.date_column {
        let stamp = bulletin.date().format("%Y-%m-%d").to_string();
        frame = frame.with_column(column, Value::String(stamp));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| BulletinError::io(parent, e))?;
    }

    match (format, options.mode) {
        (ExportFormat::Csv, WriteMode::Overwrite) => {
            write_atomic(&path, |w| write_csv(w, &frame, true))?
        }
        (ExportFormat::Csv, WriteMode::Append) => append_csv(&path, &frame)?,
        (ExportFormat::Json, WriteMode::Overwrite) => {
            write_atomic(&path, |w| write_json(w, &frame.rows))?
        }
        (ExportFormat::Json, WriteMode::Append) => {
            let mut records = read_json_records(&path)?;
            debug!(existing = records.len(), "merging into existing json export");
            records.extend(frame.rows.iter().cloned());
            write_atomic(&path, |w| write_json(w, &records))?
        }
    }

    info!(path = %path.display(), rows = frame.len(), ?format, "table exported");
    Ok(path)
}

/// Write via `.<name>.tmp` in the same directory, then rename over `path`.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let file = File::create(&tmp_path).map_err(|e| BulletinError::io(&tmp_path, e))?;
    let mut writer = BufWriter::new(file);
    let written = write(&mut writer).and_then(|()| {
        writer
            .flush()
            .map_err(|e| BulletinError::io(&tmp_path, e))
    });
    drop(writer);

    let result = written.and_then(|()| {
        fs::rename(&tmp_path, path).map_err(|e| BulletinError::io(path, e))
    });
    if result.is_err() {
        // leave no partial output behind
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn render(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_csv<W: Write>(writer: W, frame: &Frame, header: bool) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    if header {
        csv.write_record(&frame.columns)?;
    }
    for row in &frame.rows {
        csv.write_record(frame.columns.iter().map(|c| render(row.get(c))))?;
    }
    csv.flush()
        .map_err(|e| BulletinError::Serialization(e.to_string()))
}

fn append_csv(path: &Path, frame: &Frame) -> Result<()> {
    let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| BulletinError::io(path, e))?;
    write_csv(BufWriter::new(file), frame, is_new)
}

fn write_json<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(writer, formatter);
    records.serialize(&mut ser)?;
    Ok(())
}

fn read_json_records(path: &Path) -> Result<Vec<Record>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BulletinError::io(path, e)),
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&text)?)
}
