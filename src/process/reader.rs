// src/process/reader.rs

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, trace};

use super::raw_table::{Cell, RawRow, RawSheet};
use crate::config::ColumnMapping;
use crate::error::{BulletinError, Result};

/// Zero-based index of a spreadsheet column letter (`A` = 0, `AA` = 26).
pub fn column_index(column: &str) -> Option<u32> {
    let column = column.trim();
    if column.is_empty() || column.len() > 3 {
        return None;
    }
    let mut index: u32 = 0;
    for ch in column.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        index = index * 26 + digit;
    }
    Some(index - 1)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Load `sheet_name` from the workbook at `path`, keeping only the mapped
/// columns. Row indices are absolute: leading empty rows are preserved.
#[tracing::instrument(level = "debug", skip(path, mapping), fields(path = %path.as_ref().display()))]
pub fn read_sheet<P: AsRef<Path>>(
    path: P,
    sheet_name: &str,
    mapping: &[ColumnMapping],
) -> Result<RawSheet> {
    let path = path.as_ref();
    let mut workbook =
        open_workbook_auto(path).map_err(|e| BulletinError::SourceUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let available = workbook.sheet_names().to_vec();
    if !available.iter().any(|s| s == sheet_name) {
        return Err(BulletinError::SheetNotFound {
            sheet: sheet_name.to_string(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| BulletinError::SourceUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let (last_row, last_col) = range.end().ok_or_else(|| {
        BulletinError::ColumnMappingError(format!("sheet '{sheet_name}' is empty"))
    })?;

    let mut headers = Vec::with_capacity(mapping.len());
    let mut columns = Vec::with_capacity(mapping.len());
    for m in mapping {
        let col = column_index(&m.column).ok_or_else(|| {
            BulletinError::ColumnMappingError(format!("'{}' is not a spreadsheet column", m.column))
        })?;
        if col > last_col {
            return Err(BulletinError::ColumnMappingError(format!(
                "column {} ({}) lies beyond the sheet's last used column",
                m.column, m.field
            )));
        }
        if headers.contains(&m.field) {
            return Err(BulletinError::ColumnMappingError(format!(
                "field '{}' is mapped more than once",
                m.field
            )));
        }
        headers.push(m.field.clone());
        columns.push(col);
    }

    let mut rows = Vec::with_capacity(last_row as usize + 1);
    for r in 0..=last_row {
        let cells = columns
            .iter()
            .map(|&c| range.get_value((r, c)).map(to_cell).unwrap_or(Cell::Empty))
            .collect();
        rows.push(RawRow::new(r, cells));
    }
    trace!(rows = rows.len(), "sheet rows buffered");

    debug!(
        sheet = sheet_name,
        rows = rows.len(),
        columns = headers.len(),
        "read bulletin sheet"
    );
    Ok(RawSheet { headers, rows })
}
