// src/process/normalize.rs

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use tracing::{debug, trace};

use super::names::parse_facility_name;
use super::raw_table::{Cell, RawRow};
use super::sections::ClassifiedRow;
use super::utils::whole_u32;
use crate::config::fields;
use crate::error::{BulletinError, Result};
use crate::schema::{Capacity, Facility, Imprisoned, ImprisonedDetail, Regime};

/// The four themed tables of one bulletin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTables {
    pub facilities: Vec<Facility>,
    pub capacity: Vec<Capacity>,
    pub imprisoned: Vec<Imprisoned>,
    pub imprisoned_detail: Vec<ImprisonedDetail>,
}

/// Header positions of every field the normalizer reads.
struct Columns {
    id: usize,
    name: usize,
    locality: usize,
    regime: usize,
    capacity_original: usize,
    capacity_unhealthy: usize,
    capacity_current: usize,
    nominal: usize,
    discharged: usize,
    safeguarded: usize,
    actual: usize,
}

impl Columns {
    fn resolve(headers: &[String]) -> Result<Self> {
        let find = |field: &str| {
            headers.iter().position(|h| h == field).ok_or_else(|| {
                BulletinError::ColumnMappingError(format!("field '{field}' is not mapped"))
            })
        };
        Ok(Self {
            id: find(fields::ID)?,
            name: find(fields::NAME)?,
            locality: find(fields::LOCALITY)?,
            regime: find(fields::REGIME)?,
            capacity_original: find(fields::CAPACITY_ORIGINAL)?,
            capacity_unhealthy: find(fields::CAPACITY_UNHEALTHY)?,
            capacity_current: find(fields::CAPACITY_CURRENT)?,
            nominal: find(fields::NOMINAL)?,
            discharged: find(fields::DISCHARGED)?,
            safeguarded: find(fields::SAFEGUARDED)?,
            actual: find(fields::ACTUAL)?,
        })
    }
}

/// Carry the last non-empty value of each column in `cols` down over empty
/// cells, top to bottom.
pub fn forward_fill<'a, I>(rows: I, cols: &[usize])
where
    I: IntoIterator<Item = &'a mut RawRow>,
{
    let mut last: Vec<Option<Cell>> = vec![None; cols.len()];
    for row in rows {
        for (slot, &col) in last.iter_mut().zip(cols) {
            if row.get(col).is_empty() {
                if let Some(value) = slot {
                    *row.get_mut(col) = value.clone();
                }
            } else {
                *slot = Some(row.get(col).clone());
            }
        }
    }
}

/// Total mapping: unknown, empty and numeric labels are `Não Informado`.
pub fn standardize_regime(cell: &Cell, regimes: &BTreeMap<String, Regime>) -> Regime {
    match cell {
        Cell::Text(label) => regimes
            .get(label.trim())
            .copied()
            .unwrap_or(Regime::NotInformed),
        _ => Regime::NotInformed,
    }
}

fn malformed(row: &RawRow, col: usize, field: &str) -> BulletinError {
    BulletinError::MalformedRow {
        row: row.index,
        field: field.to_string(),
        value: row.get(col).as_text().unwrap_or_default(),
    }
}

/// `None` when the id cell is not numeric: marker, subtotal and header rows.
fn coerce_id(row: &RawRow, col: usize) -> Result<Option<u32>> {
    match row.get(col).as_number() {
        None => Ok(None),
        Some(n) => whole_u32(n)
            .filter(|id| *id > 0)
            .map(Some)
            .ok_or_else(|| malformed(row, col, fields::ID)),
    }
}

fn coerce_count(row: &RawRow, col: usize, field: &str) -> Result<Option<u32>> {
    let cell = row.get(col);
    if cell.is_empty() {
        return Ok(None);
    }
    cell.as_number()
        .and_then(whole_u32)
        .map(Some)
        .ok_or_else(|| malformed(row, col, field))
}

fn text(row: &RawRow, col: usize) -> String {
    row.get(col).as_text().unwrap_or_default()
}

/// Keep the first occurrence of each row, preserving order.
fn dedup<T: Clone + Eq + Hash>(rows: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter().filter(|r| seen.insert(r.clone())).collect()
}

/// Turn classified sheet rows into the four themed tables.
#[tracing::instrument(level = "debug", skip_all, fields(rows = rows.len()))]
pub fn normalize(
    headers: &[String],
    mut rows: Vec<ClassifiedRow>,
    regimes: &BTreeMap<String, Regime>,
) -> Result<NormalizedTables> {
    let cols = Columns::resolve(headers)?;

    forward_fill(
        rows.iter_mut().map(|c| &mut c.row),
        &[cols.id, cols.name, cols.locality],
    );

    let mut facilities = Vec::new();
    let mut capacity = Vec::new();
    let mut imprisoned = Vec::new();
    let mut imprisoned_detail = Vec::new();

    for classified in &rows {
        let row = &classified.row;
        let Some(id) = coerce_id(row, cols.id)? else {
            trace!(row = row.index, "skipping non-facility row");
            continue;
        };

        let parts = parse_facility_name(&text(row, cols.name));
        let gender = parts.gender.unwrap_or(classified.gender);
        let locality = text(row, cols.locality);

        if !parts.name.is_empty() && !locality.is_empty() {
            facilities.push(Facility {
                id,
                name: parts.name,
                locality,
                facility_type: classified.facility_type,
                abbreviation: parts.abbreviation,
            });
        }

        let original = coerce_count(row, cols.capacity_original, fields::CAPACITY_ORIGINAL)?;
        let unhealthy = coerce_count(row, cols.capacity_unhealthy, fields::CAPACITY_UNHEALTHY)?;
        let current = coerce_count(row, cols.capacity_current, fields::CAPACITY_CURRENT)?;
        if let (Some(original), Some(unhealthy), Some(current)) = (original, unhealthy, current) {
            capacity.push(Capacity {
                id,
                original,
                unhealthy,
                current,
            });
        }

        imprisoned.push(Imprisoned {
            id,
            regime: standardize_regime(row.get(cols.regime), regimes),
            gender,
            nominal: coerce_count(row, cols.nominal, fields::NOMINAL)?,
        });

        let discharged = coerce_count(row, cols.discharged, fields::DISCHARGED)?;
        let safeguarded = coerce_count(row, cols.safeguarded, fields::SAFEGUARDED)?;
        let actual = coerce_count(row, cols.actual, fields::ACTUAL)?;
        if let (Some(discharged), Some(safeguarded), Some(actual)) =
            (discharged, safeguarded, actual)
        {
            imprisoned_detail.push(ImprisonedDetail {
                id,
                discharged,
                safeguarded,
                actual,
            });
        }
    }

    let tables = NormalizedTables {
        facilities: dedup(facilities),
        capacity: dedup(capacity),
        imprisoned,
        imprisoned_detail: dedup(imprisoned_detail),
    };
    debug!(
        facilities = tables.facilities.len(),
        capacity = tables.capacity.len(),
        imprisoned = tables.imprisoned.len(),
        imprisoned_detail = tables.imprisoned_detail.len(),
        "normalized bulletin rows"
    );
    Ok(tables)
}
