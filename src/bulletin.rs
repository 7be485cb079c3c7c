// src/bulletin.rs

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{fields, BulletinConfig};
use crate::error::Result;
use crate::process::{
    date_parser::{self, ExplicitDate},
    normalize::{normalize, NormalizedTables},
    occupancy::aggregate,
    reader::read_sheet,
    sections::classify,
    RawSheet,
};
use crate::schema::{
    Capacity, Facility, Frame, Imprisoned, ImprisonedDetail, Occupancy, TableName,
};

/// One parsed weekly bulletin: its reference date, the four normalized tables
/// and the occupancy view derived from them.
#[derive(Debug, Clone)]
pub struct Bulletin {
    source: Option<PathBuf>,
    date: NaiveDate,
    tables: NormalizedTables,
    occupancy: Vec<Occupancy>,
}

impl Bulletin {
    /// Read, classify and normalize the bulletin workbook at `path`.
    #[tracing::instrument(level = "info", skip(path, explicit, config), fields(path = %path.as_ref().display()))]
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        explicit: Option<ExplicitDate>,
        config: &BulletinConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let sheet = read_sheet(path, &config.sheet_name, &config.columns)?;
        let mut bulletin = Self::from_sheet(sheet, explicit.as_ref(), config)?;
        bulletin.source = Some(path.to_path_buf());
        Ok(bulletin)
    }

    /// Run the pipeline on an already loaded sheet.
    pub fn from_sheet(
        sheet: RawSheet,
        explicit: Option<&ExplicitDate>,
        config: &BulletinConfig,
    ) -> Result<Self> {
        let date = date_parser::resolve(&sheet, config.date_row, explicit)?;
        let id_col = sheet.require_column(fields::ID)?;

        let RawSheet { headers, rows } = sheet;
        let rows = rows
            .into_iter()
            .filter(|r| r.index >= config.data_start_row)
            .collect();
        let classified = classify(rows, id_col, &config.markers)?;
        let tables = normalize(&headers, classified, &config.regimes)?;
        let occupancy = aggregate(
            &tables.facilities,
            &tables.capacity,
            &tables.imprisoned_detail,
        )?;

        info!(
            %date,
            facilities = tables.facilities.len(),
            imprisoned = tables.imprisoned.len(),
            occupancy = occupancy.len(),
            "bulletin parsed"
        );
        Ok(Self {
            source: None,
            date,
            tables,
            occupancy,
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.tables.facilities
    }

    pub fn capacity(&self) -> &[Capacity] {
        &self.tables.capacity
    }

    pub fn imprisoned(&self) -> &[Imprisoned] {
        &self.tables.imprisoned
    }

    pub fn imprisoned_detail(&self) -> &[ImprisonedDetail] {
        &self.tables.imprisoned_detail
    }

    pub fn occupancy(&self) -> &[Occupancy] {
        &self.occupancy
    }

    /// Untyped, column-ordered copy of one table for the export sinks.
    pub fn frame(&self, table: TableName) -> Result<Frame> {
        let name = table.as_str();
        match table {
            TableName::Facilities => Frame::from_rows(name, self.facilities()),
            TableName::Capacity => Frame::from_rows(name, self.capacity()),
            TableName::Imprisoned => Frame::from_rows(name, self.imprisoned()),
            TableName::ImprisonedDetail => Frame::from_rows(name, self.imprisoned_detail()),
            TableName::Occupancy => Frame::from_rows(name, self.occupancy()),
        }
    }
}
