// src/schema/tables.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::types::{FacilityType, Gender, Regime};
use crate::config::fields;
use crate::error::BulletinError;

/// A row type that can be laid out as a named-column table.
///
/// `COLUMNS` must list the serialized field names in declaration order; it is
/// what CSV headers use when a table is empty.
pub trait TableRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facility {
    #[serde(rename = "unidadeId")]
    pub id: u32,
    #[serde(rename = "unidadeNome")]
    pub name: String,
    #[serde(rename = "unidadeLocalidade")]
    pub locality: String,
    #[serde(rename = "unidadeTipo")]
    pub facility_type: FacilityType,
    #[serde(rename = "unidadeSigla")]
    pub abbreviation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capacity {
    #[serde(rename = "unidadeId")]
    pub id: u32,
    #[serde(rename = "capacidadeOriginal")]
    pub original: u32,
    /// Capacity deemed unfit for habitation.
    #[serde(rename = "capacidadeInospito")]
    pub unhealthy: u32,
    #[serde(rename = "capacidadeAtual")]
    pub current: u32,
}

/// Nominal headcount for one regime/gender combination of a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Imprisoned {
    #[serde(rename = "unidadeId")]
    pub id: u32,
    #[serde(rename = "efetivoRegime")]
    pub regime: Regime,
    #[serde(rename = "efetivoGenero")]
    pub gender: Gender,
    #[serde(rename = "efetivoNominal")]
    pub nominal: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImprisonedDetail {
    #[serde(rename = "unidadeId")]
    pub id: u32,
    #[serde(rename = "efetivoBaixados")]
    pub discharged: u32,
    /// Transferred or held under safeguard elsewhere.
    #[serde(rename = "efetivoAcautelado")]
    pub safeguarded: u32,
    #[serde(rename = "efetivoReal")]
    pub actual: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupancy {
    #[serde(rename = "unidadeId")]
    pub id: u32,
    #[serde(rename = "unidadeNome")]
    pub name: String,
    #[serde(rename = "unidadeSigla")]
    pub abbreviation: String,
    #[serde(rename = "capacidadeAtual")]
    pub current_capacity: u64,
    #[serde(rename = "efetivoReal")]
    pub actual_count: u64,
}

impl TableRow for Facility {
    const COLUMNS: &'static [&'static str] = &[
        fields::ID,
        fields::NAME,
        fields::LOCALITY,
        fields::FACILITY_TYPE,
        fields::ABBREVIATION,
    ];
}

impl TableRow for Capacity {
    const COLUMNS: &'static [&'static str] = &[
        fields::ID,
        fields::CAPACITY_ORIGINAL,
        fields::CAPACITY_UNHEALTHY,
        fields::CAPACITY_CURRENT,
    ];
}

impl TableRow for Imprisoned {
    const COLUMNS: &'static [&'static str] =
        &[fields::ID, fields::REGIME, fields::GENDER, fields::NOMINAL];
}

impl TableRow for ImprisonedDetail {
    const COLUMNS: &'static [&'static str] = &[
        fields::ID,
        fields::DISCHARGED,
        fields::SAFEGUARDED,
        fields::ACTUAL,
    ];
}

impl TableRow for Occupancy {
    const COLUMNS: &'static [&'static str] = &[
        fields::ID,
        fields::NAME,
        fields::ABBREVIATION,
        fields::CAPACITY_CURRENT,
        fields::ACTUAL,
    ];
}

/// The five tables a bulletin exposes for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableName {
    Facilities,
    Capacity,
    Imprisoned,
    ImprisonedDetail,
    Occupancy,
}

impl TableName {
    pub const ALL: [TableName; 5] = [
        TableName::Facilities,
        TableName::Capacity,
        TableName::Imprisoned,
        TableName::ImprisonedDetail,
        TableName::Occupancy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Facilities => "facilities",
            TableName::Capacity => "capacity",
            TableName::Imprisoned => "imprisoned",
            TableName::ImprisonedDetail => "imprisoned_detail",
            TableName::Occupancy => "occupancy",
        }
    }
}

impl FromStr for TableName {
    type Err = BulletinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facilities" => Ok(TableName::Facilities),
            "capacity" => Ok(TableName::Capacity),
            "imprisoned" => Ok(TableName::Imprisoned),
            "imprisoned_detail" => Ok(TableName::ImprisonedDetail),
            // older exports called the summary table "occupation"
            "occupancy" | "occupation" => Ok(TableName::Occupancy),
            _ => Err(BulletinError::UnknownTable(s.to_string())),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
