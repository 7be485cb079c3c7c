// src/process/sections.rs

use std::ops::Range;
use tracing::debug;

use super::raw_table::{Cell, RawRow};
use crate::config::SectionMarkers;
use crate::error::{BulletinError, Result};
use crate::schema::{FacilityType, Gender};

/// A sheet row tagged with what its position says about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub row: RawRow,
    pub facility_type: FacilityType,
    pub gender: Gender,
}

/// Position of the single row whose id cell is exactly `marker`.
fn locate(rows: &[RawRow], id_col: usize, marker: &str) -> Result<usize> {
    let mut hits = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| matches!(r.get(id_col), Cell::Text(t) if t == marker))
        .map(|(i, _)| i);
    match (hits.next(), hits.next()) {
        (Some(i), None) => Ok(i),
        _ => Err(BulletinError::SectionMarkerNotFound {
            marker: marker.to_string(),
        }),
    }
}

/// Tag every row with facility type and gender from the subtotal section it
/// falls in. Sections are half-open: a marker row belongs to the section it
/// opens.
#[tracing::instrument(level = "debug", skip_all, fields(rows = rows.len()))]
pub fn classify(
    rows: Vec<RawRow>,
    id_col: usize,
    markers: &SectionMarkers,
) -> Result<Vec<ClassifiedRow>> {
    let female = locate(&rows, id_col, &markers.female)?;
    let shelter = locate(&rows, id_col, &markers.shelter)?;
    let hospital = locate(&rows, id_col, &markers.hospital)?;

    if shelter < female {
        return Err(BulletinError::SectionMarkerNotFound {
            marker: markers.shelter.clone(),
        });
    }
    if hospital < shelter {
        return Err(BulletinError::SectionMarkerNotFound {
            marker: markers.hospital.clone(),
        });
    }

    let sections: [(Range<usize>, FacilityType, Gender); 4] = [
        (0..female, FacilityType::NotInformed, Gender::Male),
        (female..shelter, FacilityType::NotInformed, Gender::Female),
        (shelter..hospital, FacilityType::Shelter, Gender::NotInformed),
        (hospital..rows.len(), FacilityType::CustodyHospital, Gender::NotInformed),
    ];
    debug!(female, shelter, hospital, "section markers located");

    let classified = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let (facility_type, gender) = sections
                .iter()
                .find(|(range, _, _)| range.contains(&i))
                .map(|(_, t, g)| (*t, *g))
                .unwrap_or((FacilityType::NotInformed, Gender::NotInformed));
            ClassifiedRow {
                row,
                facility_type,
                gender,
            }
        })
        .collect();
    Ok(classified)
}
