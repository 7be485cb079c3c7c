// src/process/occupancy.rs

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{BulletinError, Result};
use crate::schema::{Capacity, Facility, ImprisonedDetail, Occupancy};

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    capacity_current: u64,
    actual: u64,
}

/// Current capacity against actual headcount, one row per facility present in
/// all three tables. Order follows `facilities`.
pub fn aggregate(
    facilities: &[Facility],
    capacity: &[Capacity],
    imprisoned_detail: &[ImprisonedDetail],
) -> Result<Vec<Occupancy>> {
    let mut capacity_by_id: HashMap<u32, u64> = HashMap::new();
    for c in capacity {
        *capacity_by_id.entry(c.id).or_default() += u64::from(c.current);
    }
    let mut actual_by_id: HashMap<u32, u64> = HashMap::new();
    for d in imprisoned_detail {
        *actual_by_id.entry(d.id).or_default() += u64::from(d.actual);
    }

    let totals: HashMap<u32, Totals> = capacity_by_id
        .into_iter()
        .filter_map(|(id, capacity_current)| {
            actual_by_id.get(&id).map(|&actual| {
                (
                    id,
                    Totals {
                        capacity_current,
                        actual,
                    },
                )
            })
        })
        .collect();

    let mut seen = HashSet::with_capacity(facilities.len());
    let mut out = Vec::with_capacity(facilities.len());
    for facility in facilities {
        if !seen.insert(facility.id) {
            return Err(BulletinError::AggregationCardinalityError { id: facility.id });
        }
        if let Some(t) = totals.get(&facility.id) {
            out.push(Occupancy {
                id: facility.id,
                name: facility.name.clone(),
                abbreviation: facility.abbreviation.clone(),
                current_capacity: t.capacity_current,
                actual_count: t.actual,
            });
        }
    }
    debug!(rows = out.len(), "occupancy aggregated");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FacilityType;

    fn facility(id: u32, name: &str) -> Facility {
        Facility {
            id,
            name: name.to_string(),
            locality: "Bangu".to_string(),
            facility_type: FacilityType::NotInformed,
            abbreviation: String::new(),
        }
    }

    fn cap(id: u32, current: u32) -> Capacity {
        Capacity {
            id,
            original: current,
            unhealthy: 0,
            current,
        }
    }

    fn detail(id: u32, actual: u32) -> ImprisonedDetail {
        ImprisonedDetail {
            id,
            discharged: 0,
            safeguarded: 0,
            actual,
        }
    }

    #[test]
    fn sums_and_inner_joins() {
        let facilities = vec![facility(2, "B"), facility(1, "A"), facility(3, "C")];
        let capacity = vec![cap(1, 100), cap(1, 50), cap(2, 10)];
        let details = vec![detail(2, 12), detail(1, 170), detail(9, 1)];

        let out = aggregate(&facilities, &capacity, &details).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].id, out[0].current_capacity, out[0].actual_count), (2, 10, 12));
        assert_eq!((out[1].id, out[1].current_capacity, out[1].actual_count), (1, 150, 170));
        assert_eq!(out[1].name, "A");
    }

    #[test]
    fn sums_do_not_overflow_u32() {
        let facilities = vec![facility(1, "A")];
        let capacity = vec![cap(1, u32::MAX), cap(1, u32::MAX)];
        let details = vec![detail(1, 1)];
        let out = aggregate(&facilities, &capacity, &details).unwrap();
        assert_eq!(out[0].current_capacity, 2 * u64::from(u32::MAX));
    }

    #[test]
    fn duplicate_facility_is_a_cardinality_error() {
        let facilities = vec![facility(1, "A"), facility(1, "A bis")];
        let err = aggregate(&facilities, &[cap(1, 1)], &[detail(1, 1)]).unwrap_err();
        assert!(matches!(
            err,
            BulletinError::AggregationCardinalityError { id: 1 }
        ));
    }
}
