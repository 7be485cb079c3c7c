pub mod frame;
pub mod tables;
pub mod types;

pub use frame::{Frame, Record};
pub use tables::{
    Capacity, Facility, Imprisoned, ImprisonedDetail, Occupancy, TableName, TableRow,
};
pub use types::{FacilityType, Gender, Regime, NOT_INFORMED};
