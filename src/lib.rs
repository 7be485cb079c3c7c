pub mod bulletin;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod process;
pub mod schema;

pub use bulletin::Bulletin;
pub use config::BulletinConfig;
pub use error::{BulletinError, Result};
pub use process::ExplicitDate;
pub use schema::TableName;
