use crate::calendars::CalendarError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub mod file;

pub use file::{
    CalendarSetSnapshot, CalendarSnapshot, from_snapshot, load_calendars_from_json, save_calendars_to_json,
    to_snapshot,
};
