use thiserror::Error;
use timelockwatch_common::{Classify, ErrorClass};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("row decode error: {0}")]
    Decode(String),
}

impl Classify for StoreError {
    // The taxonomy has no generic "storage unavailable" tag; PERSIST_CONFLICT
    // is the closest fit for anything originating in this crate.
    fn class(&self) -> ErrorClass {
        ErrorClass::PersistConflict
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
