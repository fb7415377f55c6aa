use thiserror::Error;
use uuid::Uuid;

use crate::models::EntityKind;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Fetch failed for {kind}: {message}")]
    Fetch { kind: EntityKind, message: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Write failed: {0}")]
    Mutation(String),

    #[error("Series move partially applied: {applied} of {total} records moved")]
    PartialSeriesMove {
        applied: usize,
        total: usize,
        failures: Vec<(Uuid, String)>,
    },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
