use thiserror::Error;

use crate::instrument::InstrumentError;
use crate::models::Frequency;

/// Error type for survey computation, station bookkeeping and persistence.
#[derive(Error, Debug, Clone, PartialEq, uniffi::Error)]
#[uniffi(flat_error)]
pub enum SurveyError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("station {station} is incomplete, missing {}", list_frequencies(.missing))]
    IncompleteStation {
        station: u32,
        missing: Vec<Frequency>,
    },

    #[error("acquisition failed: {0}")]
    AcquisitionFailure(#[from] InstrumentError),

    #[error("{quantity} is not finite at {frequency}")]
    NonFiniteResult {
        quantity: String,
        frequency: Frequency,
    },

    #[error("stored collection is corrupt: {0}")]
    CorruptStore(String),

    #[error("index {index} out of range for collection of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no project at index {0}")]
    NotFound(usize),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SurveyError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SurveyError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors the operator can clear by re-acquiring readings.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SurveyError::AcquisitionFailure(_) | SurveyError::IncompleteStation { .. }
        )
    }
}

fn list_frequencies(frequencies: &[Frequency]) -> String {
    frequencies
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
