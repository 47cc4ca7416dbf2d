//! Crate error type and its conversion into Python exceptions.

use thiserror::Error;

use crate::schema::CanonicalField;

#[derive(Error, Debug)]
pub enum JituError {
    #[error("Missing required columns: {}", join_fields(.0))]
    MissingRequiredColumns(Vec<CanonicalField>),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Unknown canonical field: {0}")]
    UnknownField(String),

    #[error("Unknown granularity: '{0}'. Must be 'day', 'week' or 'month'")]
    UnknownGranularity(String),

    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for JituError {
    fn from(err: figment::Error) -> Self {
        JituError::Config(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, JituError>;

fn join_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(feature = "python")]
impl From<JituError> for pyo3::PyErr {
    fn from(err: JituError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyRuntimeError, PyValueError};
        match err {
            JituError::MissingRequiredColumns(_)
            | JituError::ColumnNotFound(_)
            | JituError::UnknownField(_)
            | JituError::UnknownGranularity(_)
            | JituError::Validation(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_names_fields() {
        let err = JituError::MissingRequiredColumns(vec![
            CanonicalField::Product,
            CanonicalField::Price,
        ]);
        assert_eq!(err.to_string(), "Missing required columns: product, price");
    }
}
