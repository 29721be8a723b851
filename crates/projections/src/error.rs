//! Reporting error types.

use domain::{DomainError, ErrorKind};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("invalid period")]
    InvalidPeriod(String),

    #[error("invalid report type")]
    InvalidReportType(String),

    /// A lookup or authorization failure shared with the domain layer.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV writer could not be flushed into its buffer.
    #[error("CSV encoding error: {0}")]
    Encoding(String),
}

impl ProjectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProjectionError::InvalidPeriod(_) | ProjectionError::InvalidReportType(_) => {
                ErrorKind::Validation
            }
            ProjectionError::Domain(e) => e.kind(),
            ProjectionError::Store(_)
            | ProjectionError::Csv(_)
            | ProjectionError::Encoding(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for reporting operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_underlying_failure() {
        assert_eq!(
            ProjectionError::InvalidPeriod("daily".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ProjectionError::from(DomainError::NotFound("order")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ProjectionError::Encoding("broken".into()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(ProjectionError::InvalidReportType("x".into()).to_string(), "invalid report type");
    }
}
