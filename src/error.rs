// Error kinds shared by every table, series and distribution in the crate

use thiserror::Error;

/// Errors raised while building or transforming distribution data.
///
/// Construction errors are raised eagerly, so a value that exists is always
/// valid. Operations that fail leave their operands untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionError {
    /// Malformed construction input (unsorted grid, bad boundaries, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation not permitted for this particular value
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// An optional component was requested but is absent
    #[error("not available: {0}")]
    NotAvailable(String),

    /// Conversion or refinement the implementation cannot perform
    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, DistributionError>;

impl DistributionError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        DistributionError::InvalidInput(msg.into())
    }

    pub(crate) fn invalid_operation(msg: impl Into<String>) -> Self {
        DistributionError::InvalidOperation(msg.into())
    }

    pub(crate) fn not_available(msg: impl Into<String>) -> Self {
        DistributionError::NotAvailable(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        DistributionError::Unsupported(msg.into())
    }
}
