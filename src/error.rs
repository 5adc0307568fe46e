use thiserror::Error;

use crate::transaction::Direction;

/// Fatal conditions that stop a verification run.
///
/// Data mismatches are not errors; they are collected as
/// [`crate::verify::VerificationFailure`] records and the run continues.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("address map configuration error: {0}")]
    Configuration(String),

    #[error("{direction} at {address:#010x} not accepted within {cycles} cycles")]
    HandshakeTimeout {
        direction: Direction,
        address: u32,
        cycles: u32,
    },

    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("failed to read address map: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// A stuck device is reported apart from bad configuration.
    pub fn is_timeout(&self) -> bool {
        matches!(self, HarnessError::HandshakeTimeout { .. })
    }
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
