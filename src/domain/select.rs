//! Operator selection of the repositories to update.

use thiserror::Error;

use super::Repository;

/// Errors that can occur while asking the operator to choose repositories.
#[derive(Debug, Error)]
pub enum SelectError {
    /// The terminal could not be read or written.
    #[error("failed to read selection from terminal")]
    Io(#[from] std::io::Error),

    /// The operator quit instead of choosing.
    #[error("selection aborted")]
    Aborted,
}

/// Lets an operator narrow down the repositories to update.
pub trait Selector {
    /// Present the candidates and return the chosen subset, in candidate order.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be asked.
    fn select(&self, candidates: Vec<Repository>) -> Result<Vec<Repository>, SelectError>;
}
