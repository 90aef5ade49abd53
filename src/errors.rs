use thiserror::Error;

/// Errors raised at setup and I/O boundaries.
///
/// The search core never returns a `Result`: invariant violations inside an
/// operator are programmer errors, asserted in debug builds (see
/// `model::solution`).
#[derive(Debug, Error)]
pub enum KglsError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("input error: {0}")]
    Input(String),
}
