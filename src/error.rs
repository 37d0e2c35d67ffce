//! dpo error types

/// dpo result type
pub type Result<T> = std::result::Result<T, Error>;

/// dpo errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from numr operations
    #[error("numr error: {0}")]
    Numr(#[from] numr::error::Error),

    /// Input shapes that must agree elementwise do not
    #[error("shape mismatch for '{arg}': expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Argument name
        arg: &'static str,
        /// Shape of the reference input
        expected: Vec<usize>,
        /// Shape actually passed
        got: Vec<usize>,
    },

    /// Invalid argument to an operation
    #[error("invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// Argument name
        arg: &'static str,
        /// Why it's invalid
        reason: String,
    },

    /// Configuration loading error
    #[error("config error: {reason}")]
    Config {
        /// Description of what went wrong
        reason: String,
    },
}
