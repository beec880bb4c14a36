//! Error types for exact arithmetic.

/// Errors arising from exact linear algebra, lattice and ideal computations.
#[derive(Debug, thiserror::Error)]
pub enum ExactError {
    /// Operands have incompatible shapes.
    #[error("dimension mismatch: {description}")]
    Dimension { description: String },

    /// A matrix that must be invertible is not.
    #[error("singular matrix: {description}")]
    Singular { description: String },

    /// A field element could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A bounded search ran out of budget before finishing.
    #[error("budget exhausted: {description}")]
    Budget { description: String },

    /// A linear program has no finite optimum.
    #[error("unbounded program: {description}")]
    Unbounded { description: String },

    /// A coefficient outside the rationals reached a rational-only backend.
    #[error("not a rational number: {0}")]
    NotRational(String),

    /// An integer left the range of its machine representation.
    #[error("integer overflow: {0}")]
    Overflow(String),
}

pub type Result<T> = std::result::Result<T, ExactError>;
