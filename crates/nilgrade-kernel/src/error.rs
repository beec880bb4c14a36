//! Error types for grading construction and the grading solvers.

use nilgrade_exact::ExactError;

/// Errors arising from invalid gradings or failed realizations.
#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    /// Layer data is unusable before any algebra is checked.
    #[error("malformed grading: {description}")]
    MalformedGrading { description: String },

    /// The layers do not form a direct sum decomposition.
    #[error("not a direct sum: {description}")]
    DirectSum { description: String },

    /// A bracket of two layers leaves the layer of the summed weight.
    #[error("bracket closure fails: {description}")]
    BracketClosure { description: String },

    /// A weight is not an element of the grading magma.
    #[error("weight {weight} is not in {magma}")]
    NotInMagma { weight: String, magma: String },

    /// A vector lies in no single layer.
    #[error("the element {element} is not contained in any single layer")]
    NotHomogeneous { element: String },

    /// Operands of different ranks or dimensions.
    #[error("rank mismatch: {description}")]
    RankMismatch { description: String },

    /// Gradings of different algebras were compared.
    #[error("gradings of different Lie algebras cannot be compared")]
    CrossAlgebra,

    /// No realization of the requested kind exists.
    #[error("no realization: {description}")]
    NoRealization { description: String },

    /// The Leibniz system of the stratification solver has no solution.
    #[error("the Lie algebra {algebra} is not stratifiable")]
    NotStratifiable { algebra: String },

    /// The operation needs a nilpotent algebra.
    #[error("the Lie algebra {algebra} is not nilpotent")]
    NotNilpotent { algebra: String },

    /// The operation needs an abelian group of weights.
    #[error("the grading must be defined over an additive abelian group, not {magma}")]
    NotAGroup { magma: String },

    /// Eigenvalues of a derivation do not lie in the working field.
    #[error("derivation does not split over the field: minimal polynomial {polynomial}")]
    NotSplit { polynomial: String },

    /// Structure constants do not define a Lie algebra.
    #[error("invalid Lie algebra: {description}")]
    InvalidAlgebra { description: String },

    /// No catalog entry under this name.
    #[error("unknown algebra: {0}")]
    UnknownAlgebra(String),

    /// Limits could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Exact(#[from] ExactError),
}

pub type Result<T> = std::result::Result<T, GradingError>;
