//! Error types for the isomorphism classifier.

use nilgrade_exact::ExactError;
use nilgrade_kernel::GradingError;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// The gradings have different multisets of layer dimensions.
    #[error("layer dimensions differ: {description}")]
    LayerDimensionMismatch { description: String },

    /// A weight map is partial or does not respect the weight sums.
    #[error("weight map is not a homomorphism: {description}")]
    NotHomomorphism { description: String },

    /// A grading is not a representative of the class.
    #[error("grading {key} is not a representative of this class")]
    NotInClass { key: String },

    /// The certificate graph has no path between two representatives.
    #[error("no chain of certificates joins representatives {from} and {to}")]
    NoIsomorphismPath { from: usize, to: usize },

    /// Two certificates cannot be composed.
    #[error("certificates do not compose: {description}")]
    CertificateMismatch { description: String },

    /// The weight map search would exceed its budget.
    #[error("search budget exceeded: {description}")]
    SearchBudget { description: String },

    #[error(transparent)]
    Grading(#[from] GradingError),

    #[error(transparent)]
    Exact(ExactError),
}

impl From<ExactError> for ClassifyError {
    /// An aborted Groebner basis is a search budget like the weight maps.
    fn from(err: ExactError) -> Self {
        match err {
            ExactError::Budget { description } => ClassifyError::SearchBudget { description },
            other => ClassifyError::Exact(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
