//! # Nilgrade Classify
//!
//! Deciding whether two gradings are isomorphic, and keeping the evidence.
//!
//! ```text
//! weight_maps            ← dimension-preserving homomorphic weight bijections
//!     │
//! isomorphism_equations  ← one indeterminate matrix per layer, one ideal
//!     │
//! IsomorphismCertificate ← invert / compose along certificate paths
//!     │
//! GradingIsomorphismClass ← representatives + certificates, by membership
//! ```
//!
//! Isomorphism is decided over the algebraic closure of the working field:
//! a weight map certifies an isomorphism when its ideal does not contain 1.

pub mod certificate;
pub mod class;
pub mod equations;
pub mod error;
pub mod label;
pub mod maps;

pub use certificate::{CertificateSummary, IsomorphismCertificate, LayerMap, LayerMapSummary};
pub use class::{ClassSummary, GradingIsomorphismClass, classify_gradings};
pub use equations::isomorphism_equations;
pub use error::{ClassifyError, Result};
pub use label::{class_labels, grading_label, grading_label_alt, int_to_az};
pub use maps::{WeightMap, is_homomorphism, weight_maps};
