//! # Nilgrade Kernel
//!
//! Gradings of finite-dimensional nilpotent Lie algebras: decompositions
//! `g = ⊕ g_w` indexed by an additive magma with `[g_a, g_b] ⊆ g_{a+b}`.
//!
//! ## Architecture
//!
//! ```text
//! LieAlgebra<F>          ← structure constants, derivations, central series
//!     │
//! Magma / Weight         ← Z^k, Z^r ⊕ torsion, F^k, free monoids
//!     │
//! Grading<F>             ← checked, interned layer decomposition + weight poset
//!     │
//!     ├── realization    ← universal / torsion-free / positive / integer
//!     ├── maximal        ← finest grading from a maximal torus (over Q or Q(sqrt(d)))
//!     ├── enumerate      ← every torsion-free grading as a quotient
//!     └── stratification ← the Z-grading generated in degree one
//! ```
//!
//! Every value is exact; the number type is any [`ExactField`].

pub mod algebra;
pub mod canonical;
pub mod catalog;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod grading;
pub mod magma;
pub mod maximal;
pub mod poset;
pub mod realization;
pub mod stratification;

pub use algebra::{AlgebraBuilder, AlgebraSpec, BracketSpec, LieAlgebra};
pub use canonical::ContentHash;
pub use config::Limits;
pub use enumerate::torsion_free_gradings;
pub use error::{GradingError, Result};
pub use grading::{Grading, GradingOptions, GradingSummary, LayerSummary};
pub use magma::{AbelianGroup, Magma, Weight};
pub use maximal::{maximal_grading, maximal_grading_split, maximal_torus};
pub use nilgrade_exact::{ExactField, Quadratic, QuadraticField, Rational};
pub use poset::WeightPoset;
pub use stratification::stratification;
