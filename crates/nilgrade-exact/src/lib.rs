//! # Nilgrade Exact
//!
//! The exact arithmetic the grading solvers stand on. Nothing here knows
//! about Lie algebras; every type is a narrow adapter over `num-bigint` /
//! `num-rational` (and `feanor-math` for Groebner bases) exposing only what
//! the solvers ask for.
//!
//! ## Layers
//!
//! ```text
//! ExactField            ← rationals, quadratic fields Q(sqrt(d))
//!     │
//! Matrix / Subspace     ← echelon forms, kernels, coordinate frames
//!     │
//! UPoly                 ← minimal polynomials, Jordan decomposition
//!     │
//! lattice               ← Smith normal form, abelian quotients of Z^n
//!     │
//! Poly / Ideal          ← Groebner bases (feanor-math): unit test, normal forms
//!     │
//! lp                    ← exact simplex, branch and bound, hull tests
//! ```

pub mod error;
pub mod field;
pub mod ideal;
pub mod lattice;
pub mod lp;
pub mod matrix;
pub mod number_field;
pub mod poly;
pub mod subspace;
pub mod upoly;

pub use error::{ExactError, Result};
pub use field::{ExactField, Rational, rational};
pub use ideal::Ideal;
pub use lattice::{AbelianQuotient, IntMatrix, SmithForm, smith_normal_form};
pub use lp::{IntegerProgram, LinearProgram, LpOutcome, Relation};
pub use matrix::Matrix;
pub use number_field::{Quadratic, QuadraticField, RationalFactors, rational_factors};
pub use poly::{Monomial, Poly, PolyMatrix, PolyRing};
pub use subspace::{Frame, Subspace};
pub use upoly::{UPoly, jordan_decomposition, minimal_polynomial};

pub use num_bigint::BigInt;
