//! Grading magmas and their elements.
//!
//! Weights are either integer tuples (for finitely generated abelian
//! groups and free commutative monoids) or tuples of field elements (raw
//! eigenvalues before a realization).

use std::fmt;

use nilgrade_exact::ExactField;
use serde::{Deserialize, Serialize};

use crate::error::{GradingError, Result};

/// `Z/d_1 ⊕ ... ⊕ Z/d_t ⊕ Z^r`, given by invariants where `0` stands for a
/// copy of `Z`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbelianGroup {
    invariants: Vec<u64>,
}

impl AbelianGroup {
    /// Invariants equal to 1 are trivial factors and are dropped.
    pub fn new(invariants: Vec<u64>) -> Self {
        Self {
            invariants: invariants.into_iter().filter(|&d| d != 1).collect(),
        }
    }

    pub fn free(rank: usize) -> Self {
        Self {
            invariants: vec![0; rank],
        }
    }

    pub fn trivial() -> Self {
        Self {
            invariants: Vec::new(),
        }
    }

    pub fn integers() -> Self {
        Self::free(1)
    }

    pub fn invariants(&self) -> &[u64] {
        &self.invariants
    }

    pub fn rank(&self) -> usize {
        self.invariants.len()
    }

    pub fn free_rank(&self) -> usize {
        self.invariants.iter().filter(|&&d| d == 0).count()
    }

    pub fn has_torsion(&self) -> bool {
        self.invariants.iter().any(|&d| d != 0)
    }

    pub fn is_trivial(&self) -> bool {
        self.invariants.is_empty()
    }

    fn reduce(&self, coords: &mut [i64]) {
        for (x, &d) in coords.iter_mut().zip(&self.invariants) {
            if d != 0 {
                *x = x.rem_euclid(d as i64);
            }
        }
    }
}

impl fmt::Display for AbelianGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.invariants.is_empty() {
            return write!(f, "0");
        }
        let mut parts: Vec<String> = self
            .invariants
            .iter()
            .filter(|&&d| d != 0)
            .map(|d| format!("Z/{d}"))
            .collect();
        match self.free_rank() {
            0 => {}
            1 => parts.push("Z".to_string()),
            r => parts.push(format!("Z^{r}")),
        }
        write!(f, "{}", parts.join(" + "))
    }
}

/// The indexing structure of a grading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Magma {
    /// A finitely generated abelian group.
    Abelian(AbelianGroup),
    /// `N^rank`, the free commutative monoid; not a group.
    FreeMonoid { rank: usize },
    /// Tuples of field elements under addition.
    FieldVectors { rank: usize },
}

impl Magma {
    pub fn integers() -> Self {
        Magma::Abelian(AbelianGroup::integers())
    }

    pub fn free(rank: usize) -> Self {
        Magma::Abelian(AbelianGroup::free(rank))
    }

    pub fn trivial() -> Self {
        Magma::Abelian(AbelianGroup::trivial())
    }

    pub fn rank(&self) -> usize {
        match self {
            Magma::Abelian(g) => g.rank(),
            Magma::FreeMonoid { rank } | Magma::FieldVectors { rank } => *rank,
        }
    }

    pub fn is_group(&self) -> bool {
        !matches!(self, Magma::FreeMonoid { .. })
    }

    pub fn as_abelian(&self) -> Option<&AbelianGroup> {
        match self {
            Magma::Abelian(g) => Some(g),
            _ => None,
        }
    }

    /// The weight `0`.
    pub fn zero<F: ExactField>(&self) -> Weight<F> {
        match self {
            Magma::FieldVectors { rank } => Weight::Field(vec![F::zero(); *rank]),
            _ => Weight::Lattice(vec![0; self.rank()]),
        }
    }

    /// The element of this magma denoted by `w`, or an error if there is
    /// none.
    pub fn coerce<F: ExactField>(&self, w: &Weight<F>) -> Result<Weight<F>> {
        let reject = || GradingError::NotInMagma {
            weight: w.to_string(),
            magma: self.to_string(),
        };
        if w.len() != self.rank() {
            return Err(reject());
        }
        match self {
            Magma::Abelian(g) => {
                let mut coords = w.to_lattice().ok_or_else(reject)?;
                g.reduce(&mut coords);
                Ok(Weight::Lattice(coords))
            }
            Magma::FreeMonoid { .. } => {
                let coords = w.to_lattice().ok_or_else(reject)?;
                if coords.iter().any(|&x| x < 0) {
                    return Err(reject());
                }
                Ok(Weight::Lattice(coords))
            }
            Magma::FieldVectors { .. } => Ok(Weight::Field(w.to_field())),
        }
    }

    /// `a + b` in this magma; both operands must already be members.
    pub fn add<F: ExactField>(&self, a: &Weight<F>, b: &Weight<F>) -> Result<Weight<F>> {
        let sum = match (a, b) {
            (Weight::Lattice(x), Weight::Lattice(y)) if x.len() == y.len() => {
                let mut out = Vec::with_capacity(x.len());
                for (p, q) in x.iter().zip(y) {
                    out.push(p.checked_add(*q).ok_or_else(|| {
                        nilgrade_exact::ExactError::Overflow(format!("{a} + {b}"))
                    })?);
                }
                Weight::Lattice(out)
            }
            (Weight::Field(x), Weight::Field(y)) if x.len() == y.len() => Weight::Field(
                x.iter()
                    .zip(y)
                    .map(|(p, q)| p.clone() + q.clone())
                    .collect(),
            ),
            _ => {
                return Err(GradingError::RankMismatch {
                    description: format!("cannot add {a} and {b}"),
                });
            }
        };
        self.coerce(&sum)
    }

    /// The magma all `weights` naturally live in: `Z^k` for integer tuples,
    /// field vectors otherwise.
    pub fn infer<'a, F: ExactField>(
        weights: impl IntoIterator<Item = &'a Weight<F>>,
    ) -> Result<Self> {
        let mut rank = None;
        let mut lattice = true;
        for w in weights {
            match rank {
                None => rank = Some(w.len()),
                Some(r) if r != w.len() => {
                    return Err(GradingError::MalformedGrading {
                        description: format!("weights of lengths {r} and {} are mixed", w.len()),
                    });
                }
                _ => {}
            }
            lattice &= w.to_lattice().is_some();
        }
        let Some(rank) = rank else {
            return Err(GradingError::MalformedGrading {
                description: "no weights to infer a magma from".to_string(),
            });
        };
        Ok(if lattice {
            Magma::free(rank)
        } else {
            Magma::FieldVectors { rank }
        })
    }
}

impl fmt::Display for Magma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Magma::Abelian(g) => write!(f, "{g}"),
            Magma::FreeMonoid { rank: 1 } => write!(f, "N"),
            Magma::FreeMonoid { rank } => write!(f, "N^{rank}"),
            Magma::FieldVectors { rank } => write!(f, "F^{rank}"),
        }
    }
}

/// A grading weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weight<F> {
    Lattice(Vec<i64>),
    Field(Vec<F>),
}

impl<F: ExactField> Weight<F> {
    pub fn lattice(coords: impl Into<Vec<i64>>) -> Self {
        Weight::Lattice(coords.into())
    }

    pub fn len(&self) -> usize {
        match self {
            Weight::Lattice(x) => x.len(),
            Weight::Field(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Weight::Lattice(x) => x.iter().all(|&c| c == 0),
            Weight::Field(x) => x.iter().all(|c| c.is_zero()),
        }
    }

    pub fn as_lattice(&self) -> Option<&[i64]> {
        match self {
            Weight::Lattice(x) => Some(x),
            Weight::Field(_) => None,
        }
    }

    /// Integer coordinates, if every coordinate is a machine integer.
    pub fn to_lattice(&self) -> Option<Vec<i64>> {
        match self {
            Weight::Lattice(x) => Some(x.clone()),
            Weight::Field(x) => x
                .iter()
                .map(|c| c.as_integer().and_then(|n| i64::try_from(n).ok()))
                .collect(),
        }
    }

    pub fn to_field(&self) -> Vec<F> {
        match self {
            Weight::Lattice(x) => x.iter().map(|&c| F::from_int(c)).collect(),
            Weight::Field(x) => x.clone(),
        }
    }
}

impl<F: ExactField> fmt::Display for Weight<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = match self {
            Weight::Lattice(x) => x.iter().map(|c| c.to_string()).collect(),
            Weight::Field(x) => x.iter().map(|c| c.to_string()).collect(),
        };
        if parts.len() == 1 {
            write!(f, "{}", parts[0])
        } else {
            write!(f, "({})", parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nilgrade_exact::{Rational, rational};

    type W = Weight<Rational>;

    #[test]
    fn torsion_coordinates_are_reduced() {
        let g = Magma::Abelian(AbelianGroup::new(vec![2, 0]));
        let w = g.coerce(&W::lattice([3, -4])).unwrap();
        assert_eq!(w, W::lattice([1, -4]));
        let sum = g.add(&W::lattice([1, 1]), &W::lattice([1, 2])).unwrap();
        assert_eq!(sum, W::lattice([0, 3]));
        assert_eq!(g.to_string(), "Z/2 + Z");
    }

    #[test]
    fn coercion_rejects_non_members() {
        let z2 = Magma::free(2);
        assert!(z2.coerce(&W::lattice([1])).is_err());
        assert!(z2.coerce(&W::Field(vec![rational(1, 2), Rational::from_int(0)])).is_err());
        assert_eq!(
            z2.coerce(&W::Field(vec![Rational::from_int(2), Rational::from_int(-1)]))
                .unwrap(),
            W::lattice([2, -1])
        );
        let monoid = Magma::FreeMonoid { rank: 1 };
        assert!(monoid.coerce(&W::lattice([-1])).is_err());
    }

    #[test]
    fn inference_prefers_lattices() {
        let ws = [W::lattice([1, 0]), W::lattice([0, 1])];
        assert_eq!(Magma::infer(ws.iter()).unwrap(), Magma::free(2));
        let fs = [W::Field(vec![rational(1, 2)])];
        assert_eq!(Magma::infer(fs.iter()).unwrap(), Magma::FieldVectors { rank: 1 });
    }

    #[test]
    fn weights_display_compactly() {
        assert_eq!(W::lattice([3]).to_string(), "3");
        assert_eq!(W::lattice([1, 2]).to_string(), "(1, 2)");
        assert_eq!(Magma::trivial().to_string(), "0");
        assert_eq!(Magma::free(3).to_string(), "Z^3");
    }
}
