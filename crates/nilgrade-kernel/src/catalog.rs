//! Nilpotent Lie algebras of dimension at most five over the rationals.
//!
//! Entry `Ln_k` has basis `X1 .. Xn`; every listed bracket has coefficient
//! one and unlisted brackets vanish.

use nilgrade_exact::{ExactField, Rational};

use crate::algebra::LieAlgebra;
use crate::error::{GradingError, Result};

struct Entry {
    name: &'static str,
    dimension: usize,
    /// `[X_i, X_j] = X_k`, one-based.
    brackets: &'static [(usize, usize, usize)],
}

const ENTRIES: &[Entry] = &[
    Entry { name: "L1_1", dimension: 1, brackets: &[] },
    Entry { name: "L2_1", dimension: 2, brackets: &[] },
    Entry { name: "L3_1", dimension: 3, brackets: &[] },
    Entry { name: "L3_2", dimension: 3, brackets: &[(1, 2, 3)] },
    Entry { name: "L4_1", dimension: 4, brackets: &[] },
    Entry { name: "L4_2", dimension: 4, brackets: &[(1, 2, 3)] },
    Entry { name: "L4_3", dimension: 4, brackets: &[(1, 2, 3), (1, 3, 4)] },
    Entry { name: "L5_1", dimension: 5, brackets: &[] },
    Entry { name: "L5_2", dimension: 5, brackets: &[(1, 2, 3)] },
    Entry { name: "L5_3", dimension: 5, brackets: &[(1, 2, 3), (1, 3, 4)] },
    Entry { name: "L5_4", dimension: 5, brackets: &[(1, 2, 5), (3, 4, 5)] },
    Entry {
        name: "L5_5",
        dimension: 5,
        brackets: &[(1, 2, 3), (1, 3, 5), (2, 4, 5)],
    },
    Entry {
        name: "L5_6",
        dimension: 5,
        brackets: &[(1, 2, 3), (1, 3, 4), (1, 4, 5), (2, 3, 5)],
    },
    Entry {
        name: "L5_7",
        dimension: 5,
        brackets: &[(1, 2, 3), (1, 3, 4), (1, 4, 5)],
    },
    Entry { name: "L5_8", dimension: 5, brackets: &[(1, 2, 4), (1, 3, 5)] },
    Entry {
        name: "L5_9",
        dimension: 5,
        brackets: &[(1, 2, 3), (1, 3, 4), (2, 3, 5)],
    },
];

/// Catalog names in order of dimension.
pub fn names() -> Vec<&'static str> {
    ENTRIES.iter().map(|e| e.name).collect()
}

pub fn algebra(name: &str) -> Result<LieAlgebra<Rational>> {
    let entry = ENTRIES
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| GradingError::UnknownAlgebra(name.to_string()))?;
    let basis: Vec<String> = (1..=entry.dimension).map(|i| format!("X{i}")).collect();
    let mut builder = LieAlgebra::builder(entry.name, &basis.iter().map(String::as_str).collect::<Vec<_>>());
    for &(i, j, k) in entry.brackets {
        builder = builder.bracket_owned(
            basis[i - 1].clone(),
            basis[j - 1].clone(),
            vec![(basis[k - 1].clone(), Rational::from_int(1))],
        );
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_is_nilpotent() {
        for name in names() {
            let a = algebra(name).unwrap();
            assert!(a.is_nilpotent().unwrap(), "{name}");
            assert_eq!(a.name(), name);
        }
        assert_eq!(names().len(), 16);
    }

    #[test]
    fn brackets_follow_the_table() {
        let a = algebra("L5_6").unwrap();
        let x = |i: usize| a.unit(i - 1);
        assert_eq!(a.format_element(&a.bracket(&x(2), &x(3))), "X5");
        assert_eq!(a.format_element(&a.bracket(&x(4), &x(1))), "-X5");
        assert_eq!(a.lower_central_series().unwrap().len(), 5);
    }

    #[test]
    fn unknown_names_are_reported() {
        let err = algebra("L6_1").unwrap_err();
        assert_eq!(err.to_string(), "unknown algebra: L6_1");
    }
}
