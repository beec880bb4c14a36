//! Search budgets for the combinatorial and symbolic solvers.
//!
//! ```toml
//! max_weight_maps = 1000000
//! max_groebner_pairs = 50000
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GradingError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Upper bound on candidate weight permutations in an isomorphism search.
    pub max_weight_maps: u64,
    /// S-pairs processed before a Groebner basis computation gives up.
    pub max_groebner_pairs: usize,
    /// Nodes explored by branch and bound in positive realizations.
    pub max_branch_nodes: usize,
    /// Distinct difference subspaces enumerated for torsion-free gradings.
    pub max_quotient_subspaces: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_weight_maps: 1_000_000,
            max_groebner_pairs: 50_000,
            max_branch_nodes: 20_000,
            max_quotient_subspaces: 100_000,
        }
    }
}

impl Limits {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GradingError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| GradingError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_defaults() {
        let limits = Limits::from_toml_str("max_weight_maps = 12\n").unwrap();
        assert_eq!(limits.max_weight_maps, 12);
        assert_eq!(limits.max_groebner_pairs, Limits::default().max_groebner_pairs);
    }

    #[test]
    fn documented_values_are_the_defaults() {
        let text = "max_weight_maps = 1000000\nmax_groebner_pairs = 50000\n";
        assert_eq!(Limits::from_toml_str(text).unwrap(), Limits::default());
    }

    #[test]
    fn malformed_files_are_config_errors() {
        let err = Limits::from_toml_str("max_weight_maps = \"many\"").unwrap_err();
        assert!(matches!(err, GradingError::Config(_)));
    }
}
