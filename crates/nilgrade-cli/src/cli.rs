use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nilgrade",
    about = "Nilgrade: gradings of nilpotent Lie algebras, computed and classified exactly",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the Lie algebra comes from, and how to report on it.
#[derive(Args, Debug, Clone)]
pub struct AlgebraInput {
    /// Catalog algebra name (see `nilgrade catalog`)
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub algebra: Option<String>,

    /// Path to a JSON algebra file
    #[arg(long)]
    pub file: Option<String>,

    /// Path to a TOML file of search limits
    #[arg(long)]
    pub config: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the catalog of nilpotent Lie algebras
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Finest grading, from a maximal torus of derivations
    Maximal {
        #[command(flatten)]
        input: AlgebraInput,
    },

    /// Every grading over a torsion-free abelian group
    TorsionFree {
        #[command(flatten)]
        input: AlgebraInput,
    },

    /// Stratification (Carnot grading), if one exists
    Stratify {
        #[command(flatten)]
        input: AlgebraInput,
    },

    /// Maximal grading realized over Z with positive weights
    Positive {
        #[command(flatten)]
        input: AlgebraInput,

        /// Accept any separating weights instead of minimizing the largest
        #[arg(long)]
        fast: bool,
    },

    /// Maximal grading realized over Z
    Integer {
        #[command(flatten)]
        input: AlgebraInput,

        /// Replace a grading with torsion by its torsion-free coarsening
        #[arg(long)]
        coarsen: bool,
    },

    /// Torsion-free gradings grouped into isomorphism classes
    Classify {
        #[command(flatten)]
        input: AlgebraInput,

        /// Eliminate linear variables from the isomorphism equations
        #[arg(long)]
        reduced: bool,

        /// Print the certificates joining each class
        #[arg(long)]
        certificates: bool,
    },
}
