//! Simulation
//!
//! Synthetic cohorts, baseline-risk subgroups and simulated treatment effects
//! for exercising the OWL pipeline on data with a known mechanism.
pub mod outcome;
pub mod subgroups;
pub mod synthetic;

pub use outcome::{OutcomeSimulator, ReductionDistribution, ReductionStrategy};
pub use subgroups::{assign_subgroups, SubgroupConfig};
pub use synthetic::SyntheticCohort;
