// Modules
pub mod classifier;
pub mod config;
pub mod constants;
pub mod data;
pub mod errors;
pub mod metrics;
pub mod owl;
pub mod simulate;
pub mod utils;

// Individual classes, and functions
pub use config::{ConfigIO, PipelineConfig, SplitConfig};
pub use data::{Cohort, Matrix};
pub use errors::OwlError;
pub use owl::{
    assign_cost, calculate_owl_weights, owl_weights, train_owl_svm, CostConfig, FrontierRow, FrontierSweep,
    FrontierTable, NuisanceFit, OwlColumns, OwlConfig, OwlFit, RiskPropensityEstimator, WeightParams,
};
