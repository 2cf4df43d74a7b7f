//! Readmission trial frontier.
//!
//! Simulates a trial where the treatment prevents readmission with a
//! subgroup-dependent probability, then sweeps the risk/cost trade-off and
//! prints the frontier as CSV.
//!
//! `RUST_LOG=info cargo run --example readmission_frontier`
use owl_frontier::config::PipelineConfig;
use owl_frontier::errors::OwlError;
use owl_frontier::owl::OwlColumns;
use owl_frontier::simulate::{assign_subgroups, OutcomeSimulator, ReductionStrategy, SubgroupConfig, SyntheticCohort};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;

fn main() -> Result<(), OwlError> {
    env_logger::init();

    let generator = SyntheticCohort {
        n_subjects: 500,
        ..Default::default()
    };
    let cohort = generator.generate()?;
    let features: Vec<String> = (0..generator.n_features).map(|i| format!("x{}", i)).collect();

    let mut baseline_features = features.clone();
    baseline_features.push("Tx".to_string());
    let cohort = assign_subgroups(&cohort, &baseline_features, "Readmit", &SubgroupConfig::default())?;

    let simulator = OutcomeSimulator::readmission(0.4, 0.5, 0.85, 0.6, ReductionStrategy::Skewed { width: 0.1 });
    let mut rng = StdRng::seed_from_u64(generator.seed);
    let cohort = simulator.simulate(&cohort, "Tx", "Readmit", "subgroup", &mut rng)?;

    let config = PipelineConfig {
        columns: OwlColumns::new(features, "Tx", "cost", &simulator.output_column),
        ..Default::default()
    };
    let table = config.run(&cohort)?;
    table.write_csv(io::stdout())
}
