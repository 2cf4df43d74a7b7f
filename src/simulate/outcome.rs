//! Treatment effect simulation.
//!
//! For treated subjects with the adverse outcome, the treatment prevents the
//! outcome with a probability that depends on the subject's subgroup. The
//! subgroup → probability mapping is a rule table of distributions, so the
//! fixed and the skewed variants are the same simulator with different rules.
use crate::data::Cohort;
use crate::errors::OwlError;
use crate::utils::validate_float_parameter;
use hashbrown::HashMap;
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Distribution of the probability that treatment prevents the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReductionDistribution {
    /// Always the same probability.
    Point(f64),
    /// Drawn per subject from `U(low, high)`.
    Uniform { low: f64, high: f64 },
}

impl ReductionDistribution {
    fn validate(&self) -> Result<(), OwlError> {
        match self {
            ReductionDistribution::Point(p) => validate_float_parameter(*p, 0.0, 1.0, "reduction probability"),
            ReductionDistribution::Uniform { low, high } => {
                validate_float_parameter(*low, 0.0, 1.0, "low")?;
                validate_float_parameter(*high, *low, 1.0, "high")
            }
        }
    }

    fn draw_many(&self, n: usize, rng: &mut StdRng) -> Vec<f64> {
        match self {
            ReductionDistribution::Point(p) => vec![*p; n],
            ReductionDistribution::Uniform { low, high } if low < high => {
                let dist = Uniform::new(*low, *high);
                (0..n).map(|_| rng.sample(&dist)).collect()
            }
            ReductionDistribution::Uniform { low, .. } => vec![*low; n],
        }
    }
}

/// How the reduction probability of a subgroup is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ReductionStrategy {
    /// The base probability itself.
    #[default]
    Fixed,
    /// Uniform between the base probability and base + `width`.
    Skewed { width: f64 },
}

impl ReductionStrategy {
    fn distribution(&self, base: f64) -> ReductionDistribution {
        match self {
            ReductionStrategy::Fixed => ReductionDistribution::Point(base),
            ReductionStrategy::Skewed { width } => ReductionDistribution::Uniform {
                low: base,
                high: (base + width).min(1.0),
            },
        }
    }
}

/// Rule-table outcome simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSimulator {
    /// Reduction distribution per subgroup label.
    pub rules: HashMap<u32, ReductionDistribution>,
    /// Used for subgroups without a rule.
    pub fallback: ReductionDistribution,
    /// Name of the simulated outcome column.
    pub output_column: String,
}

impl OutcomeSimulator {
    pub fn new(fallback: ReductionDistribution) -> Self {
        OutcomeSimulator {
            rules: HashMap::new(),
            fallback,
            output_column: "Readmit_red".to_string(),
        }
    }

    pub fn with_rule(mut self, subgroup: u32, distribution: ReductionDistribution) -> Self {
        self.rules.insert(subgroup, distribution);
        self
    }

    /// The readmission trial: subgroup 1 benefits with probability `p * q`,
    /// every other subgroup with `p1 * q1`.
    pub fn readmission(p: f64, q: f64, p1: f64, q1: f64, strategy: ReductionStrategy) -> Self {
        OutcomeSimulator::new(strategy.distribution(p1 * q1)).with_rule(1, strategy.distribution(p * q))
    }

    fn distribution_for(&self, subgroup: u32) -> &ReductionDistribution {
        self.rules.get(&subgroup).unwrap_or(&self.fallback)
    }

    /// Simulate the post-treatment outcome.
    ///
    /// Subjects with `treatment * outcome == 1` keep the outcome unless a draw
    /// `u ~ U(0, 1)` falls below their subgroup's reduction probability. All
    /// other subjects keep their observed outcome. Returns a copy of the cohort
    /// with `output_column` added.
    pub fn simulate(
        &self,
        cohort: &Cohort,
        treatment: &str,
        outcome: &str,
        subgroup: &str,
        rng: &mut StdRng,
    ) -> Result<Cohort, OwlError> {
        self.fallback.validate()?;
        for d in self.rules.values() {
            d.validate()?;
        }
        let tx = cohort.binary_column(treatment)?;
        let y = cohort.binary_column(outcome)?;
        let groups: Vec<u32> = cohort
            .column(subgroup)?
            .iter()
            .map(|g| {
                if *g >= 0.0 && g.fract() == 0.0 && *g <= u32::MAX as f64 {
                    Ok(*g as u32)
                } else {
                    Err(OwlError::InvalidInput(format!(
                        "subgroup labels must be non-negative integers, found {}",
                        g
                    )))
                }
            })
            .collect::<Result<_, _>>()?;

        // Group eligible rows by subgroup and draw each group's probabilities at once.
        let mut eligible: HashMap<u32, Vec<usize>> = HashMap::new();
        for (i, ((t, o), g)) in tx.iter().zip(&y).zip(&groups).enumerate() {
            if t * o == 1 {
                eligible.entry(*g).or_default().push(i);
            }
        }
        let mut labels: Vec<u32> = eligible.keys().copied().collect();
        labels.sort_unstable();

        let unit = Uniform::new(0.0, 1.0);
        let mut reduced: Vec<f64> = y.iter().map(|v| f64::from(*v)).collect();
        for label in labels {
            let rows = &eligible[&label];
            let probs = self.distribution_for(label).draw_many(rows.len(), rng);
            let draws: Vec<f64> = (0..rows.len()).map(|_| rng.sample(&unit)).collect();
            for ((row, p), u) in rows.iter().zip(probs).zip(draws) {
                reduced[*row] = if u < p { 0.0 } else { 1.0 };
            }
        }

        let mut out = cohort.clone();
        out.insert_column(&self.output_column, reduced)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn trial(n: usize) -> Cohort {
        // Everyone treated and readmitted, alternating subgroups 0, 1, 2.
        Cohort::new((0..n as u64).collect())
            .with_column("Tx", vec![1.0; n])
            .unwrap()
            .with_column("Readmit", vec![1.0; n])
            .unwrap()
            .with_column("subgroup", (0..n).map(|i| (i % 3) as f64).collect())
            .unwrap()
    }

    fn reduction_rate(out: &Cohort, group: f64) -> f64 {
        let y = out.column("Readmit_red").unwrap();
        let g = out.column("subgroup").unwrap();
        let rows: Vec<f64> = y.iter().zip(g).filter(|(_, s)| **s == group).map(|(v, _)| *v).collect();
        1.0 - rows.iter().sum::<f64>() / rows.len() as f64
    }

    #[test]
    fn test_only_treated_readmitted_change() {
        let cohort = Cohort::new(vec![1, 2, 3, 4])
            .with_column("Tx", vec![0.0, 1.0, 0.0, 1.0])
            .unwrap()
            .with_column("Readmit", vec![1.0, 0.0, 0.0, 1.0])
            .unwrap()
            .with_column("subgroup", vec![1.0, 1.0, 1.0, 1.0])
            .unwrap();
        let sim = OutcomeSimulator::new(ReductionDistribution::Point(1.0)).with_rule(1, ReductionDistribution::Point(1.0));
        let mut rng = StdRng::seed_from_u64(0);
        let out = sim.simulate(&cohort, "Tx", "Readmit", "subgroup", &mut rng).unwrap();
        assert_eq!(out.column("Readmit_red").unwrap(), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(out.column("Readmit").unwrap(), cohort.column("Readmit").unwrap());
    }

    #[test]
    fn test_readmission_rates_by_subgroup() {
        let cohort = trial(30_000);
        let sim = OutcomeSimulator::readmission(0.4, 0.5, 0.85, 0.6, ReductionStrategy::Fixed);
        let mut rng = StdRng::seed_from_u64(42);
        let out = sim.simulate(&cohort, "Tx", "Readmit", "subgroup", &mut rng).unwrap();
        assert!((reduction_rate(&out, 1.0) - 0.2).abs() < 0.02);
        assert!((reduction_rate(&out, 0.0) - 0.51).abs() < 0.02);
        assert!((reduction_rate(&out, 2.0) - 0.51).abs() < 0.02);
    }

    #[test]
    fn test_skewed_strategy_raises_reduction() {
        let cohort = trial(30_000);
        let sim = OutcomeSimulator::readmission(0.4, 0.5, 0.85, 0.6, ReductionStrategy::Skewed { width: 0.1 });
        let mut rng = StdRng::seed_from_u64(42);
        let out = sim.simulate(&cohort, "Tx", "Readmit", "subgroup", &mut rng).unwrap();
        // Mean of U(0.2, 0.3) is 0.25.
        assert!((reduction_rate(&out, 1.0) - 0.25).abs() < 0.02);
        assert!((reduction_rate(&out, 0.0) - 0.56).abs() < 0.02);
    }

    #[test]
    fn test_simulation_is_seeded() {
        let cohort = trial(300);
        let sim = OutcomeSimulator::readmission(0.4, 0.5, 0.85, 0.6, ReductionStrategy::Skewed { width: 0.1 });
        let a = sim
            .simulate(&cohort, "Tx", "Readmit", "subgroup", &mut StdRng::seed_from_u64(5))
            .unwrap();
        let b = sim
            .simulate(&cohort, "Tx", "Readmit", "subgroup", &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(a.column("Readmit_red").unwrap(), b.column("Readmit_red").unwrap());
    }

    #[test]
    fn test_invalid_rules_and_labels() {
        let cohort = trial(3);
        let sim = OutcomeSimulator::new(ReductionDistribution::Point(1.5));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sim.simulate(&cohort, "Tx", "Readmit", "subgroup", &mut rng).is_err());

        let mut bad = trial(3);
        bad.insert_column("subgroup", vec![0.0, 0.5, 1.0]).unwrap();
        let sim = OutcomeSimulator::readmission(0.4, 0.5, 0.85, 0.6, ReductionStrategy::Fixed);
        assert!(matches!(
            sim.simulate(&bad, "Tx", "Readmit", "subgroup", &mut rng),
            Err(OwlError::InvalidInput(_))
        ));
    }
}
