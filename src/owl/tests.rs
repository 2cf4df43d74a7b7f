#[cfg(test)]
mod owl_tests {
    use crate::classifier::BinaryClassifier;
    use crate::constants::{PREDICTED_TREATMENT_COLUMN, WEIGHT_COLUMN};
    use crate::data::{Cohort, Matrix};
    use crate::errors::OwlError;
    use crate::owl::estimator::NuisanceFit;
    use crate::owl::frontier::FrontierSweep;
    use crate::owl::trainer::train_owl_svm;
    use crate::owl::weights::calculate_owl_weights;
    use crate::owl::{OwlColumns, OwlConfig};
    use crate::simulate::synthetic::SyntheticCohort;

    fn splits() -> (Cohort, Cohort) {
        let cohort = SyntheticCohort::default().generate().unwrap();
        cohort.train_test_split(0.2, 42).unwrap()
    }

    fn flip_outcome(cohort: &Cohort, outcome: &str) -> Cohort {
        let flipped: Vec<f64> = cohort.column(outcome).unwrap().iter().map(|y| 1.0 - y).collect();
        let mut out = cohort.clone();
        out.insert_column(outcome, flipped).unwrap();
        out
    }

    // -----------------------------------------------------------------------
    // End to end
    // -----------------------------------------------------------------------

    #[test]
    fn test_sweep_end_to_end() {
        let (train, test) = splits();
        let columns = OwlColumns::synthetic(5);
        let config = OwlConfig::default();
        let table = FrontierSweep::new(vec![0.0, 0.5, 1.0])
            .run(&train, &test, &columns, &config)
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.k_values(), vec![0.0, 0.5, 1.0]);
        for row in table.iter() {
            assert!((0.0..=1.0).contains(&row.test_accuracy));
            assert!(row.num_treated <= test.len());
            assert_eq!(row.total_cost, config.cost.high_cost * row.num_treated as f64);
            // Each treated subject contributes 1 / (risk + epsilon) >= 1.
            assert!(row.total_inverse_risk >= row.num_treated as f64);
        }
    }

    #[test]
    fn test_weights_strictly_positive() {
        let (train, _) = splits();
        let columns = OwlColumns::synthetic(5);
        for k in [0.0, 0.3, 1.0] {
            let weighted = calculate_owl_weights(&train, &columns, &OwlConfig::default().with_k(k)).unwrap();
            assert!(weighted.column(WEIGHT_COLUMN).unwrap().iter().all(|w| *w > 0.0 && w.is_finite()));
        }
    }

    #[test]
    fn test_sweep_is_idempotent_and_parallel_matches() {
        let (train, test) = splits();
        let columns = OwlColumns::synthetic(5);
        let config = OwlConfig::default();
        let sweep = FrontierSweep::new(vec![0.2, 0.8]);
        let first = sweep.run(&train, &test, &columns, &config).unwrap();
        let second = sweep.run(&train, &test, &columns, &config).unwrap();
        assert_eq!(first, second);
        let parallel = sweep.clone().parallel(true).run(&train, &test, &columns, &config).unwrap();
        assert_eq!(first, parallel);
    }

    #[test]
    fn test_caller_cohorts_not_mutated() {
        let (train, test) = splits();
        let (train_before, test_before) = (train.clone(), test.clone());
        let fit = train_owl_svm(&train, &test, &OwlColumns::synthetic(5), &OwlConfig::default()).unwrap();
        assert_eq!(train, train_before);
        assert_eq!(test, test_before);
        assert!(!test.has_column(PREDICTED_TREATMENT_COLUMN));
        assert!(fit.evaluation.has_column(PREDICTED_TREATMENT_COLUMN));
    }

    // -----------------------------------------------------------------------
    // Evaluation split isolation
    // -----------------------------------------------------------------------

    #[test]
    fn test_predictions_ignore_evaluation_outcomes() {
        let (train, test) = splits();
        let columns = OwlColumns::synthetic(5);
        let flipped = flip_outcome(&test, &columns.outcome);

        for nuisance in [NuisanceFit::PerCohort, NuisanceFit::TrainOnly] {
            let config = OwlConfig {
                nuisance,
                ..Default::default()
            };
            let a = train_owl_svm(&train, &test, &columns, &config).unwrap();
            let b = train_owl_svm(&train, &flipped, &columns, &config).unwrap();
            assert_eq!(
                a.evaluation.column(PREDICTED_TREATMENT_COLUMN).unwrap(),
                b.evaluation.column(PREDICTED_TREATMENT_COLUMN).unwrap()
            );
            assert_eq!(a.num_treated, b.num_treated);
            assert_eq!(a.total_cost, b.total_cost);
            assert_eq!(a.test_accuracy, b.test_accuracy);
            if nuisance == NuisanceFit::TrainOnly {
                assert_eq!(a.summary(), b.summary());
            }
        }
    }

    #[test]
    fn test_recommend_matches_evaluation_predictions() {
        let (train, test) = splits();
        let fit = train_owl_svm(&train, &test, &OwlColumns::synthetic(5), &OwlConfig::default()).unwrap();
        let recommended: Vec<f64> = fit.recommend(&test).unwrap().into_iter().map(f64::from).collect();
        assert_eq!(recommended.as_slice(), fit.evaluation.column(PREDICTED_TREATMENT_COLUMN).unwrap());
        assert_eq!(recommended.iter().sum::<f64>() as usize, fit.num_treated);
    }

    #[test]
    fn test_probability_output() {
        let (train, test) = splits();
        let columns = OwlColumns::synthetic(5);
        let config = OwlConfig {
            probability: true,
            nuisance: NuisanceFit::TrainOnly,
            ..Default::default()
        };
        let fit = train_owl_svm(&train, &test, &columns, &config).unwrap();
        let data = test.feature_matrix(&columns.features).unwrap();
        let scaled = fit.scaler.transform(&Matrix::new(&data, test.len(), 5)).unwrap();
        let matrix = Matrix::new(&scaled, test.len(), 5);
        let proba = fit.classifier.predict_proba(&matrix).unwrap();
        assert_eq!(proba.len(), test.len());
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(fit.classifier.predict(&matrix).len(), test.len());

        let uncalibrated = train_owl_svm(&train, &test, &columns, &OwlConfig::default()).unwrap();
        assert!(uncalibrated.classifier.predict_proba(&matrix).is_err());
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[test]
    fn test_sweep_wraps_invalid_k() {
        let (train, test) = splits();
        let err = FrontierSweep::new(vec![0.5, 1.5])
            .run(&train, &test, &OwlColumns::synthetic(5), &OwlConfig::default())
            .unwrap_err();
        match err {
            OwlError::SweepFailed { k, source } => {
                assert_eq!(k, 1.5);
                assert!(matches!(*source, OwlError::InvalidConfiguration(..)));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_insufficient_data() {
        let (train, test) = splits();
        let columns = OwlColumns::synthetic(5);
        let config = OwlConfig::default();

        let empty = test.select_rows(&[]);
        assert!(matches!(
            train_owl_svm(&train, &empty, &columns, &config),
            Err(OwlError::InsufficientData(_))
        ));

        let treated: Vec<usize> = test
            .column(&columns.treatment)
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == 1.0)
            .map(|(i, _)| i)
            .collect();
        let single_class = test.select_rows(&treated);
        assert!(matches!(
            train_owl_svm(&train, &single_class, &columns, &config),
            Err(OwlError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_missing_column() {
        let (train, test) = splits();
        let columns = OwlColumns::new(vec!["x0".to_string(), "nope".to_string()], "Tx", "cost", "Readmit");
        assert!(matches!(
            train_owl_svm(&train, &test, &columns, &OwlConfig::default()),
            Err(OwlError::InvalidInput(_))
        ));
    }
}
