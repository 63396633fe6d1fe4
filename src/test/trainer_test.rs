use super::*;

fn create_pattern_set(n_examples: usize) -> Array2<bool> {
    let pattern = [true, true, false, false];
    Array2::from_shape_fn((n_examples, 4), |(_, i)| pattern[i])
}

#[test]
fn test_default_trainer() {
    let trainer = ContrastiveDivergence::default();

    assert_eq!(trainer.get_learning_rate(), 0.001);
    assert_eq!(trainer.get_chain_length(), 50);
    assert_eq!(trainer.get_batch_size(), 10);
    assert!(!trainer.get_persistent_chain());
    assert_eq!(trainer.get_random_seed(), None);
    assert_eq!(trainer.get_n_updates(), 0);
    assert!(trainer.get_negative_chain().is_none());
}

#[test]
fn test_new_validates_hyperparameters() {
    assert!(matches!(
        ContrastiveDivergence::new(0.0, 1, 1, None),
        Err(RbmError::InvalidInput(_))
    ));
    assert!(matches!(
        ContrastiveDivergence::new(f64::NAN, 1, 1, None),
        Err(RbmError::InvalidInput(_))
    ));
    assert!(matches!(
        ContrastiveDivergence::new(0.1, 0, 1, None),
        Err(RbmError::InvalidInput(_))
    ));
    assert!(matches!(
        ContrastiveDivergence::new(0.1, 1, 0, None),
        Err(RbmError::InvalidInput(_))
    ));

    let mut trainer = ContrastiveDivergence::new(0.1, 2, 3, Some(1)).unwrap();
    assert!(trainer.set_learning_rate(-1.0).is_err());
    assert_eq!(trainer.get_learning_rate(), 0.1);
    trainer.set_learning_rate(0.5).unwrap();
    assert_eq!(trainer.get_learning_rate(), 0.5);
}

#[test]
fn test_update_rejects_bad_training_set_without_touching_model() {
    let mut model = Rbm::with_random_weights(4, 2, 0.1, Some(1)).unwrap();
    let before = model.clone();
    let mut trainer = ContrastiveDivergence::new(0.1, 1, 2, Some(1)).unwrap();

    let empty = Array2::<bool>::from_elem((0, 4), false);
    assert!(matches!(
        trainer.update(&mut model, &empty),
        Err(RbmError::InvalidInput(_))
    ));

    let too_wide = Array2::<bool>::from_elem((3, 5), true);
    assert!(matches!(
        trainer.update(&mut model, &too_wide),
        Err(RbmError::InvalidInput(_))
    ));

    assert_eq!(model, before);
    assert_eq!(trainer.get_n_updates(), 0);
}

#[test]
fn test_single_example_update_is_exact() {
    // With one example, a zero model and a unit learning rate the new parameters are
    // exactly the positive statistics minus the negative chain statistics
    let example = array![true, false, true, true, false, false];
    let training_set = example.clone().insert_axis(Axis(0));
    let mut model = Rbm::new(6, 3).unwrap();
    let mut trainer = ContrastiveDivergence::new(1.0, 3, 1, Some(12)).unwrap();

    let report = trainer.update(&mut model, &training_set).unwrap();
    assert_eq!(report.get_batch_indices(), &[0]);

    let chain = trainer.get_negative_chain().unwrap().clone();
    let x = example.mapv(f64::from);
    let v = chain.visible.mapv(f64::from);
    let h = chain.hidden.mapv(f64::from);

    assert_eq!(model.get_visible_biases(), &(&x - &v));

    // hb = h_pos - h_neg, so h_pos can be recovered from the hidden biases
    let positive_hidden = model.get_hidden_biases() + &h;
    assert!(positive_hidden.iter().all(|&p| p == 0.0 || p == 1.0));

    for i in 0..6 {
        for j in 0..3 {
            let expected = x[i] * positive_hidden[j] - v[i] * h[j];
            assert_eq!(model.get_weights()[[i, j]], expected);
        }
    }

    let expected_error = example
        .iter()
        .zip(chain.visible.iter())
        .filter(|(a, b)| a != b)
        .count() as f64
        / 6.0;
    assert_abs_diff_eq!(report.get_reconstruction_errors()[0], expected_error);
}

#[test]
fn test_update_report() {
    let training_set = create_pattern_set(7);
    let mut model = Rbm::new(4, 2).unwrap();
    let mut trainer = ContrastiveDivergence::new(0.1, 1, 12, Some(3)).unwrap();

    // The batch may be larger than the training set since rows are drawn with replacement
    let report = trainer.update(&mut model, &training_set).unwrap();
    assert_eq!(report.get_batch_indices().len(), 12);
    assert!(report.get_batch_indices().iter().all(|&idx| idx < 7));
    assert_eq!(report.get_reconstruction_errors().len(), 12);
    assert!(
        report
            .get_reconstruction_errors()
            .iter()
            .all(|&e| (0.0..=1.0).contains(&e))
    );
    assert_abs_diff_eq!(
        report.mean_reconstruction_error(),
        report.get_reconstruction_errors().mean().unwrap()
    );
    assert_eq!(trainer.get_n_updates(), 1);
}

#[test]
fn test_seeded_updates_are_reproducible() {
    let training_set = create_pattern_set(10);

    let run = || {
        let mut model = Rbm::new(4, 3).unwrap();
        let mut trainer = ContrastiveDivergence::new(0.05, 2, 4, Some(77)).unwrap();
        let reports = trainer.fit(&mut model, &training_set, 5).unwrap();
        (model, reports)
    };

    let (model_a, reports_a) = run();
    let (model_b, reports_b) = run();
    assert_eq!(model_a, model_b);
    assert_eq!(reports_a, reports_b);
}

#[test]
fn test_large_model_update_is_reproducible() {
    // Weight matrix above the trainer parallel threshold
    let training_set = Array2::from_shape_fn((6, 200), |(r, c)| (r + c) % 3 == 0);

    let run = || {
        let mut model = Rbm::new(200, 100).unwrap();
        let mut trainer = ContrastiveDivergence::new(0.01, 1, 3, Some(5)).unwrap();
        trainer.update(&mut model, &training_set).unwrap();
        model
    };

    let model = run();
    assert_eq!(model, run());
    assert!(model.get_weights().iter().all(|w| w.is_finite()));
}

// Weights of 100 on the diagonal with biases of -50 make every state a fixed point of
// the Gibbs sweep: unit i of either layer copies unit i of the other layer.
fn create_copying_model() -> Rbm {
    Rbm::from_parameters(
        Array1::from_elem(16, -50.0),
        Array1::from_elem(16, -50.0),
        Array2::eye(16) * 100.0,
    )
    .unwrap()
}

#[test]
fn test_persistent_chain_is_carried_across_updates() {
    let training_set = Array2::from_elem((4, 16), true);
    let mut model = create_copying_model();
    let mut trainer = ContrastiveDivergence::new(1e-6, 2, 2, Some(31))
        .unwrap()
        .with_persistent_chain(true);

    trainer.update(&mut model, &training_set).unwrap();
    let first = trainer.get_negative_chain().unwrap().clone();
    trainer.update(&mut model, &training_set).unwrap();
    let second = trainer.get_negative_chain().unwrap().clone();

    assert_eq!(first, second);
    assert_eq!(first.visible, first.hidden);
}

#[test]
fn test_fresh_chain_is_rebuilt_each_update() {
    let training_set = Array2::from_elem((4, 16), true);
    let mut model = create_copying_model();
    let mut trainer = ContrastiveDivergence::new(1e-6, 2, 2, Some(31)).unwrap();

    trainer.update(&mut model, &training_set).unwrap();
    let first = trainer.get_negative_chain().unwrap().clone();
    trainer.update(&mut model, &training_set).unwrap();
    let second = trainer.get_negative_chain().unwrap().clone();

    // Each chain freezes on its own random start
    assert_ne!(first.visible, second.visible);
}

#[test]
fn test_fit() {
    let training_set = create_pattern_set(20);
    let mut model = Rbm::new(4, 2).unwrap();
    let mut trainer = ContrastiveDivergence::new(0.1, 1, 5, Some(42)).unwrap();

    let reports = trainer.fit(&mut model, &training_set, 30).unwrap();
    assert_eq!(reports.len(), 30);
    assert_eq!(trainer.get_n_updates(), 30);

    assert!(matches!(
        trainer.fit(&mut model, &training_set, 0),
        Err(RbmError::InvalidInput(_))
    ));
}
