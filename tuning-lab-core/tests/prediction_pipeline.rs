//! End-to-end checks of the core crate: prediction, geometry and plotting.

use tuning_lab_core::geometry::{GeometryConfig, TonefieldShape};
use tuning_lab_core::model::{DummyLinearModel, active_model};
use tuning_lab_core::plot::tonefield_plot;
use tuning_lab_core::{LabError, ModelKind, TuningErrors, predict};

#[test]
fn predict_validates_before_running_the_model() {
    let model = DummyLinearModel;
    let err = predict(&model, TuningErrors::new(60.0, 0.0, 0.0)).unwrap_err();
    assert!(matches!(err, LabError::InputOutOfRange { field: "tonic", .. }));
}

#[test]
fn predict_reports_model_name() {
    let model = active_model(ModelKind::Dummy);
    let prediction = predict(model.as_ref(), TuningErrors::new(5.0, -2.0, 3.0)).unwrap();
    assert_eq!(prediction.model_name, "Dummy Linear Model");
    assert!((prediction.hit.l - 0.4).abs() < 1e-9);
}

#[test]
fn stub_models_fail_after_validation() {
    let model = active_model(ModelKind::Ml);
    let err = predict(model.as_ref(), TuningErrors::default()).unwrap_err();
    assert_eq!(err.to_string(), "ML-based model not yet implemented");
}

#[test]
fn extreme_prediction_stays_on_the_tonefield() {
    // The largest dummy output lands well inside the drawn ellipse.
    let model = DummyLinearModel;
    let prediction = predict(&model, TuningErrors::new(50.0, 50.0, 50.0)).unwrap();
    let geometry = GeometryConfig::new();
    let (x, y) = geometry.geometry("A4").to_normalized(&prediction.hit);
    assert!(TonefieldShape::STANDARD.contains(x, y));
}

#[test]
fn plot_of_a_prediction_contains_its_label() {
    let model = DummyLinearModel;
    let prediction = predict(&model, TuningErrors::new(20.0, 10.0, -30.0)).unwrap();
    let geometry = GeometryConfig::new();
    let svg = tonefield_plot(Some(&prediction.hit), geometry.default_geometry(), None)
        .render()
        .unwrap();
    // L = 2.5, S = -3.3
    assert!(svg.contains("(2.5, -3.3)"), "{svg}");
}
