// tuning-lab-core/src/lib.rs

//! The core logic for the tuning lab.
//! This crate maps tuning errors to tonefield hit points, describes the
//! tonefield geometry, renders plots and talks to the visual-effects tool.
//! It is completely headless and contains no GUI or HTTP code.

pub mod config;
pub mod error;
pub mod geometry;
pub mod impact;
pub mod model;
pub mod osc;
pub mod plot;
pub mod samples;
pub mod tuning;

pub use error::{LabError, Result};
pub use model::{HitModel, HitPoint, ModelInfo, ModelKind, TuningErrors};

/// The outcome of running the active model on one set of tuning errors.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Prediction {
    /// The errors that were fed to the model.
    pub errors: TuningErrors,
    /// The predicted hit point in field coordinates.
    pub hit: HitPoint,
    /// Name of the model that produced the hit point.
    pub model_name: String,
}

/// Validates `errors` and runs them through `model`.
pub fn predict(model: &dyn HitModel, errors: TuningErrors) -> Result<Prediction> {
    errors.validate()?;
    let hit = model.predict(&errors)?;
    Ok(Prediction {
        errors,
        hit,
        model_name: model.name(),
    })
}
