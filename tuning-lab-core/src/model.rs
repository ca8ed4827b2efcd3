//! # Hit Model Module
//!
//! Converts tuning errors into tonefield coordinates.
//!
//! Input: `(tonic, octave, fifth)` tuning errors in cents.
//! Output: `(L, S, strength)` tonefield coordinates and hit strength.
//!
//! Models sit behind the [`HitModel`] trait so the algorithm can be swapped
//! without touching the server or the GUI. Only [`DummyLinearModel`] predicts
//! anything; the physics and ML models are placeholders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LabError, Result};

/// Accepted range for each tuning error, in cents.
pub const ERROR_RANGE_CENTS: f64 = 50.0;

/// The three tuning errors of a single note, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TuningErrors {
    pub tonic: f64,
    pub octave: f64,
    pub fifth: f64,
}

impl TuningErrors {
    pub fn new(tonic: f64, octave: f64, fifth: f64) -> Self {
        Self { tonic, octave, fifth }
    }

    /// Checks that every error is finite and within ±50 cents.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("tonic", self.tonic),
            ("octave", self.octave),
            ("fifth", self.fifth),
        ] {
            if !value.is_finite() || value.abs() > ERROR_RANGE_CENTS {
                return Err(LabError::InputOutOfRange {
                    field,
                    value,
                    min: -ERROR_RANGE_CENTS,
                    max: ERROR_RANGE_CENTS,
                });
            }
        }
        Ok(())
    }

    /// Sum of absolute errors.
    pub fn total_abs(&self) -> f64 {
        self.tonic.abs() + self.octave.abs() + self.fifth.abs()
    }
}

/// A predicted hit on the tonefield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HitPoint {
    /// Long dimension coordinate.
    pub l: f64,
    /// Short dimension coordinate.
    pub s: f64,
    /// Hit strength (0.0 to 1.0).
    pub strength: f64,
}

/// Human readable formula of a model, one entry per output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    #[serde(rename = "L")]
    pub l: String,
    #[serde(rename = "S")]
    pub s: String,
    pub strength: String,
}

/// Descriptive metadata reported by every model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<Formula>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Interface shared by all hit models.
pub trait HitModel: Send + Sync {
    /// Converts tuning errors to tonefield coordinates and hit strength.
    fn predict(&self, errors: &TuningErrors) -> Result<HitPoint>;

    fn info(&self) -> ModelInfo;

    fn name(&self) -> String {
        self.info().name
    }
}

/// Placeholder linear model used until a real model exists.
///
/// - `L = tonic * 0.1 + octave * 0.05`
/// - `S = fifth * 0.1 - octave * 0.03`
/// - `strength = min(1.0, (|tonic| + |octave| + |fifth|) / 100.0)`
#[derive(Debug, Clone, Default)]
pub struct DummyLinearModel;

impl DummyLinearModel {
    pub const NAME: &'static str = "Dummy Linear Model";
    pub const VERSION: &'static str = "0.1.0";
}

impl HitModel for DummyLinearModel {
    fn predict(&self, errors: &TuningErrors) -> Result<HitPoint> {
        let TuningErrors { tonic, octave, fifth } = *errors;
        let l = tonic * 0.1 + octave * 0.05;
        let s = fifth * 0.1 - octave * 0.03;
        // Strength grows with the total error, saturating at 1.0.
        let strength = (errors.total_abs() / 100.0).min(1.0);
        Ok(HitPoint { l, s, strength })
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: Self::NAME.to_string(),
            version: Self::VERSION.to_string(),
            description: "Simple linear transformation for testing".to_string(),
            formula: Some(Formula {
                l: "tonic * 0.1 + octave * 0.05".to_string(),
                s: "fifth * 0.1 - octave * 0.03".to_string(),
                strength: "min(1.0, (|tonic| + |octave| + |fifth|) / 100.0)".to_string(),
            }),
            status: None,
        }
    }
}

/// Model reflecting the physical characteristics of the instrument.
/// Not implemented yet.
#[derive(Debug, Clone, Default)]
pub struct PhysicsBasedModel;

impl HitModel for PhysicsBasedModel {
    fn predict(&self, _errors: &TuningErrors) -> Result<HitPoint> {
        Err(LabError::NotImplemented("Physics-based model".to_string()))
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: "Physics-Based Model".to_string(),
            version: "0.0.1".to_string(),
            description: "Physics-based model (not yet implemented)".to_string(),
            formula: None,
            status: Some("placeholder".to_string()),
        }
    }
}

/// Model trained from experimental data. Not implemented yet.
#[derive(Debug, Clone, Default)]
pub struct MlBasedModel;

impl HitModel for MlBasedModel {
    fn predict(&self, _errors: &TuningErrors) -> Result<HitPoint> {
        Err(LabError::NotImplemented("ML-based model".to_string()))
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: "ML-Based Model".to_string(),
            version: "0.0.1".to_string(),
            description: "Machine learning based model (not yet implemented)".to_string(),
            formula: None,
            status: Some("placeholder".to_string()),
        }
    }
}

/// Selector for the active model, as written in config files and CLI flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Dummy,
    Physics,
    Ml,
}

impl FromStr for ModelKind {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dummy" => Ok(Self::Dummy),
            "physics" => Ok(Self::Physics),
            "ml" => Ok(Self::Ml),
            _ => Err(LabError::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dummy => "dummy",
            Self::Physics => "physics",
            Self::Ml => "ml",
        };
        f.write_str(name)
    }
}

/// Returns the model selected by `kind`.
pub fn active_model(kind: ModelKind) -> Box<dyn HitModel> {
    match kind {
        ModelKind::Dummy => Box::new(DummyLinearModel),
        ModelKind::Physics => Box::new(PhysicsBasedModel),
        ModelKind::Ml => Box::new(MlBasedModel),
    }
}
