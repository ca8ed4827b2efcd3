//! # Impact Power Module
//!
//! Estimates how hard, and how many times, the hammer has to strike a hit
//! point to correct a tuning error. Physical constants live in
//! [`PhysicsConfig`] so the machine can be recalibrated from the config file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LabError, Result};

/// Upper bound on the number of strikes a plan may split into.
pub const MAX_STRIKES: u32 = 10;

/// Lower bound on the axis efficiency so diagonal hits stay finite.
const MIN_EFFICIENCY: f64 = 0.1;

/// Which partial of the note is being corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMode {
    Tonic,
    Octave,
    Fifth,
}

impl FromStr for ToneMode {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tonic" => Ok(Self::Tonic),
            "octave" => Ok(Self::Octave),
            "fifth" => Ok(Self::Fifth),
            other => Err(LabError::InvalidParameter {
                name: "mode",
                message: format!("'{other}' is not one of tonic, octave, fifth"),
            }),
        }
    }
}

impl fmt::Display for ToneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tonic => "tonic",
            Self::Octave => "octave",
            Self::Fifth => "fifth",
        })
    }
}

/// Structural stiffness of the tonefield per mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StiffnessK {
    #[serde(default = "StiffnessK::default_tonic")]
    pub tonic: f64,
    /// Long axis, more flexible.
    #[serde(default = "StiffnessK::default_octave")]
    pub octave: f64,
    /// Short axis, stiffer.
    #[serde(default = "StiffnessK::default_fifth")]
    pub fifth: f64,
}

impl StiffnessK {
    fn default_tonic() -> f64 {
        1.0
    }
    fn default_octave() -> f64 {
        0.9
    }
    fn default_fifth() -> f64 {
        1.2
    }

    pub fn for_mode(&self, mode: ToneMode) -> f64 {
        match mode {
            ToneMode::Tonic => self.tonic,
            ToneMode::Octave => self.octave,
            ToneMode::Fifth => self.fifth,
        }
    }
}

impl Default for StiffnessK {
    fn default() -> Self {
        Self {
            tonic: Self::default_tonic(),
            octave: Self::default_octave(),
            fifth: Self::default_fifth(),
        }
    }
}

/// Machine calibration constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Minimum strike force at which the surface starts to deform.
    #[serde(default = "PhysicsConfig::default_threshold_c")]
    pub threshold_c: f64,
    /// Sensitivity of the Hz to force conversion.
    #[serde(default = "PhysicsConfig::default_scaling_s")]
    pub scaling_s: f64,
    /// Safe force limit as a multiple of `threshold_c`.
    #[serde(default = "PhysicsConfig::default_safety_ratio")]
    pub safety_ratio: f64,
    #[serde(default)]
    pub stiffness: StiffnessK,
}

impl PhysicsConfig {
    fn default_threshold_c() -> f64 {
        20.0
    }
    fn default_scaling_s() -> f64 {
        30.0
    }
    fn default_safety_ratio() -> f64 {
        2.1
    }

    /// Maximum force a single strike may use.
    pub fn limit(&self) -> f64 {
        self.threshold_c * self.safety_ratio
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            threshold_c: Self::default_threshold_c(),
            scaling_s: Self::default_scaling_s(),
            safety_ratio: Self::default_safety_ratio(),
            stiffness: StiffnessK::default(),
        }
    }
}

/// Force per strike and number of strikes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactPlan {
    pub force: f64,
    pub count: u32,
}

/// Computes the strike plan for correcting `raw_hz` at normalized `coord`.
///
/// The threshold force is paid on every strike; only the energy above it is
/// split, by the square root of the strike count, until a strike fits under
/// [`PhysicsConfig::limit`].
pub fn calculate_impact_power(
    raw_hz: f64,
    coord: (f64, f64),
    mode: ToneMode,
    config: &PhysicsConfig,
) -> ImpactPlan {
    let limit = config.limit();

    // Hits off the main axis lose energy.
    let efficiency = coord.1.abs().max(MIN_EFFICIENCY);
    let effective_hz = raw_hz.abs() / efficiency;

    let stiffness = config.stiffness.for_mode(mode);
    let pure_energy = (effective_hz * config.scaling_s * stiffness).sqrt();
    let required_force = config.threshold_c + pure_energy;

    let (force, count) = if required_force > limit {
        (2..=MAX_STRIKES)
            .map(|count| {
                let split = pure_energy / (count as f64).sqrt();
                (config.threshold_c + split, count)
            })
            .find(|(force, _)| *force <= limit)
            .unwrap_or((limit, MAX_STRIKES))
    } else {
        (required_force, 1)
    };

    ImpactPlan {
        force: round_to_tenth(force),
        count,
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_is_42() {
        assert!((PhysicsConfig::default().limit() - 42.0).abs() < 1e-9);
    }

    #[test]
    fn small_error_on_axis_needs_one_strike() {
        // efficiency 1.0, energy sqrt(2 * 30 * 1.0) = 7.746
        let plan = calculate_impact_power(2.0, (0.0, 1.0), ToneMode::Tonic, &PhysicsConfig::default());
        assert_eq!(plan.count, 1);
        assert_eq!(plan.force, 27.7);
    }

    #[test]
    fn large_error_is_split_across_strikes() {
        // effective 17.7 / 0.749 = 23.63; energy sqrt(23.63 * 30 * 0.9) = 25.26
        // 20 + 25.26 / sqrt(2) = 37.86 <= 42
        let plan = calculate_impact_power(
            17.7,
            (-0.2, -0.749),
            ToneMode::Octave,
            &PhysicsConfig::default(),
        );
        assert_eq!(plan.count, 2);
        assert_eq!(plan.force, 37.9);
    }

    #[test]
    fn off_axis_hits_are_clamped_to_min_efficiency() {
        let config = PhysicsConfig::default();
        let at_zero = calculate_impact_power(1.0, (0.5, 0.0), ToneMode::Fifth, &config);
        let at_floor = calculate_impact_power(1.0, (0.5, 0.1), ToneMode::Fifth, &config);
        assert_eq!(at_zero, at_floor);
    }

    #[test]
    fn hopeless_errors_cap_at_ten_strikes() {
        let plan = calculate_impact_power(500.0, (0.0, 0.0), ToneMode::Fifth, &PhysicsConfig::default());
        assert_eq!(plan.count, MAX_STRIKES);
        assert_eq!(plan.force, 42.0);
    }

    #[test]
    fn sign_of_error_does_not_matter() {
        let config = PhysicsConfig::default();
        assert_eq!(
            calculate_impact_power(-5.0, (0.0, 0.5), ToneMode::Tonic, &config),
            calculate_impact_power(5.0, (0.0, 0.5), ToneMode::Tonic, &config),
        );
    }

    #[test]
    fn mode_parses_from_text() {
        assert_eq!("Fifth".parse::<ToneMode>().unwrap(), ToneMode::Fifth);
        assert!("third".parse::<ToneMode>().is_err());
    }
}
