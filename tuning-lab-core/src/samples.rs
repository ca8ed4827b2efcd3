//! # Experiment Samples Module
//!
//! Records the hit point an operator chose for a given set of tuning
//! errors. Samples are collected into a [`SampleLog`] that is saved to and
//! loaded from a JSON file (`samples.json` by default).

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::geometry::{Location, TonefieldShape};
use crate::model::TuningErrors;

/// One optimal hit point recorded against the tuning errors it corrects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitPointSample {
    pub tonic: f64,
    pub octave: f64,
    pub fifth: f64,
    /// Normalized canvas coordinate, short axis.
    pub coordinate_x: f64,
    /// Normalized canvas coordinate, long axis.
    pub coordinate_y: f64,
    pub strength: f64,
    pub location: Location,
    #[serde(default)]
    pub intent: String,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: u64,
}

impl HitPointSample {
    /// Builds a sample, classifying the coordinate against `shape` and
    /// stamping the current time.
    pub fn new(
        errors: &TuningErrors,
        coordinate: (f64, f64),
        strength: f64,
        intent: impl Into<String>,
        shape: &TonefieldShape,
    ) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            tonic: errors.tonic,
            octave: errors.octave,
            fifth: errors.fifth,
            coordinate_x: coordinate.0,
            coordinate_y: coordinate.1,
            strength,
            location: shape.location(coordinate.0, coordinate.1),
            intent: intent.into(),
            created_at,
        }
    }
}

/// Ordered collection of recorded samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleLog {
    pub samples: Vec<HitPointSample>,
}

impl SampleLog {
    pub fn push(&mut self, sample: HitPointSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Saves the log as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("saved {} samples to {}", self.len(), path.display());
        Ok(())
    }

    /// Loads a log from JSON. A missing file yields an empty log.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no sample log at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Loads the log at `path`, appends `sample` and writes it back.
    pub fn append_to(path: impl AsRef<Path>, sample: HitPointSample) -> Result<usize> {
        let path = path.as_ref();
        let mut log = Self::load(path)?;
        log.push(sample);
        log.save(path)?;
        Ok(log.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unique_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "tuning_lab_samples_{}_{}.json",
            name,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        path
    }

    fn sample(x: f64, y: f64) -> HitPointSample {
        HitPointSample::new(
            &TuningErrors::new(5.0, -2.0, 3.0),
            (x, y),
            3.5,
            "lower the octave",
            &TonefieldShape::STANDARD,
        )
    }

    #[test]
    fn sample_location_is_classified() {
        assert_eq!(sample(0.1, 0.2).location, Location::Internal);
        assert_eq!(sample(0.9, 0.9).location, Location::External);
    }

    #[test]
    fn missing_file_loads_empty() {
        let log = SampleLog::load(unique_path("missing")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn append_persists_samples_in_order() {
        let path = unique_path("append");
        assert_eq!(SampleLog::append_to(&path, sample(0.1, 0.1)).unwrap(), 1);
        assert_eq!(SampleLog::append_to(&path, sample(0.8, -0.8)).unwrap(), 2);

        let log = SampleLog::load(&path).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.samples[1].location, Location::External);
        assert_eq!(log.samples[0].intent, "lower the octave");

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"location\": \"internal\""));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = unique_path("corrupt");
        fs::write(&path, "not json").unwrap();
        assert!(SampleLog::load(&path).is_err());
        let _ = fs::remove_file(&path);
    }
}
