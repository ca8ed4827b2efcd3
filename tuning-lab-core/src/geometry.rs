//! # Field Geometry Module
//!
//! Tonefield coordinate system settings. Each note can carry its own
//! geometry; notes without an override use the default field.
//!
//! Two coordinate systems are in play:
//! - **Field coordinates** `(L, S)` produced by the hit models, spanning
//!   `±field_size / 2`.
//! - **Normalized coordinates** `(x, y)` in `[-1, 1]²` used by the interactive
//!   canvas, with the short dimension on `x` and the long dimension on `y`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::HitPoint;

/// Ellipse parameters in field units. `rotation` is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseParams {
    pub center_x: f64,
    pub center_y: f64,
    pub semi_major: f64,
    pub semi_minor: f64,
    pub rotation: f64,
}

/// Tonefield coordinate system geometry for one note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TonefieldGeometry {
    pub field_size: f64,
    pub ellipse: EllipseParams,
    #[serde(default = "TonefieldGeometry::default_scale_factor")]
    pub scale_factor: f64,
}

impl TonefieldGeometry {
    fn default_scale_factor() -> f64 {
        1.0
    }

    /// Half the side length of the square field.
    pub fn half_size(&self) -> f64 {
        self.field_size / 2.0
    }

    /// Maps a field-space hit point into the normalized canvas view.
    ///
    /// `S` goes to `x`, `L` goes to `y`, so the long dimension runs along the
    /// long axis of the drawn tonefield ellipse.
    pub fn to_normalized(&self, hit: &HitPoint) -> (f64, f64) {
        let half = self.half_size();
        if half <= 0.0 {
            return (0.0, 0.0);
        }
        (
            hit.s / half * self.scale_factor,
            hit.l / half * self.scale_factor,
        )
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(data: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

impl Default for TonefieldGeometry {
    fn default() -> Self {
        Self {
            field_size: 100.0,
            ellipse: EllipseParams {
                center_x: 0.0,
                center_y: 0.0,
                semi_major: 40.0,
                semi_minor: 30.0,
                rotation: 0.0,
            },
            scale_factor: 1.0,
        }
    }
}

/// Tonefield geometry registry: a default plus per-note overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    #[serde(default)]
    default: TonefieldGeometry,
    #[serde(default)]
    notes: BTreeMap<String, TonefieldGeometry>,
}

impl GeometryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the geometry for `note_name`, or the default geometry when the
    /// note is `"default"` or has no override.
    pub fn geometry(&self, note_name: &str) -> &TonefieldGeometry {
        if note_name == "default" {
            return &self.default;
        }
        self.notes.get(note_name).unwrap_or(&self.default)
    }

    pub fn default_geometry(&self) -> &TonefieldGeometry {
        &self.default
    }

    pub fn set_geometry(&mut self, note_name: impl Into<String>, geometry: TonefieldGeometry) {
        self.notes.insert(note_name.into(), geometry);
    }
}

/// Whether a hit lands on the tonefield or outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Internal,
    External,
}

/// The stylized tonefield drawn on the normalized canvas.
///
/// `semi_x` (short axis) and `semi_y` (long axis) are the semi-axes of the
/// outer ellipse; the dimple is a smaller ellipse with the same aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TonefieldShape {
    pub semi_x: f64,
    pub semi_y: f64,
    pub dimple_scale: f64,
}

impl TonefieldShape {
    pub const STANDARD: TonefieldShape = TonefieldShape {
        semi_x: 0.60,
        semi_y: 0.85,
        dimple_scale: 0.4,
    };

    /// Semi-axes `(x, y)` of the outer ellipse.
    pub fn radii(&self) -> (f64, f64) {
        (self.semi_x, self.semi_y)
    }

    pub fn dimple_radii(&self) -> (f64, f64) {
        let (rx, ry) = self.radii();
        (rx * self.dimple_scale, ry * self.dimple_scale)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (rx, ry) = self.radii();
        inside_ellipse(x, y, rx, ry)
    }

    pub fn in_dimple(&self, x: f64, y: f64) -> bool {
        let (rx, ry) = self.dimple_radii();
        inside_ellipse(x, y, rx, ry)
    }

    pub fn location(&self, x: f64, y: f64) -> Location {
        if self.contains(x, y) {
            Location::Internal
        } else {
            Location::External
        }
    }
}

impl Default for TonefieldShape {
    fn default() -> Self {
        Self::STANDARD
    }
}

fn inside_ellipse(x: f64, y: f64, rx: f64, ry: f64) -> bool {
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    (x / rx).powi(2) + (y / ry).powi(2) <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_notes_fall_back_to_default() {
        let mut config = GeometryConfig::new();
        let custom = TonefieldGeometry {
            field_size: 80.0,
            ..TonefieldGeometry::default()
        };
        config.set_geometry("A4", custom);

        assert_eq!(config.geometry("A4").field_size, 80.0);
        assert_eq!(config.geometry("C3").field_size, 100.0);
        assert_eq!(config.geometry("default").field_size, 100.0);
    }

    #[test]
    fn setting_default_does_not_shadow_the_builtin() {
        let mut config = GeometryConfig::new();
        config.set_geometry(
            "default",
            TonefieldGeometry {
                field_size: 10.0,
                ..TonefieldGeometry::default()
            },
        );
        assert_eq!(config.geometry("default").field_size, 100.0);
    }

    #[test]
    fn scale_factor_defaults_when_missing() {
        let json = r#"{
            "field_size": 60.0,
            "ellipse": {
                "center_x": 0.0, "center_y": 0.0,
                "semi_major": 20.0, "semi_minor": 15.0, "rotation": 0.0
            }
        }"#;
        let geometry = TonefieldGeometry::from_json(json).unwrap();
        assert_eq!(geometry.scale_factor, 1.0);
        assert_eq!(geometry.ellipse.semi_major, 20.0);
    }

    #[test]
    fn normalized_view_swaps_axes() {
        let geometry = TonefieldGeometry::default();
        let (x, y) = geometry.to_normalized(&HitPoint {
            l: 25.0,
            s: -10.0,
            strength: 0.5,
        });
        assert!((x + 0.2).abs() < 1e-12);
        assert!((y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn scale_factor_stretches_normalized_view() {
        let geometry = TonefieldGeometry {
            scale_factor: 1.5,
            ..TonefieldGeometry::default()
        };
        let (x, y) = geometry.to_normalized(&HitPoint {
            l: 20.0,
            s: 10.0,
            strength: 0.3,
        });
        assert!((x - 0.3).abs() < 1e-12);
        assert!((y - 0.6).abs() < 1e-12);
    }

    #[test]
    fn degenerate_field_maps_to_origin() {
        let hit = HitPoint {
            l: 12.0,
            s: -7.0,
            strength: 1.0,
        };
        for field_size in [0.0, -40.0] {
            let geometry = TonefieldGeometry {
                field_size,
                ..TonefieldGeometry::default()
            };
            assert_eq!(geometry.to_normalized(&hit), (0.0, 0.0));
        }
    }

    #[test]
    fn shape_classifies_points() {
        let shape = TonefieldShape::STANDARD;
        assert_eq!(shape.location(0.0, 0.0), Location::Internal);
        assert_eq!(shape.location(0.0, 0.84), Location::Internal);
        assert_eq!(shape.location(0.61, 0.0), Location::External);
        assert_eq!(shape.location(0.5, 0.6), Location::External);
        assert!(shape.in_dimple(0.0, 0.3));
        assert!(!shape.in_dimple(0.0, 0.35));
    }
}
