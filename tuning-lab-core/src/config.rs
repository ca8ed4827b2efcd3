//! # Configuration Module
//!
//! `tuning-lab.toml` holds everything the binaries share: where the API
//! listens, where OSC goes, the active model, the impact physics, the sample
//! log path and the tonefield geometry per note. Every field has a default,
//! so a partial file is valid.
//!
//! ## Example
//! ```toml
//! [server]
//! port = 9001
//!
//! [geometry.notes.A4]
//! field_size = 80.0
//! ellipse = { center_x = 0.0, center_y = 0.0, semi_major = 30.0, semi_minor = 20.0, rotation = 0.0 }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::geometry::GeometryConfig;
use crate::impact::PhysicsConfig;
use crate::model::ModelKind;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "tuning-lab.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    /// Browser origins allowed to call the API.
    #[serde(default = "ServerConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8000
    }
    fn default_cors_origins() -> Vec<String> {
        vec!["http://localhost:3000".to_string()]
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            cors_origins: Self::default_cors_origins(),
        }
    }
}

/// Where the visual-effects tool listens for OSC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscConfig {
    #[serde(default = "OscConfig::default_host")]
    pub host: String,
    /// Must match the port of the OSC In CHOP.
    #[serde(default = "OscConfig::default_port")]
    pub port: u16,
}

impl OscConfig {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }
    fn default_port() -> u16 {
        10000
    }
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub kind: ModelKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplesConfig {
    #[serde(default = "SamplesConfig::default_path")]
    pub path: String,
}

impl SamplesConfig {
    fn default_path() -> String {
        "samples.json".to_string()
    }
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub osc: OscConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub samples: SamplesConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
}

impl LabConfig {
    pub fn from_toml(text: &str) -> crate::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path`, falling back to defaults when it cannot be read or
    /// parsed. A missing file is created with the defaults written out.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match Self::from_toml(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {}: {err}. Using defaults.", path.display());
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {}: {err}. Using defaults.", path.display());
                }
            }
            return Self::default();
        }

        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                let contents = format!("# Tuning Lab configuration\n\n{text}");
                match fs::write(path, contents) {
                    Ok(()) => info!("Wrote default config to {}", path.display()),
                    Err(err) => warn!("Failed to write default config {}: {err}", path.display()),
                }
            }
            Err(err) => warn!("Failed to serialize default config: {err}"),
        }
        default_cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unique_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "tuning_lab_config_{}_{}.toml",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        path
    }

    #[test]
    fn load_or_default_writes_defaults_cleanly() {
        let path = unique_path("write");
        let cfg = LabConfig::load_or_default(&path);
        assert_eq!(cfg, LabConfig::default());

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[server]"));
        assert!(contents.contains("[osc]"));
        let reread = LabConfig::from_toml(&contents).expect("parse written config");
        assert_eq!(reread, cfg);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_or_default_reads_existing() {
        let path = unique_path("read");
        fs::write(
            &path,
            "[server]\nport = 9001\n\n[model]\nkind = \"physics\"\n\n[physics]\nthreshold_c = 25.0\n",
        )
        .unwrap();

        let cfg = LabConfig::load_or_default(&path);
        assert_eq!(cfg.server.port, 9001);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.model.kind, ModelKind::Physics);
        assert_eq!(cfg.physics.threshold_c, 25.0);
        assert_eq!(cfg.physics.scaling_s, 30.0);
        assert_eq!(cfg.osc.port, 10000);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn geometry_overrides_are_read_per_note() {
        let cfg = LabConfig::from_toml(
            r#"
[geometry.notes.A4]
field_size = 80.0
scale_factor = 1.25
ellipse = { center_x = 1.0, center_y = -2.0, semi_major = 30.0, semi_minor = 20.0, rotation = 15.0 }
"#,
        )
        .expect("parse geometry section");

        let a4 = cfg.geometry.geometry("A4");
        assert_eq!(a4.field_size, 80.0);
        assert_eq!(a4.scale_factor, 1.25);
        assert_eq!(a4.ellipse.rotation, 15.0);
        assert_eq!(cfg.geometry.geometry("C3").field_size, 100.0);
        assert_eq!(cfg.server, ServerConfig::default());
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = unique_path("invalid");
        fs::write(&path, "[server\nport = ").unwrap();
        assert_eq!(LabConfig::load_or_default(&path), LabConfig::default());
        let _ = fs::remove_file(&path);
    }
}
