use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::audio::AudioConfig;
use crate::core::glyph::GlyphConfig;
use crate::core::integrator::PhysicsParams;
use crate::core::reactivity::ReactivityParams;
use crate::core::signals::SelectionState;
use crate::core::simulation::{CloudParams, SimulationConfig};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub particles: CloudParams,
    #[serde(default)]
    pub physics: PhysicsParams,
    #[serde(default)]
    pub reactivity: ReactivityParams,
    #[serde(default)]
    pub glyph: GlyphConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub selection: SelectionState,
}

impl AppConfig {
    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            cloud: self.particles.clone(),
            physics: self.physics.clone(),
            reactivity: self.reactivity.clone(),
            glyph: self.glyph,
        }
    }

    /// Renders the defaults as a TOML file with every key commented out.
    /// Floats are widened to f64 on serialization; they are printed back at
    /// f32 precision so `0.03` stays `0.03`.
    fn commented_defaults(&self) -> Result<String, toml::ser::Error> {
        let text = toml::to_string_pretty(self)?;
        let mut out = String::with_capacity(text.len() * 2);
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('[') {
                out.push_str(line);
                out.push('\n');
                continue;
            }
            let line = match line.split_once(" = ") {
                Some((key, value)) if value.contains('.') && !value.starts_with('"') => {
                    match value.parse::<f32>() {
                        Ok(v) if v.fract() == 0.0 => format!("{key} = {v:.1}"),
                        Ok(v) => format!("{key} = {v}"),
                        Err(_) => line.to_string(),
                    }
                }
                _ => line.to_string(),
            };
            out.push_str("# ");
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Reads `path`, falling back to defaults on any read or parse error. A
    /// missing file is created with the defaults commented out.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if !path_obj.exists() {
            let cfg = Self::default();
            match cfg.commented_defaults() {
                Ok(text) => {
                    if let Err(err) = fs::write(path_obj, text) {
                        warn!("Failed to write default config to {path}: {err}");
                    }
                }
                Err(err) => warn!("Failed to serialize default config: {err}"),
            }
            return cfg;
        }

        let contents = match fs::read_to_string(path_obj) {
            Ok(contents) => contents,
            Err(err) => {
                warn!("Failed to read config {path}: {err}. Using defaults.");
                return Self::default();
            }
        };
        toml::from_str(&contents).unwrap_or_else(|err| {
            warn!("Failed to parse config {path}: {err}. Using defaults.");
            Self::default()
        })
    }
}
