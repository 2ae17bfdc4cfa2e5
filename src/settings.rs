//! Run configuration
//!
//! Stored as JSON next to the profile. Missing fields fall back to defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particle buffer size for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 50,
            QualityPreset::Medium => 200,
            QualityPreset::High => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Visible play area in pixels; drives on-screen checks, spawn ring and index bounds
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub quality: QualityPreset,
    /// Death bursts and sparks
    pub particles: bool,
    /// Floating combat text
    pub damage_labels: bool,
    /// Fixed run seed; random per process when unset
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            quality: QualityPreset::Medium,
            particles: true,
            damage_labels: true,
            seed: None,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.viewport_width, self.viewport_height)
    }

    /// Effective particle count cap
    pub fn particle_budget(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Load settings from disk, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
