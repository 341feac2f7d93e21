//! Render settings
//!
//! One explicit default table. Partial RON input is merged over it field by
//! field through `#[serde(default)]`, so nothing else needs to know the
//! defaults.

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use super::ConfigError;

/// Per-frame knobs handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Biome id looked up in the `ThemeTable`
    pub biome: String,
    /// Global light multiplier
    pub brightness: f32,
    /// Scales how quickly fog thickens with depth (0 disables fog)
    pub fog_density: f32,
    /// Torch glow strength (0 = unlit sconces)
    pub torch_intensity: f32,
    /// Torch flicker follows the frame clock
    pub enable_animations: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            biome: "crypt".to_string(),
            brightness: 1.0,
            fog_density: 1.0,
            torch_intensity: 0.6,
            enable_animations: true,
        }
    }
}

impl RenderSettings {
    /// Parse settings, taking defaults for every missing field
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_merge_over_defaults() {
        let s = RenderSettings::from_ron_str("(fog_density: 2.5, biome: \"cavern\")").unwrap();
        assert_eq!(s.fog_density, 2.5);
        assert_eq!(s.biome, "cavern");
        assert_eq!(s.brightness, RenderSettings::default().brightness);
        assert!(s.enable_animations);
    }

    #[test]
    fn test_empty_settings_are_defaults() {
        assert_eq!(RenderSettings::from_ron_str("()").unwrap(), RenderSettings::default());
    }

    #[test]
    fn test_bad_settings_report_parse_error() {
        assert!(matches!(
            RenderSettings::from_ron_str("(brightness: \"high\")"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
