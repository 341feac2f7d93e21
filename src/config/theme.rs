//! Biome palettes
//!
//! `ThemeTable` is built once (built-in or from RON) and handed to the
//! renderer by reference; nothing mutates it afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::rasterizer::Color;
use super::ConfigError;

/// Colors for one biome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeTheme {
    pub floor: Color,
    pub ceiling: Color,
    pub wall: Color,
    pub door: Color,
    pub fog: Color,
    /// Torch flame and glow
    pub light: Color,
    /// Decor accents (moss, cobwebs)
    #[serde(default = "default_accent")]
    pub accent: Color,
}

fn default_accent() -> Color {
    Color::new(70, 96, 52)
}

impl BiomeTheme {
    pub fn crypt() -> Self {
        Self {
            floor: Color::new(92, 84, 74),
            ceiling: Color::new(58, 54, 50),
            wall: Color::new(120, 108, 96),
            door: Color::new(112, 74, 40),
            fog: Color::new(10, 9, 14),
            light: Color::new(255, 176, 84),
            accent: Color::new(70, 96, 52),
        }
    }

    pub fn cavern() -> Self {
        Self {
            floor: Color::new(78, 70, 60),
            ceiling: Color::new(46, 40, 36),
            wall: Color::new(104, 90, 72),
            door: Color::new(96, 70, 44),
            fog: Color::new(16, 12, 10),
            light: Color::new(255, 150, 70),
            accent: Color::new(110, 98, 64),
        }
    }

    pub fn sewer() -> Self {
        Self {
            floor: Color::new(60, 74, 62),
            ceiling: Color::new(40, 48, 42),
            wall: Color::new(84, 100, 88),
            door: Color::new(70, 80, 60),
            fog: Color::new(8, 16, 12),
            light: Color::new(200, 230, 140),
            accent: Color::new(60, 120, 50),
        }
    }

    pub fn frost() -> Self {
        Self {
            floor: Color::new(150, 164, 180),
            ceiling: Color::new(96, 110, 130),
            wall: Color::new(170, 188, 206),
            door: Color::new(110, 120, 150),
            fog: Color::new(40, 50, 70),
            light: Color::new(170, 210, 255),
            accent: Color::new(220, 236, 255),
        }
    }
}

/// Immutable biome id -> palette table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeTable {
    /// Used when a biome id is unknown
    pub fallback: String,
    pub themes: BTreeMap<String, BiomeTheme>,
}

impl ThemeTable {
    pub fn builtin() -> Self {
        let mut themes = BTreeMap::new();
        themes.insert("crypt".to_string(), BiomeTheme::crypt());
        themes.insert("cavern".to_string(), BiomeTheme::cavern());
        themes.insert("sewer".to_string(), BiomeTheme::sewer());
        themes.insert("frost".to_string(), BiomeTheme::frost());
        Self {
            fallback: "crypt".to_string(),
            themes,
        }
    }

    /// Palette for `biome`, the fallback palette, or the crypt palette
    pub fn get(&self, biome: &str) -> BiomeTheme {
        self.themes
            .get(biome)
            .or_else(|| self.themes.get(&self.fallback))
            .cloned()
            .unwrap_or_else(BiomeTheme::crypt)
    }

    pub fn biome_ids(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(|k| k.as_str())
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }
}

impl Default for ThemeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
