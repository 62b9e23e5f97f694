use std::path::Path;

use anyhow::{Context, Result};
use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::audio::AudioProps;
use crate::math::Vector2;
use crate::render::Color;

/// Configuration values for a world and its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Pixels per second squared.
    pub gravity: Vector2,
    /// RGBA.
    pub background: [u8; 4],
    pub paused: bool,
    pub border_thickness: f64,
    pub border_color: [u8; 4],
    /// Delta used on the very first update, before a previous frame exists.
    pub first_frame_delta: f64,
    /// When set, every update advances by this many seconds regardless of
    /// the wall clock.
    pub fixed_timestep: Option<f64>,
    pub audio: AudioProps,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            title: "Life Game".into(),
            width: 800,
            height: 600,
            gravity: Vector2::ZERO,
            background: [0, 0, 0, 255],
            paused: false,
            border_thickness: 10.0,
            border_color: [0, 0, 0, 255],
            first_frame_delta: 1.0 / 60.0,
            fixed_timestep: None,
            audio: AudioProps::default(),
        }
    }
}

impl WorldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_gravity(mut self, x: f64, y: f64) -> Self {
        self.gravity = Vector2::new(x, y);
        self
    }

    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color.0;
        self
    }

    #[must_use]
    pub fn with_border(mut self, thickness: f64, color: Color) -> Self {
        self.border_thickness = thickness;
        self.border_color = color.0;
        self
    }

    #[must_use]
    pub fn with_fixed_timestep(mut self, dt: f64) -> Self {
        self.fixed_timestep = Some(dt);
        self
    }

    #[must_use]
    pub fn with_audio(mut self, audio: AudioProps) -> Self {
        self.audio = audio;
        self
    }

    #[must_use]
    pub fn paused(mut self) -> Self {
        self.paused = true;
        self
    }

    pub fn background_color(&self) -> Color {
        Rgba(self.background)
    }

    pub fn border_color(&self) -> Color {
        Rgba(self.border_color)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write world config {}", path.display()))?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read world config {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WorldConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.title, "Life Game");
        assert_eq!(config.gravity, Vector2::ZERO);
        assert_eq!(config.border_thickness, 10.0);
        assert!(!config.paused);
        assert!(config.fixed_timestep.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = WorldConfig::from_json(r#"{ "width": 320, "gravity": { "x": 0.0, "y": 9.8 } }"#).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 600);
        assert_eq!(config.gravity, Vector2::new(0.0, 9.8));
        assert_eq!(config.audio, AudioProps::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(WorldConfig::from_json("{ width: ").is_err());
    }
}
