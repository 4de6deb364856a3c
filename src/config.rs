use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::surface::{new_surface, ClipRect, Depth, PixelSurface};

fn default_width() -> u32 {
    320
}

fn default_height() -> u32 {
    200
}

fn default_seed() -> u64 {
    0x5eed_1998
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mask() -> String {
    "*.pal".to_string()
}

/// Geometry of the surface the demo renders into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub depth: Depth,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    /// Initial clip; the whole surface when absent
    #[serde(default)]
    pub clip: Option<ClipRect>,
    #[serde(default = "default_seed")]
    pub static_seed: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            depth: Depth::default(),
            offset_x: 0,
            offset_y: 0,
            clip: None,
            static_seed: default_seed(),
        }
    }
}

impl SurfaceConfig {
    /// Allocate a surface with this geometry, offset and clip applied
    pub fn build(&self) -> Box<dyn PixelSurface> {
        let mut surface = new_surface(self.depth, self.width, self.height);
        let core = surface.core_mut();
        core.set_offset(self.offset_x, self.offset_y);
        core.set_static_seed(self.static_seed);
        if let Some(c) = self.clip {
            core.set_clip(c.x, c.y, c.w, c.h);
        }
        surface
    }
}

/// Demo configuration, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    pub name: String,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Optional log file in addition to the console
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Directory scanned for palette files, if any
    #[serde(default)]
    pub palette_dir: Option<PathBuf>,
    #[serde(default = "default_mask")]
    pub palette_mask: String,
}

impl DemoConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surface: SurfaceConfig::default(),
            log_level: default_log_level(),
            log_file: None,
            palette_dir: None,
            palette_mask: default_mask(),
        }
    }

    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self::new("demo")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_uses_defaults() {
        let cfg = DemoConfig::from_json(r#"{ "name": "tiny" }"#).unwrap();
        assert_eq!(cfg.name, "tiny");
        assert_eq!(cfg.surface, SurfaceConfig::default());
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.palette_mask, "*.pal");
    }

    #[test]
    fn test_surface_section_parses() {
        let cfg = DemoConfig::from_json(
            r#"{
                "name": "guard",
                "surface": {
                    "width": 64, "height": 32, "depth": "true_color16",
                    "offset_x": 8, "offset_y": 4,
                    "clip": { "x": -20, "y": 0, "w": 40, "h": 10 }
                }
            }"#,
        )
        .unwrap();
        let surface = cfg.surface.build();
        assert_eq!(surface.depth(), Depth::TrueColor16);
        assert_eq!((surface.width(), surface.height()), (64, 32));
        assert_eq!(surface.get_clip(), ClipRect::new(-8, 0, 28, 10));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(DemoConfig::from_json("{ name: }").is_err());
        assert!(DemoConfig::from_json(r#"{ "name": "x", "surface": { "depth": "hicolor" } }"#).is_err());
    }

    #[test]
    fn test_save_load_file() {
        let path = std::env::temp_dir().join(format!("imagebuf-config-{}.json", std::process::id()));
        let mut cfg = DemoConfig::new("saved");
        cfg.surface.clip = Some(ClipRect::new(1, 2, 3, 4));
        cfg.palette_dir = Some(PathBuf::from("data"));
        cfg.save(&path).unwrap();
        let loaded = DemoConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, cfg);
    }
}
