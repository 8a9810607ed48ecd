use anyhow::Context;
use serde::{Deserialize, Serialize};
use stackview_core::window::DEFAULT_OFFSET;
use stackview_graph::{DEFAULT_MARKER_SIZE, Palette};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Slices shown on each side of the cursor.
    pub offset: u32,
    /// Side length of node and slab markers, in pixels.
    pub marker_size: f32,
    /// Multiplier per zoom step; must be finite and greater than 1.
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f64,
    #[serde(default = "default_true")]
    pub show_overlay: bool,
    pub palette: Palette,
}

fn default_zoom_factor() -> f64 {
    1.25
}

fn default_true() -> bool {
    true
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            marker_size: DEFAULT_MARKER_SIZE,
            zoom_factor: default_zoom_factor(),
            show_overlay: true,
            palette: Palette::default(),
        }
    }
}

impl ViewerSettings {
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.zoom_factor.is_finite() && self.zoom_factor > 1.0,
            "zoom_factor must be finite and greater than 1, got {}",
            self.zoom_factor
        );
        anyhow::ensure!(
            self.marker_size.is_finite() && self.marker_size > 0.0,
            "marker_size must be finite and positive, got {}",
            self.marker_size
        );
        Ok(())
    }

    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("Settings file {:?} not found, using defaults", path);
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(settings) => {
                tracing::info!("Settings loaded from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::error!("{e:#}");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }
}
