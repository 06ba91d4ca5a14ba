//! Viewer configuration
//!
//! [`ViewerSettings`] is read once at startup. [`ViewportConfig`] is the live
//! record edited by the debug panel and handed to [`Viewer::on_frame`] every
//! frame.
//!
//! [`Viewer::on_frame`]: crate::viewer::Viewer::on_frame

use std::path::PathBuf;

/// Slider range for [`ViewportConfig::speed`].
pub const SPEED_RANGE: (f32, f32) = (0.0, 1000.0);
/// Slider range for [`ViewportConfig::light_angle`], in radians.
pub const LIGHT_ANGLE_RANGE: (f32, f32) = (0.0, 1.0);
/// Slider range for [`ViewportConfig::light_penumbra`].
pub const LIGHT_PENUMBRA_RANGE: (f32, f32) = (0.0, 1.0);
/// Slider range for [`ViewportConfig::light_intensity`].
pub const LIGHT_INTENSITY_RANGE: (f32, f32) = (0.0, 1000.0);

/// Live-tunable viewport parameters.
///
/// Written by the debug panel, read once per frame. The last write before a
/// frame wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    /// Color of the highlight marker (linear RGB, 0..1)
    pub sphere_color: [f32; 3],
    /// Draw the highlight marker as edges only
    pub wireframe: bool,
    pub speed: f32,
    /// Spot light cone half-angle in radians
    pub light_angle: f32,
    /// Fraction of the cone that fades out, 0 = hard edge
    pub light_penumbra: f32,
    /// Spot light intensity in candela
    pub light_intensity: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            sphere_color: hex_to_rgb(0xFFEA00),
            wireframe: false,
            speed: 0.01,
            light_angle: 0.4,
            light_penumbra: 1.0,
            light_intensity: 800.0,
        }
    }
}

impl ViewportConfig {
    /// Clamps every numeric field into the range its panel control declares.
    pub fn clamp_to_ranges(&mut self) {
        self.speed = self.speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1);
        self.light_angle = self.light_angle.clamp(LIGHT_ANGLE_RANGE.0, LIGHT_ANGLE_RANGE.1);
        self.light_penumbra = self
            .light_penumbra
            .clamp(LIGHT_PENUMBRA_RANGE.0, LIGHT_PENUMBRA_RANGE.1);
        self.light_intensity = self
            .light_intensity
            .clamp(LIGHT_INTENSITY_RANGE.0, LIGHT_INTENSITY_RANGE.1);
        for channel in &mut self.sphere_color {
            *channel = channel.clamp(0.0, 1.0);
        }
    }
}

/// Startup settings for the viewer window and assets.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSettings {
    pub title: String,
    /// Logical window size
    pub window_size: (u32, u32),
    pub material_path: PathBuf,
    pub geometry_path: PathBuf,
    /// Uniform scale applied to the loaded model
    pub model_scale: f32,
    pub vsync: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            title: "pawnview".to_string(),
            window_size: (1200, 800),
            material_path: PathBuf::from("static/Pawn.mtl"),
            geometry_path: PathBuf::from("static/Pawn.obj"),
            model_scale: 0.5,
            vsync: true,
        }
    }
}

impl ViewerSettings {
    /// Default settings overridden by `PAWNVIEW_MATERIAL`, `PAWNVIEW_GEOMETRY`
    /// and `PAWNVIEW_VSYNC`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(path) = lookup("PAWNVIEW_MATERIAL") {
            settings.material_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("PAWNVIEW_GEOMETRY") {
            settings.geometry_path = PathBuf::from(path);
        }
        if let Some(flag) = lookup("PAWNVIEW_VSYNC") {
            settings.vsync = !matches!(flag.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off");
        }
        settings
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width.max(1), height.max(1));
        self
    }

    pub fn with_assets(mut self, material_path: impl Into<PathBuf>, geometry_path: impl Into<PathBuf>) -> Self {
        self.material_path = material_path.into();
        self.geometry_path = geometry_path.into();
        self
    }

    pub fn with_model_scale(mut self, scale: f32) -> Self {
        self.model_scale = scale;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }
}

/// Converts a `0xRRGGBB` color into linear-ish RGB floats.
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport_matches_panel_defaults() {
        let config = ViewportConfig::default();
        assert_eq!(config.sphere_color, [1.0, 234.0 / 255.0, 0.0]);
        assert!(!config.wireframe);
        assert_eq!(config.light_angle, 0.4);
        assert_eq!(config.light_penumbra, 1.0);
        assert_eq!(config.light_intensity, 800.0);
    }

    #[test]
    fn test_clamp_to_ranges() {
        let mut config = ViewportConfig {
            sphere_color: [2.0, -1.0, 0.5],
            wireframe: true,
            speed: 5000.0,
            light_angle: -0.5,
            light_penumbra: 3.0,
            light_intensity: 1200.0,
        };
        config.clamp_to_ranges();

        assert_eq!(config.sphere_color, [1.0, 0.0, 0.5]);
        assert_eq!(config.speed, 1000.0);
        assert_eq!(config.light_angle, 0.0);
        assert_eq!(config.light_penumbra, 1.0);
        assert_eq!(config.light_intensity, 1000.0);
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = ViewerSettings::from_lookup(|key| match key {
            "PAWNVIEW_GEOMETRY" => Some("models/knight.obj".to_string()),
            "PAWNVIEW_VSYNC" => Some("off".to_string()),
            _ => None,
        });

        assert_eq!(settings.geometry_path, PathBuf::from("models/knight.obj"));
        assert_eq!(settings.material_path, PathBuf::from("static/Pawn.mtl"));
        assert!(!settings.vsync);
    }

    #[test]
    fn test_settings_builders() {
        let settings = ViewerSettings::default()
            .with_title("board")
            .with_window_size(0, 600)
            .with_assets("a.mtl", "a.obj")
            .with_model_scale(2.0)
            .with_vsync(false);

        assert_eq!(settings.title, "board");
        assert_eq!(settings.window_size, (1, 600));
        assert_eq!(settings.material_path, PathBuf::from("a.mtl"));
        assert_eq!(settings.geometry_path, PathBuf::from("a.obj"));
        assert_eq!(settings.model_scale, 2.0);
        assert!(!settings.vsync);
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb(0xFF0000), [1.0, 0.0, 0.0]);
        assert_eq!(hex_to_rgb(0x000000), [0.0, 0.0, 0.0]);
    }
}
