use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Tunables for the whole grove. Every field has a default, so a partial
/// `grove.json` only needs to name what it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroveSettings {
    pub window: WindowSettings,
    pub asset_root: AssetRoot,
    /// Fixed seed for the wandering pool; random when absent.
    pub seed: Option<u64>,
    pub stage: StageSettings,
    pub backdrop: BackdropSettings,
    pub trees: TreeSettings,
    pub ghost: GhostSettings,
    pub hamsters: HamsterSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRoot(pub String);

impl Default for AssetRoot {
    fn default() -> Self {
        Self("assets".into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Haunted Grove".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    pub scale: f32,
    pub offset: [f32; 3],
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            scale: 0.5,
            offset: [0.0, -1.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropSettings {
    pub model: String,
    pub scale: f32,
    pub position: [f32; 3],
}

impl Default for BackdropSettings {
    fn default() -> Self {
        Self {
            model: "scena.glb".into(),
            scale: 20.0,
            position: [0.0, -10.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSettings {
    pub model: String,
    pub count: usize,
    pub radius: f32,
    pub height: f32,
    pub scale: f32,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            model: "strom.glb".into(),
            count: 20,
            radius: 15.0,
            height: -5.0,
            scale: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostSettings {
    pub model: String,
    pub sound: String,
    pub sound_volume: f32,
    pub anchor: [f32; 3],
    pub scale: f32,
    /// Rotation about the vertical axis, radians.
    pub yaw: f32,
    pub opacity: f32,
    pub spawn_interval_ms: u64,
    pub rise_duration_ms: u64,
    pub target_y: f32,
}

impl Default for GhostSettings {
    fn default() -> Self {
        Self {
            model: "duch.glb".into(),
            sound: "smich.mp3".into(),
            sound_volume: 1.0,
            anchor: [0.0, -5.0, -3.0],
            scale: 0.8,
            yaw: -std::f32::consts::FRAC_PI_2,
            opacity: 0.5,
            spawn_interval_ms: 10_000,
            rise_duration_ms: 5_000,
            target_y: 10.0,
        }
    }
}

impl GhostSettings {
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    pub fn rise_duration(&self) -> Duration {
        Duration::from_millis(self.rise_duration_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HamsterSettings {
    pub model: String,
    pub count: usize,
    /// Spawn bounds, `[min, max)`.
    pub x_range: [f32; 2],
    pub z_range: [f32; 2],
    pub height: f32,
    /// The visual sits this far below the logical position.
    pub visual_drop: f32,
    pub scale: f32,
    pub opacity: f32,
    /// Distance travelled per frame.
    pub speed: f32,
    /// Beyond this horizontal distance from the origin the heading is resampled.
    pub wander_radius: f32,
}

impl Default for HamsterSettings {
    fn default() -> Self {
        Self {
            model: "krecek.gltf".into(),
            count: 10,
            x_range: [-8.0, 5.0],
            z_range: [-5.0, 5.0],
            height: -1.0,
            visual_drop: 1.0,
            scale: 0.3,
            opacity: 0.3,
            speed: 0.05,
            wander_radius: 10.0,
        }
    }
}

impl GroveSettings {
    pub fn load() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            info!("Using default grove settings for WebAssembly build");
            Self::default()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::load_from_path("grove.json")
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<GroveSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded grove settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default grove settings.",
                        path, err
                    );
                    GroveSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("Grove settings file {:?} not found. Using defaults.", path);
                GroveSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default grove settings.",
                    path, err
                );
                GroveSettings::default()
            }
        }
    }

    pub(crate) fn validate(mut self) -> Self {
        let defaults = GroveSettings::default();

        if self.window.width == 0 || self.window.height == 0 {
            warn!("Window size must be greater than zero. Using default size.");
            self.window.width = defaults.window.width;
            self.window.height = defaults.window.height;
        }

        if !is_positive(self.stage.scale) {
            warn!("Stage scale must be positive. Using default.");
            self.stage.scale = defaults.stage.scale;
        }

        if !is_positive(self.backdrop.scale) {
            warn!("Backdrop scale must be positive. Using default.");
            self.backdrop.scale = defaults.backdrop.scale;
        }

        if !is_positive(self.trees.radius) {
            warn!("Tree ring radius must be positive. Using default.");
            self.trees.radius = defaults.trees.radius;
        }
        if !is_positive(self.trees.scale) {
            warn!("Tree scale must be positive. Using default.");
            self.trees.scale = defaults.trees.scale;
        }

        if self.ghost.spawn_interval_ms == 0 {
            warn!("Ghost spawn interval must be greater than zero. Using default.");
            self.ghost.spawn_interval_ms = defaults.ghost.spawn_interval_ms;
        }
        if !is_positive(self.ghost.scale) {
            warn!("Ghost scale must be positive. Using default.");
            self.ghost.scale = defaults.ghost.scale;
        }
        self.ghost.opacity = clamp_unit("Ghost opacity", self.ghost.opacity);
        self.ghost.sound_volume = clamp_unit("Ghost sound volume", self.ghost.sound_volume);

        if !is_range(self.hamsters.x_range) {
            warn!("Hamster x range must satisfy min < max. Using default.");
            self.hamsters.x_range = defaults.hamsters.x_range;
        }
        if !is_range(self.hamsters.z_range) {
            warn!("Hamster z range must satisfy min < max. Using default.");
            self.hamsters.z_range = defaults.hamsters.z_range;
        }
        if !is_positive(self.hamsters.scale) {
            warn!("Hamster scale must be positive. Using default.");
            self.hamsters.scale = defaults.hamsters.scale;
        }
        if !(self.hamsters.speed.is_finite() && self.hamsters.speed >= 0.0) {
            warn!("Hamster speed must be non-negative. Using default.");
            self.hamsters.speed = defaults.hamsters.speed;
        }
        if !is_positive(self.hamsters.wander_radius) {
            warn!("Hamster wander radius must be positive. Using default.");
            self.hamsters.wander_radius = defaults.hamsters.wander_radius;
        }
        self.hamsters.opacity = clamp_unit("Hamster opacity", self.hamsters.opacity);

        self
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn is_range(range: [f32; 2]) -> bool {
    range[0].is_finite() && range[1].is_finite() && range[0] < range[1]
}

fn clamp_unit(label: &str, value: f32) -> f32 {
    if !value.is_finite() {
        warn!("{} is not a number. Using 1.0.", label);
        return 1.0;
    }
    if !(0.0..=1.0).contains(&value) {
        warn!("{} must lie in [0, 1]. Clamping {}.", label, value);
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_other_defaults() {
        let settings: GroveSettings =
            serde_json::from_str(r#"{ "ghost": { "spawn_interval_ms": 2000 }, "seed": 7 }"#)
                .unwrap();

        assert_eq!(settings.ghost.spawn_interval(), Duration::from_secs(2));
        assert_eq!(settings.ghost.rise_duration(), Duration::from_secs(5));
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.trees.count, 20);
        assert_eq!(settings.asset_root, AssetRoot("assets".into()));
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let mut settings = GroveSettings::default();
        settings.trees.radius = -3.0;
        settings.ghost.spawn_interval_ms = 0;
        settings.hamsters.x_range = [5.0, -8.0];
        settings.hamsters.speed = f32::NAN;
        settings.hamsters.opacity = 3.0;

        let validated = settings.validate();
        let defaults = GroveSettings::default();

        assert_eq!(validated.trees.radius, defaults.trees.radius);
        assert_eq!(
            validated.ghost.spawn_interval_ms,
            defaults.ghost.spawn_interval_ms
        );
        assert_eq!(validated.hamsters.x_range, defaults.hamsters.x_range);
        assert_eq!(validated.hamsters.speed, defaults.hamsters.speed);
        assert_eq!(validated.hamsters.opacity, 1.0);
    }

    #[test]
    fn validate_preserves_zero_counts() {
        let mut settings = GroveSettings::default();
        settings.trees.count = 0;
        settings.hamsters.count = 0;

        let validated = settings.validate();
        assert_eq!(validated.trees.count, 0);
        assert_eq!(validated.hamsters.count, 0);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = GroveSettings::load_from_path("definitely/not/here/grove.json");
        assert_eq!(settings.hamsters.count, HamsterSettings::default().count);
    }
}
