/// Viewer configuration surface with defaults and presets
use nalgebra::Point3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::animator::AnimatorConfig;
use crate::controls::ControlsConfig;
use crate::error::ConfigError;

const DEFAULT_SCALE: f32 = 1.0;

/// Options recognized by the model viewer, named as the page passes them
///
/// Only `modelUrl` is required. Any other option that is missing, `null` or of
/// the wrong shape takes its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawConfig")]
pub struct ViewerConfig {
    pub model_url: String,
    pub scale: f32,
    pub position: [f32; 3],
    pub enable_controls: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub enable_rotate: bool,
    pub auto_rotate: bool,
    pub enable_mouse_tilt: bool,
    pub enable_orbiting_sphere: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    model_url: String,
    #[serde(default, deserialize_with = "lenient")]
    scale: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    position: Option<[f32; 3]>,
    #[serde(default, deserialize_with = "lenient")]
    enable_controls: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    enable_pan: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    enable_zoom: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    enable_rotate: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    auto_rotate: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    enable_mouse_tilt: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    enable_orbiting_sphere: Option<bool>,
}

impl From<RawConfig> for ViewerConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::new(raw.model_url);
        Self {
            scale: raw.scale.unwrap_or(defaults.scale),
            position: raw.position.unwrap_or(defaults.position),
            enable_controls: raw.enable_controls.unwrap_or(defaults.enable_controls),
            enable_pan: raw.enable_pan.unwrap_or(defaults.enable_pan),
            enable_zoom: raw.enable_zoom.unwrap_or(defaults.enable_zoom),
            enable_rotate: raw.enable_rotate.unwrap_or(defaults.enable_rotate),
            auto_rotate: raw.auto_rotate.unwrap_or(defaults.auto_rotate),
            enable_mouse_tilt: raw.enable_mouse_tilt.unwrap_or(defaults.enable_mouse_tilt),
            enable_orbiting_sphere: raw
                .enable_orbiting_sphere
                .unwrap_or(defaults.enable_orbiting_sphere),
            ..defaults
        }
    }
}

/// Accept any JSON value; anything that is not a `T` reads as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            log::warn!("ignoring option value {value} ({err}); using the default");
            Ok(None)
        }
    }
}

/// Names accepted by [`ViewerConfig::preset`]
pub const PRESETS: &[&str] = &["default", "sophos"];

impl ViewerConfig {
    /// Configuration with every option at its default
    pub fn new(model_url: impl Into<String>) -> Self {
        Self {
            model_url: model_url.into(),
            scale: DEFAULT_SCALE,
            position: [0.0; 3],
            enable_controls: true,
            enable_pan: true,
            enable_zoom: true,
            enable_rotate: true,
            auto_rotate: false,
            enable_mouse_tilt: true,
            enable_orbiting_sphere: false,
        }
    }

    /// The full-screen logo page: large model, no camera controls, satellite on
    pub fn sophos() -> Self {
        Self {
            scale: 20.0,
            enable_controls: false,
            enable_mouse_tilt: true,
            enable_orbiting_sphere: true,
            ..Self::new("models/Sophos Logo.glb")
        }
    }

    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        log::debug!("using preset {name}");
        match name {
            "default" => Ok(Self::new("")),
            "sophos" => Ok(Self::sophos()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Replace unusable numbers with defaults instead of rejecting them
    pub fn sanitized(mut self) -> Self {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            log::warn!("scale {} is not a positive number; using {DEFAULT_SCALE}", self.scale);
            self.scale = DEFAULT_SCALE;
        }
        if !self.position.iter().all(|c| c.is_finite()) {
            log::warn!("position {:?} is not finite; using the origin", self.position);
            self.position = [0.0; 3];
        }
        self
    }

    pub fn base_position(&self) -> Point3<f32> {
        let [x, y, z] = self.position;
        Point3::new(x, y, z)
    }

    pub fn animator_config(&self) -> AnimatorConfig {
        AnimatorConfig {
            scale: self.scale,
            position: self.base_position(),
            tilt_enabled: self.enable_mouse_tilt,
            orbit_enabled: self.enable_orbiting_sphere,
        }
    }

    pub fn controls_config(&self) -> ControlsConfig {
        ControlsConfig {
            enabled: self.enable_controls,
            enable_pan: self.enable_pan,
            enable_zoom: self.enable_zoom,
            enable_rotate: self.enable_rotate,
            auto_rotate: self.auto_rotate,
        }
    }
}
