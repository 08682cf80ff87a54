/// Command-line options for the terminal viewer
use clap::Parser;
use orbview_core::{ConfigError, ViewerConfig};
use std::path::PathBuf;

use crate::logging::LoggingConfig;

#[derive(Debug, Parser)]
#[command(name = "orbview-terminal", version, about = "Interactive 3D model viewer for the terminal")]
pub struct Cli {
    /// Model file to display (.glb or .stl)
    #[arg(required_unless_present_any = ["config", "preset"])]
    pub model: Option<PathBuf>,

    /// JSON viewer configuration (modelUrl, scale, position, enable* flags)
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Named configuration: "default" or "sophos"
    #[arg(long)]
    pub preset: Option<String>,

    /// Uniform model scale
    #[arg(long)]
    pub scale: Option<f32>,

    /// Base position of the model
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    pub position: Option<Vec<f32>>,

    /// Disable the orbit camera entirely
    #[arg(long)]
    pub no_controls: bool,

    #[arg(long)]
    pub no_pan: bool,

    #[arg(long)]
    pub no_zoom: bool,

    #[arg(long)]
    pub no_rotate: bool,

    /// Slowly spin the camera around the model
    #[arg(long)]
    pub auto_rotate: bool,

    /// Ignore the mouse; the model only sways
    #[arg(long)]
    pub no_tilt: bool,

    /// Show the orbiting satellite and its trail
    #[arg(long)]
    pub orbit: bool,

    /// Target frames per second
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter in env_logger syntax (overrides RUST_LOG)
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl Cli {
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log_filter.clone(),
            log_file: self.log_file.clone(),
        }
    }

    /// Resolve the base configuration, then apply command-line overrides
    pub fn viewer_config(&self) -> Result<ViewerConfig, ConfigError> {
        let mut config = match (&self.config, &self.preset) {
            (Some(path), _) => ViewerConfig::from_path(path)?,
            (None, Some(name)) => ViewerConfig::preset(name)?,
            (None, None) => ViewerConfig::new(String::new()),
        };

        if let Some(model) = &self.model {
            config.model_url = model.to_string_lossy().into_owned();
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if let Some([x, y, z]) = self.position.as_deref() {
            config.position = [*x, *y, *z];
        }
        if self.no_controls {
            config.enable_controls = false;
        }
        if self.no_pan {
            config.enable_pan = false;
        }
        if self.no_zoom {
            config.enable_zoom = false;
        }
        if self.no_rotate {
            config.enable_rotate = false;
        }
        if self.auto_rotate {
            config.auto_rotate = true;
        }
        if self.no_tilt {
            config.enable_mouse_tilt = false;
        }
        if self.orbit {
            config.enable_orbiting_sphere = true;
        }

        Ok(config.sanitized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_only_uses_defaults() {
        let cli = Cli::try_parse_from(["orbview-terminal", "logo.glb"]).unwrap();
        let config = cli.viewer_config().unwrap();
        assert_eq!(config, ViewerConfig::new("logo.glb"));
        assert_eq!(cli.fps, 30);
    }

    #[test]
    fn test_model_or_source_is_required() {
        assert!(Cli::try_parse_from(["orbview-terminal"]).is_err());
        assert!(Cli::try_parse_from(["orbview-terminal", "--preset", "sophos"]).is_ok());
    }

    #[test]
    fn test_preset_with_overrides() {
        let cli = Cli::try_parse_from([
            "orbview-terminal",
            "--preset",
            "sophos",
            "--position",
            "-1",
            "0.5",
            "2",
            "--no-tilt",
            "--scale",
            "0",
        ])
        .unwrap();
        let config = cli.viewer_config().unwrap();
        assert_eq!(config.model_url, "models/Sophos Logo.glb");
        assert_eq!(config.position, [-1.0, 0.5, 2.0]);
        assert!(!config.enable_mouse_tilt);
        assert!(config.enable_orbiting_sphere);
        // Zero scale is not usable and falls back
        assert_eq!(config.scale, 1.0);
    }

    #[test]
    fn test_flags_map_to_controls() {
        let cli = Cli::try_parse_from([
            "orbview-terminal",
            "m.stl",
            "--no-pan",
            "--no-zoom",
            "--auto-rotate",
            "--orbit",
        ])
        .unwrap();
        let controls = cli.viewer_config().unwrap().controls_config();
        assert!(controls.enabled && controls.enable_rotate);
        assert!(!controls.enable_pan && !controls.enable_zoom);
        assert!(controls.auto_rotate);
    }

    #[test]
    fn test_unknown_preset_is_reported() {
        let cli = Cli::try_parse_from(["orbview-terminal", "--preset", "landing"]).unwrap();
        assert!(matches!(cli.viewer_config(), Err(ConfigError::UnknownPreset(_))));
    }

    #[test]
    fn test_config_and_preset_conflict() {
        assert!(Cli::try_parse_from([
            "orbview-terminal",
            "--config",
            "viewer.json",
            "--preset",
            "sophos"
        ])
        .is_err());
    }
}
