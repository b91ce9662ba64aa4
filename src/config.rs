use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_ENV_VAR: &str = "ANAGLYPH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "anaglyph.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub surface: SurfaceConfig,
    pub background: BackgroundConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub convergence: f32,
    pub eye_separation: f32,
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,

    pub convergence_range: (f32, f32),
    pub eye_separation_range: (f32, f32),
    pub fov_range: (f32, f32),
    pub near_range: (f32, f32),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub light_step: f32,
    pub scale_point_step: f32,
    pub scale_step: f32,
    pub scale_range: (f32, f32),
    pub mouse_sensitivity: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct SurfaceConfig {
    pub texture: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub source: BackgroundSourceConfig,
    pub fps: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundSourceConfig {
    Solid { color: [u8; 4] },
    Image { path: PathBuf },
    Sequence { dir: PathBuf },
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Anaglyph 3D".to_string(),
            width: 1280,
            height: 960,
            vsync: true,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            convergence: 10.0,
            eye_separation: 7.0,
            fov_deg: 45.0,
            near: 1.0,
            far: 20000.0,
            aspect_ratio: 1.33,

            convergence_range: (0.5, 100.0),
            eye_separation_range: (0.0, 20.0),
            fov_range: (10.0, 120.0),
            near_range: (0.1, 9.5),
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            light_step: 0.05,
            scale_point_step: 5.0,
            scale_step: 0.05,
            scale_range: (0.5, 2.0),
            mouse_sensitivity: 0.005,
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            source: BackgroundSourceConfig::Solid {
                color: [16, 16, 20, 255],
            },
            fps: 24.0,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            return Ok((Self::load_from_file(&path)?, Some(path)));
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Ok((Self::load_from_file(local)?, Some(local.to_path_buf())));
        }

        let config = Self::default();
        config.validate()?;
        Ok((config, None))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        let controls = &self.controls;

        for (name, value) in [
            ("far", camera.far),
            ("aspect_ratio", camera.aspect_ratio),
            ("mouse_sensitivity", controls.mouse_sensitivity),
            ("background.fps", self.background.fps),
        ] {
            if !value.is_finite() {
                return invalid(format!("{name} = {value} is not a finite number"));
            }
        }

        check_range("convergence", camera.convergence_range, camera.convergence)?;
        check_range(
            "eye_separation",
            camera.eye_separation_range,
            camera.eye_separation,
        )?;
        check_range("fov_deg", camera.fov_range, camera.fov_deg)?;
        check_range("near", camera.near_range, camera.near)?;

        if camera.convergence_range.0 <= 0.0 {
            return invalid("convergence must stay above 0");
        }
        if camera.near_range.0 <= 0.0 {
            return invalid("near clipping distance must stay above 0");
        }
        if camera.near_range.1 >= camera.far {
            return invalid(format!(
                "near clipping distance may reach {} but far is {}",
                camera.near_range.1, camera.far
            ));
        }
        if camera.fov_range.0 <= 0.0 || camera.fov_range.1 >= 180.0 {
            return invalid("field of view must stay inside (0, 180) degrees");
        }
        if camera.aspect_ratio <= 0.0 {
            return invalid("aspect ratio must be positive");
        }
        if camera.eye_separation_range.0 < 0.0 {
            return invalid("eye separation must not be negative");
        }

        let (scale_min, scale_max) = controls.scale_range;
        if !(scale_min.is_finite() && scale_max.is_finite())
            || scale_min <= 0.0
            || scale_min > scale_max
        {
            return invalid(format!(
                "controller scale range {:?} is empty or not positive",
                controls.scale_range
            ));
        }
        for (name, step) in [
            ("light_step", controls.light_step),
            ("scale_point_step", controls.scale_point_step),
            ("scale_step", controls.scale_step),
        ] {
            if step <= 0.0 || !step.is_finite() {
                return invalid(format!("{name} must be positive"));
            }
        }

        if self.background.fps <= 0.0 {
            return invalid("background fps must be positive");
        }
        if self.window.width == 0 || self.window.height == 0 {
            return invalid("window size must be non-zero");
        }

        Ok(())
    }
}

fn invalid<T>(message: impl Into<String>) -> Result<T, ConfigError> {
    Err(ConfigError::Invalid(message.into()))
}

fn check_range(name: &str, range: (f32, f32), value: f32) -> Result<(), ConfigError> {
    if !(range.0.is_finite() && range.1.is_finite()) || range.0 > range.1 {
        return invalid(format!("{name} range {range:?} is not a finite interval"));
    }
    if !(range.0..=range.1).contains(&value) {
        return invalid(format!("{name} = {value} is outside {range:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [camera]
            convergence = 20.0
            eye_separation = 3.5
            "#,
        )
        .unwrap();

        assert_eq!(config.camera.convergence, 20.0);
        assert_eq!(config.camera.eye_separation, 3.5);
        assert_eq!(config.camera.fov_deg, 45.0);
        assert_eq!(config.camera.far, 20000.0);
        assert_eq!(config.controls, ControlsConfig::default());
    }

    #[test]
    fn background_source_is_tagged() {
        let config = AppConfig::from_toml_str(
            r#"
            [background]
            fps = 30.0
            source = { kind = "sequence", dir = "frames" }
            "#,
        )
        .unwrap();

        assert_eq!(config.background.fps, 30.0);
        assert_eq!(
            config.background.source,
            BackgroundSourceConfig::Sequence {
                dir: PathBuf::from("frames")
            }
        );
    }

    #[test]
    fn zero_convergence_is_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [camera]
            convergence = 0.0
            convergence_range = [0.0, 50.0]
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn near_range_must_stay_below_far() {
        let err = AppConfig::from_toml_str(
            r#"
            [camera]
            far = 5.0
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn default_outside_slider_range_is_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [camera]
            fov_deg = 150.0
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("fov_deg"));
    }

    #[test]
    fn nan_fps_is_rejected() {
        let err = AppConfig::from_toml_str("[background]\nfps = nan").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("fps"));
    }

    #[test]
    fn nan_camera_inputs_are_rejected() {
        for field in ["convergence", "eye_separation", "fov_deg", "near"] {
            let err = AppConfig::from_toml_str(&format!("[camera]\n{field} = nan")).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{field}");
            assert!(err.to_string().contains(field), "{field}");
        }
    }

    #[test]
    fn infinite_slider_range_is_rejected() {
        let err = AppConfig::from_toml_str("[camera]\nfov_range = [10.0, inf]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn nan_scale_range_is_rejected() {
        let err = AppConfig::from_toml_str("[controls]\nscale_range = [nan, 2.0]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[camera\nconvergence = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load_from_file(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
