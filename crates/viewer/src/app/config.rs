use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use compositor::{ConfigError, RenderConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_ENV_VAR: &str = "ISOVIEW_CONFIG";
const MIN_MAP_SIDE: u32 = 4;
const MAX_MAP_SIDE: u32 = 1024;
const MAX_NPC_COUNT: u32 = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ViewerConfig {
    pub(crate) window_title: String,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) target_tps: u32,
    pub(crate) max_frame_delta_ms: u64,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) metrics_log_interval_ms: u64,
    pub(crate) map_width: u32,
    pub(crate) map_height: u32,
    pub(crate) npc_count: u32,
    pub(crate) screenshot_dir: PathBuf,
    pub(crate) render: RenderConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_title: "Isoview".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta_ms: 250,
            max_ticks_per_frame: 5,
            metrics_log_interval_ms: 1000,
            map_width: 96,
            map_height: 96,
            npc_count: 12,
            screenshot_dir: PathBuf::from("screenshots"),
            render: RenderConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub(crate) fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }

    pub(crate) fn metrics_log_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_log_interval_ms)
    }

    pub(crate) fn validated(mut self) -> Result<Self, ViewerConfigError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ViewerConfigError::invalid(
                "window_width/window_height",
                "must be non-zero",
            ));
        }
        if self.target_tps == 0 {
            return Err(ViewerConfigError::invalid("target_tps", "must be non-zero"));
        }
        if self.max_ticks_per_frame == 0 {
            return Err(ViewerConfigError::invalid(
                "max_ticks_per_frame",
                "must be non-zero",
            ));
        }
        let side_ok = |side: u32| (MIN_MAP_SIDE..=MAX_MAP_SIDE).contains(&side);
        if !side_ok(self.map_width) || !side_ok(self.map_height) {
            return Err(ViewerConfigError::invalid(
                "map_width/map_height",
                format!("must be in {MIN_MAP_SIDE}..={MAX_MAP_SIDE}"),
            ));
        }
        if self.npc_count > MAX_NPC_COUNT {
            return Err(ViewerConfigError::invalid(
                "npc_count",
                format!("must be at most {MAX_NPC_COUNT}"),
            ));
        }
        self.render = self.render.validated()?;
        Ok(self)
    }
}

#[derive(Debug, Error)]
pub(crate) enum ViewerConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path} at {location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value {field}: {message}")]
    Invalid { field: &'static str, message: String },
    #[error(transparent)]
    Render(#[from] ConfigError),
}

impl ViewerConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Loads the file named by [`CONFIG_ENV_VAR`], or defaults when it is unset.
pub(crate) fn load_viewer_config_from_env() -> Result<ViewerConfig, ViewerConfigError> {
    match config_path_from(env::var_os(CONFIG_ENV_VAR)) {
        Some(path) => load_viewer_config(&path),
        None => ViewerConfig::default().validated(),
    }
}

pub(crate) fn config_path_from(value: Option<OsString>) -> Option<PathBuf> {
    value
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

pub(crate) fn load_viewer_config(path: &Path) -> Result<ViewerConfig, ViewerConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ViewerConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_viewer_config(path, &raw)?.validated()
}

fn parse_viewer_config(path: &Path, raw: &str) -> Result<ViewerConfig, ViewerConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, ViewerConfig>(&mut deserializer).map_err(|error| {
        let location = error.path().to_string();
        ViewerConfigError::Parse {
            path: path.to_path_buf(),
            location: if location.is_empty() {
                ".".to_string()
            } else {
                location
            },
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("isoview.json");
        fs::write(&path, contents).expect("write config");
        path
    }

    #[test]
    fn partial_file_overrides_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(
            &dir,
            r#"{
                "window_title": "Test",
                "npc_count": 3,
                "render": { "render_range_tiles": 10, "show_statics": false }
            }"#,
        );

        let config = load_viewer_config(&path).expect("load");
        assert_eq!(config.window_title, "Test");
        assert_eq!(config.npc_count, 3);
        assert_eq!(config.render.render_range_tiles, 10);
        assert!(!config.render.show_statics);
        assert_eq!(config.window_width, 1280);
    }

    #[test]
    fn parse_error_reports_field_path() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(&dir, r#"{ "render": { "camera_smoothing": "fast" } }"#);

        let error = load_viewer_config(&path).expect_err("bad type");
        match error {
            ViewerConfigError::Parse { location, .. } => {
                assert_eq!(location, "render.camera_smoothing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_field_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(&dir, r#"{ "window_tilte": "typo" }"#);
        assert!(matches!(
            load_viewer_config(&path),
            Err(ViewerConfigError::Parse { .. })
        ));
    }

    #[test]
    fn invalid_render_section_surfaces_render_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(&dir, r#"{ "render": { "camera_smoothing": 1.5 } }"#);
        assert!(matches!(
            load_viewer_config(&path),
            Err(ViewerConfigError::Render(ConfigError::Smoothing(_)))
        ));
    }

    #[test]
    fn tiny_map_is_rejected() {
        let config = ViewerConfig {
            map_width: 2,
            ..ViewerConfig::default()
        };
        assert!(matches!(
            config.validated(),
            Err(ViewerConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().expect("temp dir");
        let error = load_viewer_config(&dir.path().join("absent.json")).expect_err("missing");
        assert!(matches!(error, ViewerConfigError::Read { .. }));
    }

    #[test]
    fn empty_env_value_means_defaults() {
        assert_eq!(config_path_from(None), None);
        assert_eq!(config_path_from(Some(OsString::new())), None);
        assert_eq!(
            config_path_from(Some(OsString::from("a.json"))),
            Some(PathBuf::from("a.json"))
        );
    }
}
