use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::{MOVEMENT_EPSILON, MOVE_ANIM_WINDOW};
use crate::rendering::{CameraBounds, CAMERA_ZOOM_DEFAULT};

pub const MAX_RENDER_RANGE_TILES: i32 = 256;
pub const MAX_FALLBACK_TEXTURE_SIZE: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Half-width of the square of cells drawn around the follow target.
    pub render_range_tiles: i32,
    pub camera_smoothing: f32,
    pub initial_zoom: f32,
    pub camera_bounds: Option<CameraBounds>,
    pub move_anim_window_ms: u64,
    pub movement_epsilon: f32,
    pub fallback_texture_size: u32,
    pub fallback_checker_cell: u32,
    pub clear_color: [u8; 4],
    pub show_statics: bool,
    pub use_asset_tiles: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_range_tiles: 24,
            camera_smoothing: 0.85,
            initial_zoom: CAMERA_ZOOM_DEFAULT,
            camera_bounds: None,
            move_anim_window_ms: MOVE_ANIM_WINDOW.as_millis() as u64,
            movement_epsilon: MOVEMENT_EPSILON,
            fallback_texture_size: 64,
            fallback_checker_cell: 8,
            clear_color: [12, 12, 18, 255],
            show_statics: true,
            use_asset_tiles: true,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("render_range_tiles must be in 1..={max}, got {value}")]
    RenderRange { value: i32, max: i32 },
    #[error("camera_smoothing must be finite and in [0, 1), got {0}")]
    Smoothing(f32),
    #[error("initial_zoom must be finite and positive, got {0}")]
    Zoom(f32),
    #[error("movement_epsilon must be finite and non-negative, got {0}")]
    MovementEpsilon(f32),
    #[error("move_anim_window_ms must be greater than zero")]
    MoveWindow,
    #[error(
        "fallback texture size must be in 1..={max} with a non-zero cell, got size {size} cell {cell}"
    )]
    FallbackTexture { size: u32, cell: u32, max: u32 },
    #[error("camera_bounds must be finite with min <= max on both axes")]
    CameraBounds,
}

impl RenderConfig {
    pub fn validated(self) -> Result<Self, ConfigError> {
        if !(1..=MAX_RENDER_RANGE_TILES).contains(&self.render_range_tiles) {
            return Err(ConfigError::RenderRange {
                value: self.render_range_tiles,
                max: MAX_RENDER_RANGE_TILES,
            });
        }
        if !self.camera_smoothing.is_finite() || !(0.0..1.0).contains(&self.camera_smoothing) {
            return Err(ConfigError::Smoothing(self.camera_smoothing));
        }
        if !self.initial_zoom.is_finite() || self.initial_zoom <= 0.0 {
            return Err(ConfigError::Zoom(self.initial_zoom));
        }
        if !self.movement_epsilon.is_finite() || self.movement_epsilon < 0.0 {
            return Err(ConfigError::MovementEpsilon(self.movement_epsilon));
        }
        if self.move_anim_window_ms == 0 {
            return Err(ConfigError::MoveWindow);
        }
        if self.fallback_texture_size == 0
            || self.fallback_texture_size > MAX_FALLBACK_TEXTURE_SIZE
            || self.fallback_checker_cell == 0
        {
            return Err(ConfigError::FallbackTexture {
                size: self.fallback_texture_size,
                cell: self.fallback_checker_cell,
                max: MAX_FALLBACK_TEXTURE_SIZE,
            });
        }
        if let Some(bounds) = self.camera_bounds {
            let finite = [bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y]
                .iter()
                .all(|value| value.is_finite());
            if !finite || bounds.min_x > bounds.max_x || bounds.min_y > bounds.max_y {
                return Err(ConfigError::CameraBounds);
            }
        }
        Ok(self)
    }

    pub fn move_anim_window(&self) -> Duration {
        Duration::from_millis(self.move_anim_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RenderConfig::default().validated().expect("valid");
        assert_eq!(config.move_anim_window(), Duration::from_millis(250));
        assert!(config.show_statics);
        assert!(config.use_asset_tiles);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r#"{ "render_range_tiles": 8, "show_statics": false }"#)
                .expect("parse");
        assert_eq!(config.render_range_tiles, 8);
        assert!(!config.show_statics);
        assert_eq!(config.fallback_texture_size, 64);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<RenderConfig>(r#"{ "render_range": 8 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let cases = [
            RenderConfig {
                render_range_tiles: 0,
                ..RenderConfig::default()
            },
            RenderConfig {
                camera_smoothing: 1.0,
                ..RenderConfig::default()
            },
            RenderConfig {
                initial_zoom: f32::NAN,
                ..RenderConfig::default()
            },
            RenderConfig {
                movement_epsilon: -0.5,
                ..RenderConfig::default()
            },
            RenderConfig {
                move_anim_window_ms: 0,
                ..RenderConfig::default()
            },
            RenderConfig {
                fallback_checker_cell: 0,
                ..RenderConfig::default()
            },
            RenderConfig {
                camera_bounds: Some(CameraBounds {
                    min_x: 10.0,
                    min_y: 0.0,
                    max_x: -10.0,
                    max_y: 5.0,
                }),
                ..RenderConfig::default()
            },
        ];
        for config in cases {
            assert!(config.clone().validated().is_err(), "{config:?}");
        }
    }

    #[test]
    fn bounds_round_trip_through_json() {
        let config: RenderConfig = serde_json::from_str(
            r#"{ "camera_bounds": { "min_x": -100.0, "min_y": 0.0, "max_x": 100.0, "max_y": 400.0 } }"#,
        )
        .expect("parse");
        let config = config.validated().expect("valid");
        assert_eq!(
            config.camera_bounds,
            Some(CameraBounds {
                min_x: -100.0,
                min_y: 0.0,
                max_x: 100.0,
                max_y: 400.0
            })
        );
    }
}
