use serde::{Deserialize, Serialize};

use super::transform::{iso_to_world, iso_to_world_at, world_to_iso, ViewTransform, Viewport};
use crate::world::{Vec2, WorldPosition};

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.25;
pub const CAMERA_ZOOM_MAX: f32 = 4.0;
pub const CAMERA_ZOOM_STEP: f32 = 0.25;
const CAMERA_SMOOTHING_MAX: f32 = 0.999;

/// Axis-aligned limits for the camera, in isometric pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec2,
    target_position: Vec2,
    zoom: f32,
    smoothing: f32,
    bounds: Option<CameraBounds>,
    viewport: Viewport,
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            position: Vec2::ZERO,
            target_position: Vec2::ZERO,
            zoom: CAMERA_ZOOM_DEFAULT,
            smoothing: 0.0,
            bounds: None,
            viewport,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn target_position(&self) -> Vec2 {
        self.target_position
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    pub fn bounds(&self) -> Option<CameraBounds> {
        self.bounds
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.position = self.clamp_to_bounds(self.position);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
        self.position = self.clamp_to_bounds(self.position);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + CAMERA_ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - CAMERA_ZOOM_STEP);
    }

    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        self.set_zoom(self.zoom + steps as f32 * CAMERA_ZOOM_STEP);
    }

    /// `0.0` snaps instantly; values approaching `1.0` follow ever more slowly.
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = if smoothing.is_finite() {
            smoothing.clamp(0.0, CAMERA_SMOOTHING_MAX)
        } else {
            0.0
        };
    }

    pub fn set_bounds(&mut self, bounds: Option<CameraBounds>) {
        self.bounds = bounds;
        self.position = self.clamp_to_bounds(self.position);
    }

    pub fn set_target(&mut self, target: Vec2) {
        self.target_position = target;
    }

    pub fn follow(&mut self, world: WorldPosition) {
        self.target_position = world_to_iso(world);
    }

    pub fn snap_to_target(&mut self) {
        self.position = self.clamp_to_bounds(self.target_position);
    }

    pub fn update(&mut self) {
        let t = 1.0 - self.smoothing;
        let next = self.position.lerp(self.target_position, t);
        self.position = self.clamp_to_bounds(next);
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            position: self.position,
            zoom: self.zoom,
            viewport_center: self.viewport.center(),
        }
    }

    pub fn world_to_screen(&self, world: WorldPosition) -> Vec2 {
        self.transform().world_to_screen(world)
    }

    pub fn screen_to_iso(&self, screen: Vec2) -> Vec2 {
        self.transform().invert(screen)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> WorldPosition {
        iso_to_world(self.screen_to_iso(screen))
    }

    pub fn screen_to_world_at(&self, screen: Vec2, assumed_z: f32) -> WorldPosition {
        iso_to_world_at(self.screen_to_iso(screen), assumed_z)
    }

    /// Visible region in isometric pixel space: `(min, max)`.
    pub fn visible_iso_rect(&self) -> (Vec2, Vec2) {
        let (half_w, half_h) = self.half_extents();
        (
            Vec2 {
                x: self.position.x - half_w,
                y: self.position.y - half_h,
            },
            Vec2 {
                x: self.position.x + half_w,
                y: self.position.y + half_h,
            },
        )
    }

    fn half_extents(&self) -> (f32, f32) {
        let zoom = clamp_camera_zoom(self.zoom);
        (
            self.viewport.width as f32 / (2.0 * zoom),
            self.viewport.height as f32 / (2.0 * zoom),
        )
    }

    fn clamp_to_bounds(&self, position: Vec2) -> Vec2 {
        let Some(bounds) = self.bounds else {
            return position;
        };
        let (half_w, half_h) = self.half_extents();
        Vec2 {
            x: clamp_axis(position.x, bounds.min_x + half_w, bounds.max_x - half_w),
            y: clamp_axis(position.y, bounds.min_y + half_h, bounds.max_y - half_h),
        }
    }
}

fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if min > max {
        // View is wider than the bounds; keep it centered on them.
        return (min + max) * 0.5;
    }
    value.clamp(min, max)
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_800x600() -> Camera {
        Camera::new(Viewport::new(800, 600))
    }

    #[test]
    fn world_origin_maps_to_viewport_center() {
        let camera = camera_800x600();
        assert_eq!(
            camera.world_to_screen(WorldPosition::new(0.0, 0.0, 0.0)),
            Vec2::new(400.0, 300.0)
        );
    }

    #[test]
    fn zoom_stays_clamped_under_repeated_steps() {
        let mut camera = camera_800x600();
        for _ in 0..100 {
            camera.zoom_in();
            assert!(camera.zoom() <= CAMERA_ZOOM_MAX);
        }
        assert_eq!(camera.zoom(), CAMERA_ZOOM_MAX);
        for _ in 0..100 {
            camera.zoom_out();
            assert!(camera.zoom() >= CAMERA_ZOOM_MIN);
        }
        assert_eq!(camera.zoom(), CAMERA_ZOOM_MIN);

        camera.set_zoom(f32::NAN);
        assert_eq!(camera.zoom(), CAMERA_ZOOM_DEFAULT);
        camera.apply_zoom_steps(1_000);
        assert_eq!(camera.zoom(), CAMERA_ZOOM_MAX);
    }

    #[test]
    fn zero_smoothing_snaps_to_target() {
        let mut camera = camera_800x600();
        camera.set_target(Vec2::new(120.0, -40.0));
        camera.update();
        assert_eq!(camera.position(), Vec2::new(120.0, -40.0));
    }

    #[test]
    fn smoothing_moves_fraction_toward_target() {
        let mut camera = camera_800x600();
        camera.set_smoothing(0.75);
        camera.set_target(Vec2::new(100.0, 0.0));
        camera.update();
        assert!((camera.position().x - 25.0).abs() < 1e-4);
        camera.update();
        assert!((camera.position().x - 43.75).abs() < 1e-4);
    }

    #[test]
    fn smoothing_is_kept_below_one() {
        let mut camera = camera_800x600();
        camera.set_smoothing(1.5);
        assert!(camera.smoothing() < 1.0);
        camera.set_smoothing(-2.0);
        assert_eq!(camera.smoothing(), 0.0);
    }

    #[test]
    fn bounds_keep_visible_extents_inside() {
        let mut camera = camera_800x600();
        camera.set_bounds(Some(CameraBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 2000.0,
            max_y: 2000.0,
        }));
        camera.set_target(Vec2::new(-500.0, 5000.0));
        camera.update();
        assert_eq!(camera.position(), Vec2::new(400.0, 1700.0));

        camera.set_zoom(2.0);
        camera.set_target(Vec2::new(-500.0, -500.0));
        camera.update();
        assert_eq!(camera.position(), Vec2::new(200.0, 150.0));
    }

    #[test]
    fn bounds_smaller_than_view_center_the_camera() {
        let mut camera = camera_800x600();
        camera.set_bounds(Some(CameraBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 100.0,
            max_y: 100.0,
        }));
        camera.set_target(Vec2::new(999.0, 999.0));
        camera.update();
        assert_eq!(camera.position(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen_at_ground_level() {
        let mut camera = camera_800x600();
        camera.set_zoom(1.75);
        camera.set_target(Vec2::new(300.0, 410.0));
        camera.update();

        let world = WorldPosition::new(12.25, 7.5, 0.0);
        let screen = camera.world_to_screen(world);
        let back = camera.screen_to_world(screen);
        assert!((back.x - world.x).abs() < 1e-3);
        assert!((back.y - world.y).abs() < 1e-3);

        let raised = WorldPosition::new(12.25, 7.5, 20.0);
        let picked = camera.screen_to_world_at(camera.world_to_screen(raised), 20.0);
        assert!((picked.x - raised.x).abs() < 1e-3);
        assert!((picked.y - raised.y).abs() < 1e-3);
    }

    #[test]
    fn follow_targets_projected_world_position() {
        let mut camera = camera_800x600();
        camera.follow(WorldPosition::new(2.0, 1.0, 0.0));
        camera.snap_to_target();
        assert_eq!(camera.position(), Vec2::new(22.0, 66.0));
        assert_eq!(
            camera.world_to_screen(WorldPosition::new(2.0, 1.0, 0.0)),
            Vec2::new(400.0, 300.0)
        );
    }
}
