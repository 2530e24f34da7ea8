use crate::world::{Vec2, WorldPosition};

pub const TILE_SIZE_PX: f32 = 44.0;
pub const TILE_HALF_STEP_PX: f32 = 22.0;
pub const Z_STEP_PX: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(self) -> Vec2 {
        Vec2 {
            x: self.width as f32 * 0.5,
            y: self.height as f32 * 0.5,
        }
    }
}

/// Projects world coordinates into unscaled isometric pixel space.
pub fn world_to_iso(world: WorldPosition) -> Vec2 {
    Vec2 {
        x: (world.x - world.y) * TILE_HALF_STEP_PX,
        y: (world.x + world.y) * TILE_HALF_STEP_PX - world.z * Z_STEP_PX,
    }
}

/// Inverse of [`world_to_iso`], exact only at `z == 0`.
pub fn iso_to_world(iso: Vec2) -> WorldPosition {
    WorldPosition {
        x: (iso.x + iso.y) / TILE_SIZE_PX,
        y: (iso.y - iso.x) / TILE_SIZE_PX,
        z: 0.0,
    }
}

/// Inverts assuming the point lies at elevation `assumed_z`.
pub fn iso_to_world_at(iso: Vec2, assumed_z: f32) -> WorldPosition {
    let biased = Vec2 {
        x: iso.x,
        y: iso.y + assumed_z * Z_STEP_PX,
    };
    WorldPosition {
        z: assumed_z,
        ..iso_to_world(biased)
    }
}

/// translate(-position) * scale(zoom) * translate(viewport center)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport_center: Vec2,
}

impl ViewTransform {
    pub fn apply(&self, iso: Vec2) -> Vec2 {
        Vec2 {
            x: (iso.x - self.position.x) * self.zoom + self.viewport_center.x,
            y: (iso.y - self.position.y) * self.zoom + self.viewport_center.y,
        }
    }

    pub fn invert(&self, screen: Vec2) -> Vec2 {
        let zoom = if self.zoom.abs() > f32::EPSILON {
            self.zoom
        } else {
            1.0
        };
        Vec2 {
            x: (screen.x - self.viewport_center.x) / zoom + self.position.x,
            y: (screen.y - self.viewport_center.y) / zoom + self.position.y,
        }
    }

    pub fn world_to_screen(&self, world: WorldPosition) -> Vec2 {
        self.apply(world_to_iso(world))
    }
}
