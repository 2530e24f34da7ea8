use std::cmp::Ordering;

pub const DEPTH_PRIORITY_SCALE: f32 = 10_000_000.0;
const DIAGONAL_STRIDE: i64 = 256;
const Z_BIAS: i32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawLayer {
    Terrain,
    Static,
    Highlight,
    Entity,
}

impl DrawLayer {
    pub const fn type_bonus(self) -> i32 {
        match self {
            DrawLayer::Terrain => 0,
            DrawLayer::Static => 1,
            DrawLayer::Highlight => 2,
            DrawLayer::Entity => 3,
        }
    }
}

/// Back-to-front sort key: grid diagonal, then elevation, then layer.
///
/// Ordering is lexicographic so a larger `tile_x + tile_y` always draws later,
/// whatever the elevation or layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthKey {
    diagonal: i32,
    z: i32,
    layer: DrawLayer,
}

impl DepthKey {
    pub fn new(tile_x: i32, tile_y: i32, tile_z: i32, layer: DrawLayer) -> Self {
        Self {
            diagonal: tile_x.saturating_add(tile_y),
            z: tile_z.clamp(i8::MIN as i32, i8::MAX as i32),
            layer,
        }
    }

    pub fn layer(&self) -> DrawLayer {
        self.layer
    }

    /// `(tile_x + tile_y) * 256 + (tile_z + 128) + type_bonus`
    pub fn priority(&self) -> i64 {
        self.diagonal as i64 * DIAGONAL_STRIDE
            + (self.z + Z_BIAS) as i64
            + self.layer.type_bonus() as i64
    }

    /// Normalized compositor depth; larger values sit further back.
    pub fn layer_depth(&self) -> f32 {
        1.0 - self.priority() as f32 / DEPTH_PRIORITY_SCALE
    }
}

impl Ord for DepthKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.diagonal
            .cmp(&other.diagonal)
            .then_with(|| self.z.cmp(&other.z))
            .then_with(|| {
                self.layer
                    .type_bonus()
                    .cmp(&other.layer.type_bonus())
            })
    }
}

impl PartialOrd for DepthKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Terrain quads order by `(x + y) * 256 + max corner z`.
pub fn terrain_priority(grid_x: i32, grid_y: i32, max_corner_z: i8) -> i32 {
    grid_x
        .saturating_add(grid_y)
        .saturating_mul(DIAGONAL_STRIDE as i32)
        .saturating_add(max_corner_z as i32)
}
