mod camera;
mod depth;
mod raster;
mod renderer;
mod sprites;
mod stats;
mod terrain;
mod transform;

use thiserror::Error;

pub use camera::{
    Camera, CameraBounds, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN, CAMERA_ZOOM_STEP,
};
pub use depth::{terrain_priority, DepthKey, DrawLayer, DEPTH_PRIORITY_SCALE};
pub use raster::{FrameBuffer, ScreenRect};
pub use renderer::{DisplayOptions, RenderOutcome, SkipReason, WorldRenderer};
pub use sprites::{bottom_center_anchor, SpriteBatch, SpriteDraw, SpriteKind};
pub use stats::RenderStats;
pub use terrain::{
    build_checkerboard, choose_terrain_texture, collect_terrain_quads, Corner, ResolvedTexture,
    TerrainQuad, TerrainTextureChoice, TerrainTextureResolver, TextureSource,
};
pub use transform::{
    iso_to_world, iso_to_world_at, world_to_iso, ViewTransform, Viewport, TILE_HALF_STEP_PX,
    TILE_SIZE_PX, Z_STEP_PX,
};

pub const PLACEHOLDER_HALF_SIZE_PX: i32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("frame buffer of {width}x{height} pixels exceeds addressable memory")]
    FrameBufferTooLarge { width: u32, height: u32 },
    #[error("fallback texture of size {size} with cell {cell} is invalid")]
    InvalidFallbackTexture { size: u32, cell: u32 },
}
