//! Isometric world compositor: terrain quads, depth-sorted sprites and
//! per-entity animation state, drawn into an owned RGBA frame buffer.

pub mod animation;
pub mod assets;
pub mod config;
pub mod rendering;
pub mod world;

pub use animation::{AnimationState, EntityAnimationState, EntityAnimator, OneShot};
pub use assets::{
    Animation, AnimationFrame, ArtTile, AssetKind, Hue, MissingAssetLog, TerrainMaterial, Texture,
};
pub use config::{ConfigError, RenderConfig};
pub use rendering::{
    Camera, CameraBounds, DisplayOptions, FrameBuffer, RenderError, RenderOutcome, RenderStats,
    SkipReason, Viewport, WorldRenderer,
};
pub use world::{
    AnimationProvider, Direction, EntityId, EntityKind, EntitySnapshot, GameState, HueProvider,
    ImageProvider, LandTile, MapProvider, StaticTile, TerrainMaterials, TilePosition, Vec2,
    WorldPosition, WorldSources,
};
