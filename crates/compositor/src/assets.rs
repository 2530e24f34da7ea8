use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use tracing::warn;

/// Shared RGBA image. Cloning only bumps a reference count.
#[derive(Clone)]
pub struct Texture {
    image: Arc<RgbaImage>,
}

impl Texture {
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::from_image(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Nearest-neighbour lookup with coordinates clamped to the image edge.
    pub fn sample(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.image.width().saturating_sub(1));
        let y = y.min(self.image.height().saturating_sub(1));
        self.image.get_pixel(x, y).0
    }

    pub fn sample_uv(&self, u: f32, v: f32) -> [u8; 4] {
        let x = (u.clamp(0.0, 1.0) * self.image.width() as f32) as u32;
        let y = (v.clamp(0.0, 1.0) * self.image.height() as f32) as u32;
        self.sample(x, y)
    }

    pub fn same_image(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ArtTile {
    pub texture: Texture,
    pub width: u32,
    pub height: u32,
}

impl ArtTile {
    pub fn new(texture: Texture) -> Self {
        let width = texture.width();
        let height = texture.height();
        Self {
            texture,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerrainMaterial {
    pub has_texture: bool,
    pub texture_id: u16,
}

#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub texture: Texture,
    pub center_x: i16,
    pub center_y: i16,
}

#[derive(Debug, Clone, Default)]
pub struct Animation {
    pub frames: Vec<AnimationFrame>,
}

impl Animation {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Option<&AnimationFrame> {
        self.frames.get(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hue {
    pub primary_color: [u8; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texmap,
    LandArt,
    StaticArt,
    Animation,
    Hue,
}

impl AssetKind {
    pub const fn as_token(self) -> &'static str {
        match self {
            AssetKind::Texmap => "texmap",
            AssetKind::LandArt => "land_art",
            AssetKind::StaticArt => "static_art",
            AssetKind::Animation => "animation",
            AssetKind::Hue => "hue",
        }
    }
}

/// Remembers which missing assets were already reported so each id warns once.
#[derive(Debug, Default)]
pub struct MissingAssetLog {
    reported: HashSet<(AssetKind, u32)>,
}

impl MissingAssetLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time an id is reported.
    pub fn report(&mut self, kind: AssetKind, id: u32) -> bool {
        if !self.reported.insert((kind, id)) {
            return false;
        }
        warn!(
            asset_kind = kind.as_token(),
            asset_id = id,
            "renderer_asset_missing_using_fallback"
        );
        true
    }

    pub fn contains(&self, kind: AssetKind, id: u32) -> bool {
        self.reported.contains(&(kind, id))
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }

    pub fn reset(&mut self) {
        self.reported.clear();
    }
}
