//! Terrain quads: corner sampling, texture choice and the fallback chain.
//!
//! Each visible cell becomes one quad whose four corners carry their own
//! elevation. Texture choice is recomputed from scratch for every quad on every
//! frame so identical map state always produces identical output.

use image::{Rgba, RgbaImage};
use tracing::{error, warn};

use super::depth::terrain_priority;
use super::raster::{fill_textured_triangle, FrameBuffer, ScreenRect, TexturedVertex};
use super::transform::ViewTransform;
use super::RenderError;
use crate::assets::{AssetKind, MissingAssetLog, Texture};
use crate::config::MAX_FALLBACK_TEXTURE_SIZE;
use crate::world::{ImageProvider, LandTile, MapProvider, TerrainMaterials, Vec2, WorldPosition};

const CHECKER_LIGHT: [u8; 4] = [196, 64, 196, 255];
const CHECKER_DARK: [u8; 4] = [40, 40, 40, 255];
const EMERGENCY_PLACEHOLDER_COLOR: [u8; 4] = [255, 0, 255, 255];

/// Corners in tie-break order; the discriminant is the corner priority index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthWest = 0,
    NorthEast = 1,
    SouthWest = 2,
    SouthEast = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthWest,
        Corner::SouthEast,
    ];

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Corner::NorthWest => (0, 0),
            Corner::NorthEast => (1, 0),
            Corner::SouthWest => (0, 1),
            Corner::SouthEast => (1, 1),
        }
    }

    pub const fn uv(self) -> Vec2 {
        match self {
            Corner::NorthWest => Vec2::new(0.0, 0.0),
            Corner::NorthEast => Vec2::new(1.0, 0.0),
            Corner::SouthWest => Vec2::new(0.0, 1.0),
            Corner::SouthEast => Vec2::new(1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainQuad {
    pub grid_x: i32,
    pub grid_y: i32,
    pub nw: LandTile,
    pub ne: LandTile,
    pub sw: LandTile,
    pub se: LandTile,
    pub priority: i32,
}

impl TerrainQuad {
    /// Samples the four corners of cell `(x, y)`. `None` when all four are void.
    pub fn sample(map: &dyn MapProvider, x: i32, y: i32) -> Option<Self> {
        let [nw, ne, sw, se] = Corner::ALL.map(|corner| {
            let (dx, dy) = corner.offset();
            map.land_tile(x + dx, y + dy)
        });
        Self::from_corners(x, y, nw, ne, sw, se)
    }

    pub fn from_corners(
        grid_x: i32,
        grid_y: i32,
        nw: LandTile,
        ne: LandTile,
        sw: LandTile,
        se: LandTile,
    ) -> Option<Self> {
        if nw.is_void && ne.is_void && sw.is_void && se.is_void {
            return None;
        }
        let max_z = nw.z.max(ne.z).max(sw.z).max(se.z);
        Some(Self {
            grid_x,
            grid_y,
            nw,
            ne,
            sw,
            se,
            priority: terrain_priority(grid_x, grid_y, max_z),
        })
    }

    pub fn corner(&self, corner: Corner) -> LandTile {
        match corner {
            Corner::NorthWest => self.nw,
            Corner::NorthEast => self.ne,
            Corner::SouthWest => self.sw,
            Corner::SouthEast => self.se,
        }
    }

    pub fn corner_world(&self, corner: Corner) -> WorldPosition {
        let (dx, dy) = corner.offset();
        WorldPosition {
            x: (self.grid_x + dx) as f32,
            y: (self.grid_y + dy) as f32,
            z: self.corner(corner).z as f32,
        }
    }

    /// Screen position of every corner, each projected with its own elevation.
    pub fn screen_corners(&self, transform: &ViewTransform) -> [Vec2; 4] {
        Corner::ALL.map(|corner| transform.world_to_screen(self.corner_world(corner)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerrainTextureChoice {
    pub texture_id: u16,
    pub art_tile_id: u16,
}

#[derive(Debug, Clone, Copy)]
struct CornerCandidate {
    z: i8,
    tile: LandTile,
    texture_id: u16,
}

fn prefer(best: Option<CornerCandidate>, candidate: CornerCandidate) -> Option<CornerCandidate> {
    match best {
        // Corners arrive in priority order, so only a strictly higher corner wins.
        Some(current) if current.z >= candidate.z => Some(current),
        _ => Some(candidate),
    }
}

/// Picks the texture id and paired art tile id for a quad.
pub fn choose_terrain_texture(
    quad: &TerrainQuad,
    materials: &dyn TerrainMaterials,
) -> TerrainTextureChoice {
    let mut best_texture: Option<CornerCandidate> = None;
    let mut best_art: Option<CornerCandidate> = None;

    for corner in Corner::ALL {
        let tile = quad.corner(corner);
        if tile.is_void {
            continue;
        }
        let material = materials.terrain_material(tile.tile_id).unwrap_or_default();
        let candidate = CornerCandidate {
            z: tile.z,
            tile,
            texture_id: if material.has_texture {
                material.texture_id
            } else {
                0
            },
        };
        if candidate.texture_id > 0 {
            best_texture = prefer(best_texture, candidate);
        }
        best_art = prefer(best_art, candidate);
    }

    match (best_texture, best_art) {
        (Some(texture_corner), _) => TerrainTextureChoice {
            texture_id: texture_corner.texture_id,
            art_tile_id: texture_corner.tile.tile_id,
        },
        (None, Some(art_corner)) => TerrainTextureChoice {
            texture_id: 0,
            art_tile_id: art_corner.tile.tile_id,
        },
        (None, None) => TerrainTextureChoice::default(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSource {
    Texmap,
    ArtTile,
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct ResolvedTexture {
    pub texture: Texture,
    pub source: TextureSource,
}

type ResolverStage = fn(&TerrainTextureChoice, &dyn ImageProvider) -> Option<Texture>;

const RESOLUTION_CHAIN: [(TextureSource, ResolverStage); 2] = [
    (TextureSource::Texmap, resolve_texmap),
    (TextureSource::ArtTile, resolve_art_tile),
];

fn resolve_texmap(choice: &TerrainTextureChoice, images: &dyn ImageProvider) -> Option<Texture> {
    if choice.texture_id == 0 {
        return None;
    }
    images
        .texmap(choice.texture_id)
        .filter(|texture| !texture.is_empty())
        .cloned()
}

fn resolve_art_tile(choice: &TerrainTextureChoice, images: &dyn ImageProvider) -> Option<Texture> {
    images
        .art_tile(choice.art_tile_id)
        .map(|art| art.texture.clone())
        .filter(|texture| !texture.is_empty())
}

fn report_miss(missing: &mut MissingAssetLog, source: TextureSource, choice: &TerrainTextureChoice) {
    match source {
        TextureSource::Texmap if choice.texture_id > 0 => {
            missing.report(AssetKind::Texmap, choice.texture_id as u32);
        }
        TextureSource::ArtTile => {
            missing.report(AssetKind::LandArt, choice.art_tile_id as u32);
        }
        _ => {}
    }
}

/// Owns the checkerboard placeholder that ends every resolution chain.
#[derive(Debug)]
pub struct TerrainTextureResolver {
    fallback: Option<Texture>,
    fallback_size: u32,
    fallback_cell: u32,
}

impl TerrainTextureResolver {
    pub fn new(fallback_size: u32, fallback_cell: u32) -> Self {
        Self {
            fallback: None,
            fallback_size,
            fallback_cell,
        }
    }

    /// Texmap by id, then the diamond art tile, then the placeholder. Never absent.
    pub fn resolve(
        &mut self,
        choice: &TerrainTextureChoice,
        images: &dyn ImageProvider,
        missing: &mut MissingAssetLog,
    ) -> ResolvedTexture {
        for (source, stage) in RESOLUTION_CHAIN {
            if let Some(texture) = stage(choice, images) {
                return ResolvedTexture { texture, source };
            }
            report_miss(missing, source, choice);
        }
        ResolvedTexture {
            texture: self.fallback_texture(),
            source: TextureSource::Placeholder,
        }
    }

    pub fn fallback_texture(&mut self) -> Texture {
        if let Some(texture) = &self.fallback {
            return texture.clone();
        }
        let texture = match build_checkerboard(self.fallback_size, self.fallback_cell) {
            Ok(texture) => texture,
            Err(err) => {
                error!(error = %err, "terrain_fallback_texture_invalid_using_emergency_placeholder");
                emergency_placeholder()
            }
        };
        self.fallback = Some(texture.clone());
        texture
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn release(&mut self) {
        self.fallback = None;
    }
}

pub fn build_checkerboard(size: u32, cell: u32) -> Result<Texture, RenderError> {
    if size == 0 || cell == 0 || size > MAX_FALLBACK_TEXTURE_SIZE {
        return Err(RenderError::InvalidFallbackTexture { size, cell });
    }
    let image = RgbaImage::from_fn(size, size, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgba(CHECKER_LIGHT)
        } else {
            Rgba(CHECKER_DARK)
        }
    });
    Ok(Texture::from_image(image))
}

pub fn emergency_placeholder() -> Texture {
    Texture::solid(2, 2, EMERGENCY_PLACEHOLDER_COLOR)
}

/// Draws the quad as two triangles, NW-NE-SW and NE-SE-SW.
pub fn draw_terrain_quad(frame: &mut FrameBuffer, corners: [Vec2; 4], texture: &Texture) {
    let vertex = |corner: Corner| TexturedVertex {
        position: corners[corner as usize],
        uv: corner.uv(),
    };
    fill_textured_triangle(
        frame,
        [
            vertex(Corner::NorthWest),
            vertex(Corner::NorthEast),
            vertex(Corner::SouthWest),
        ],
        texture,
    );
    fill_textured_triangle(
        frame,
        [
            vertex(Corner::NorthEast),
            vertex(Corner::SouthEast),
            vertex(Corner::SouthWest),
        ],
        texture,
    );
}

pub fn quad_screen_rect(corners: &[Vec2; 4]) -> Option<ScreenRect> {
    ScreenRect::from_points(corners)
}

/// Collects every non-void quad in the square of cells around `center`,
/// sorted back to front. Returns how many cells were skipped as void.
pub fn collect_terrain_quads(
    map: &dyn MapProvider,
    center_x: i32,
    center_y: i32,
    range: i32,
    out: &mut Vec<TerrainQuad>,
) -> usize {
    out.clear();
    let range = range.max(0);
    let max_x = map.width().min(i32::MAX as u32) as i32 - 1;
    let max_y = map.height().min(i32::MAX as u32) as i32 - 1;
    let x_min = center_x.saturating_sub(range).max(0);
    let x_max = center_x.saturating_add(range).min(max_x);
    let y_min = center_y.saturating_sub(range).max(0);
    let y_max = center_y.saturating_add(range).min(max_y);

    let mut skipped_void = 0;
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            match TerrainQuad::sample(map, x, y) {
                Some(quad) => out.push(quad),
                None => skipped_void += 1,
            }
        }
    }
    out.sort_by(|left, right| {
        left.priority
            .cmp(&right.priority)
            .then_with(|| left.grid_y.cmp(&right.grid_y))
            .then_with(|| left.grid_x.cmp(&right.grid_x))
    });
    if skipped_void > 0 && out.is_empty() {
        warn!(
            center_x,
            center_y,
            range,
            skipped_void,
            "terrain_render_range_entirely_void"
        );
    }
    skipped_void
}
