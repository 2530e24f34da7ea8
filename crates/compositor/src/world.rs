use serde::{Deserialize, Serialize};

use crate::assets::{Animation, ArtTile, Hue, TerrainMaterial, Texture};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, target: Vec2, t: f32) -> Vec2 {
        Vec2 {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

/// Continuous world coordinates. `z` is elevation in map height units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPosition {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn tile(self) -> TilePosition {
        TilePosition {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
        }
    }

    pub fn rounded_tile(self) -> TilePosition {
        TilePosition {
            x: self.x.round() as i32,
            y: self.y.round() as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

impl TilePosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandTile {
    pub tile_id: u16,
    pub z: i8,
    pub is_void: bool,
}

impl LandTile {
    pub const VOID: LandTile = LandTile {
        tile_id: 0,
        z: 0,
        is_void: true,
    };

    pub const fn new(tile_id: u16, z: i8) -> Self {
        Self {
            tile_id,
            z,
            is_void: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticTile {
    pub item_id: u16,
    pub z: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Out-of-range indices clamp to the nearest valid direction.
    pub fn from_index(index: i32) -> Direction {
        Self::ALL[index.clamp(0, 7) as usize]
    }

    pub const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::NorthEast => 1,
            Direction::East => 2,
            Direction::SouthEast => 3,
            Direction::South => 4,
            Direction::SouthWest => 5,
            Direction::West => 6,
            Direction::NorthWest => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player { female: bool },
    Npc { type_id: u16 },
    Creature { type_id: u16 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: WorldPosition,
    pub facing: Direction,
    pub health: i32,
    pub is_moving: bool,
    pub is_running: bool,
    pub hue: Option<u16>,
}

impl EntitySnapshot {
    pub fn new(id: EntityId, kind: EntityKind, position: WorldPosition) -> Self {
        Self {
            id,
            kind,
            position,
            facing: Direction::South,
            health: 1,
            is_moving: false,
            is_running: false,
            hue: None,
        }
    }
}

pub trait MapProvider {
    fn is_loaded(&self) -> bool;
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Identity of the loaded map. A change is treated as a map reload.
    fn map_id(&self) -> u32 {
        0
    }

    /// Cells outside the map report [`LandTile::VOID`].
    fn land_tile(&self, x: i32, y: i32) -> LandTile;
    fn static_tiles(&self, x: i32, y: i32) -> &[StaticTile];
}

pub trait TerrainMaterials {
    fn is_loaded(&self) -> bool {
        true
    }
    fn terrain_material(&self, tile_id: u16) -> Option<TerrainMaterial>;
}

pub trait ImageProvider {
    fn is_loaded(&self) -> bool {
        true
    }
    fn texmap(&self, texture_id: u16) -> Option<&Texture>;
    fn art_tile(&self, tile_id: u16) -> Option<&ArtTile>;
    fn static_art(&self, item_id: u16) -> Option<&Texture>;
}

pub trait AnimationProvider {
    fn is_loaded(&self) -> bool {
        true
    }
    fn animation(&self, body_id: u16, group: u8, direction: u8) -> Option<&Animation>;
    fn body_for_type(&self, type_id: u16) -> Option<u16>;
}

pub trait HueProvider {
    fn hue(&self, hue_id: u16) -> Option<Hue>;
}

pub trait GameState {
    fn entities(&self) -> &[EntitySnapshot];
    fn player_id(&self) -> Option<EntityId>;

    fn player(&self) -> Option<&EntitySnapshot> {
        let player_id = self.player_id()?;
        self.entities().iter().find(|entity| entity.id == player_id)
    }
}

/// Borrowed collaborators consulted during one update/render call.
#[derive(Clone, Copy)]
pub struct WorldSources<'a> {
    pub map: &'a dyn MapProvider,
    pub materials: &'a dyn TerrainMaterials,
    pub images: &'a dyn ImageProvider,
    pub animations: &'a dyn AnimationProvider,
    pub hues: &'a dyn HueProvider,
}
