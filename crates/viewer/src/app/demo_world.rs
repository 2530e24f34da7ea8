use std::collections::HashMap;
use std::time::Duration;

use compositor::animation::{BodyClass, FEMALE_BODY_ID, MALE_BODY_ID};
use compositor::{
    Animation, AnimationFrame, AnimationProvider, AnimationState, ArtTile, Direction, EntityId,
    EntityKind, EntitySnapshot, GameState, Hue, HueProvider, ImageProvider, LandTile, MapProvider,
    OneShot, StaticTile, TerrainMaterial, TerrainMaterials, Texture, TilePosition, WorldPosition,
    WorldSources,
};
use image::{Rgba, RgbaImage};
use tracing::{debug, info};

const DEMO_MAP_ID: u32 = 1;

const GRASS_TILE: u16 = 3;
const DIRT_TILE: u16 = 4;
const SAND_TILE: u16 = 22;
const WATER_TILE: u16 = 168;
// No material and no art: always drawn with the placeholder.
const ROCK_TILE: u16 = 540;

const GRASS_TEXMAP: u16 = 100;
// Referenced by the dirt material but never generated.
const DIRT_TEXMAP: u16 = 101;
const WATER_TEXMAP: u16 = 102;

const TREE_ITEM: u16 = 3274;
const BOULDER_ITEM: u16 = 4963;
const UNKNOWN_ITEM: u16 = 16383;

const DEER_BODY: u16 = 220;
const ORC_BODY: u16 = 50;

const TOWNSMAN_TYPE: u16 = 1;
const TOWNSWOMAN_TYPE: u16 = 2;
const DEER_TYPE: u16 = 10;
const ORC_TYPE: u16 = 11;
const UNMAPPED_TYPE: u16 = 99;

const RED_HUE: u16 = 33;
const BLUE_HUE: u16 = 90;
const MISSING_HUE: u16 = 1200;

const GENERATED_DIRECTIONS: u8 = 5;
const SPAWN_CLEARANCE: i32 = 3;

const PLAYER_ID: EntityId = EntityId(1);
const WALK_STEP_INTERVAL: Duration = Duration::from_millis(200);
const RUN_STEP_INTERVAL: Duration = Duration::from_millis(100);

const NPC_STEP_INTERVAL: Duration = Duration::from_millis(220);
const PATROL_LEG_LENGTH: u32 = 3;
const PATROL_PAUSE: Duration = Duration::from_millis(1500);
const PATROL_ROUTE: [Direction; 4] = [
    Direction::East,
    Direction::South,
    Direction::West,
    Direction::North,
];

const CUE_INTERVAL: Duration = Duration::from_millis(2500);
const RESPAWN_DELAY: Duration = Duration::from_secs(8);
const CUE_CYCLE: [(OneShot, Duration); 6] = [
    (OneShot::Attack, Duration::from_millis(640)),
    (OneShot::Cast, Duration::from_millis(960)),
    (OneShot::Hit, Duration::from_millis(450)),
    (OneShot::Attack, Duration::from_millis(640)),
    (OneShot::Hit, Duration::from_millis(450)),
    (OneShot::Death, Duration::from_millis(900)),
];

/// Procedurally generated map and asset tables standing in for client data files.
pub(crate) struct DemoWorld {
    width: u32,
    height: u32,
    land: Vec<LandTile>,
    statics: Vec<Vec<StaticTile>>,
    materials: HashMap<u16, TerrainMaterial>,
    texmaps: HashMap<u16, Texture>,
    land_art: HashMap<u16, ArtTile>,
    static_art: HashMap<u16, Texture>,
    animations: HashMap<(u16, u8, u8), Animation>,
    bodies: HashMap<u16, u16>,
    hues: HashMap<u16, Hue>,
}

impl DemoWorld {
    pub(crate) fn generate(width: u32, height: u32) -> Self {
        let spawn = spawn_tile(width, height);
        let mut land = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let near_spawn = (x as i32 - spawn.x).abs() <= SPAWN_CLEARANCE
                    && (y as i32 - spawn.y).abs() <= SPAWN_CLEARANCE;
                if !near_spawn && is_hole(x, y, width, height) {
                    land.push(LandTile::VOID);
                } else {
                    land.push(terrain_at(x, y));
                }
            }
        }
        let world = Self::from_land(width, height, land);
        info!(
            width,
            height,
            void_cells = world.land.iter().filter(|tile| tile.is_void).count(),
            statics = world.statics.iter().map(Vec::len).sum::<usize>(),
            animations = world.animations.len(),
            "demo_world_generated"
        );
        world
    }

    fn from_land(width: u32, height: u32, land: Vec<LandTile>) -> Self {
        let statics = land
            .iter()
            .enumerate()
            .map(|(index, tile)| {
                let x = index as u32 % width.max(1);
                let y = index as u32 / width.max(1);
                scatter_statics(x, y, *tile)
            })
            .collect();
        Self {
            width,
            height,
            land,
            statics,
            materials: terrain_materials(),
            texmaps: HashMap::from([
                (GRASS_TEXMAP, noisy_texture(64, [70, 130, 60], 1)),
                (WATER_TEXMAP, noisy_texture(64, [40, 80, 160], 2)),
            ]),
            land_art: HashMap::from([
                (DIRT_TILE, ArtTile::new(noisy_texture(44, [120, 90, 60], 3))),
                (SAND_TILE, ArtTile::new(noisy_texture(44, [200, 180, 120], 4))),
            ]),
            static_art: HashMap::from([
                (TREE_ITEM, tree_texture()),
                (BOULDER_ITEM, boulder_texture()),
            ]),
            animations: generate_animations(),
            bodies: HashMap::from([
                (TOWNSMAN_TYPE, MALE_BODY_ID),
                (TOWNSWOMAN_TYPE, FEMALE_BODY_ID),
                (DEER_TYPE, DEER_BODY),
                (ORC_TYPE, ORC_BODY),
            ]),
            hues: HashMap::from([
                (
                    RED_HUE,
                    Hue {
                        primary_color: [255, 120, 120, 255],
                    },
                ),
                (
                    BLUE_HUE,
                    Hue {
                        primary_color: [120, 200, 255, 255],
                    },
                ),
            ]),
        }
    }

    #[cfg(test)]
    pub(crate) fn flat(width: u32, height: u32) -> Self {
        let land = vec![LandTile::new(GRASS_TILE, 0); (width * height) as usize];
        Self::from_land(width, height, land)
    }

    pub(crate) fn sources(&self) -> WorldSources<'_> {
        WorldSources {
            map: self,
            materials: self,
            images: self,
            animations: self,
            hues: self,
        }
    }

    pub(crate) fn spawn(&self) -> TilePosition {
        spawn_tile(self.width, self.height)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl MapProvider for DemoWorld {
    fn is_loaded(&self) -> bool {
        !self.land.is_empty()
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn map_id(&self) -> u32 {
        DEMO_MAP_ID
    }

    fn land_tile(&self, x: i32, y: i32) -> LandTile {
        self.index(x, y)
            .and_then(|index| self.land.get(index).copied())
            .unwrap_or(LandTile::VOID)
    }

    fn static_tiles(&self, x: i32, y: i32) -> &[StaticTile] {
        self.index(x, y)
            .and_then(|index| self.statics.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl TerrainMaterials for DemoWorld {
    fn terrain_material(&self, tile_id: u16) -> Option<TerrainMaterial> {
        self.materials.get(&tile_id).copied()
    }
}

impl ImageProvider for DemoWorld {
    fn texmap(&self, texture_id: u16) -> Option<&Texture> {
        self.texmaps.get(&texture_id)
    }

    fn art_tile(&self, tile_id: u16) -> Option<&ArtTile> {
        self.land_art.get(&tile_id)
    }

    fn static_art(&self, item_id: u16) -> Option<&Texture> {
        self.static_art.get(&item_id)
    }
}

impl AnimationProvider for DemoWorld {
    fn animation(&self, body_id: u16, group: u8, direction: u8) -> Option<&Animation> {
        self.animations.get(&(body_id, group, direction))
    }

    fn body_for_type(&self, type_id: u16) -> Option<u16> {
        self.bodies.get(&type_id).copied()
    }
}

impl HueProvider for DemoWorld {
    fn hue(&self, hue_id: u16) -> Option<Hue> {
        self.hues.get(&hue_id).copied()
    }
}

fn spawn_tile(width: u32, height: u32) -> TilePosition {
    TilePosition::new((width / 2) as i32, (height / 2) as i32)
}

fn cell_hash(x: u32, y: u32) -> u32 {
    let mut hash = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77);
    hash ^= hash >> 15;
    hash = hash.wrapping_mul(0x2C1B_3C6D);
    hash ^ (hash >> 12)
}

fn is_hole(x: u32, y: u32, width: u32, height: u32) -> bool {
    let pit_x = width * 3 / 4;
    let pit_y = height / 4;
    let in_pit = (pit_x..pit_x + 5).contains(&x) && (pit_y..pit_y + 3).contains(&y);
    in_pit || cell_hash(x, y) % 97 == 0
}

fn terrain_at(x: u32, y: u32) -> LandTile {
    let (fx, fy) = (x as f32, y as f32);
    let height = (fx * 0.31).sin() * (fy * 0.23).cos() * 8.0 + ((fx + fy) * 0.11).sin() * 4.0;
    let tile_id = match height {
        h if h < -6.0 => WATER_TILE,
        h if h < -2.5 => SAND_TILE,
        h if h < 4.0 => GRASS_TILE,
        h if h < 8.0 => DIRT_TILE,
        _ => ROCK_TILE,
    };
    let z = if tile_id == WATER_TILE {
        -5
    } else {
        height.round() as i8
    };
    LandTile::new(tile_id, z)
}

fn scatter_statics(x: u32, y: u32, tile: LandTile) -> Vec<StaticTile> {
    if tile.is_void {
        return Vec::new();
    }
    let roll = cell_hash(y, x) % 64;
    let item_id = match (tile.tile_id, roll) {
        (GRASS_TILE, 0..=2) => TREE_ITEM,
        (DIRT_TILE, 0..=1) => BOULDER_ITEM,
        (SAND_TILE, 0) => UNKNOWN_ITEM,
        _ => return Vec::new(),
    };
    vec![StaticTile {
        item_id,
        z: tile.z,
    }]
}

fn terrain_materials() -> HashMap<u16, TerrainMaterial> {
    HashMap::from([
        (
            GRASS_TILE,
            TerrainMaterial {
                has_texture: true,
                texture_id: GRASS_TEXMAP,
            },
        ),
        (
            DIRT_TILE,
            TerrainMaterial {
                has_texture: true,
                texture_id: DIRT_TEXMAP,
            },
        ),
        (SAND_TILE, TerrainMaterial::default()),
        (
            WATER_TILE,
            TerrainMaterial {
                has_texture: true,
                texture_id: WATER_TEXMAP,
            },
        ),
    ])
}

fn shade(channel: u8, offset: i16) -> u8 {
    (channel as i16 + offset).clamp(0, 255) as u8
}

fn noisy_texture(size: u32, base: [u8; 3], seed: u32) -> Texture {
    Texture::from_image(RgbaImage::from_fn(size, size, |x, y| {
        let offset = (cell_hash(x ^ seed.wrapping_mul(131), y) % 25) as i16 - 12;
        Rgba([
            shade(base[0], offset),
            shade(base[1], offset),
            shade(base[2], offset),
            255,
        ])
    }))
}

fn tree_texture() -> Texture {
    Texture::from_image(RgbaImage::from_fn(32, 64, |x, y| {
        let (dx, dy) = (x as f32 - 15.5, y as f32 - 22.0);
        if dx * dx + dy * dy <= 15.0 * 15.0 {
            Rgba([40, 110 + (cell_hash(x, y) % 30) as u8, 45, 255])
        } else if y >= 34 && (13..19).contains(&x) {
            Rgba([100, 70, 40, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

fn boulder_texture() -> Texture {
    Texture::from_image(RgbaImage::from_fn(22, 14, |x, y| {
        let (dx, dy) = ((x as f32 - 10.5) / 11.0, (y as f32 - 7.0) / 7.0);
        if dx * dx + dy * dy <= 1.0 {
            let tone = shade(120, (cell_hash(x, y) % 20) as i16 - 10);
            Rgba([tone, tone, tone, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

struct BodyStyle {
    body_id: u16,
    color: [u8; 3],
    size: (u32, u32),
    center_x: i16,
    skipped: &'static [AnimationState],
}

const BODY_STYLES: [BodyStyle; 4] = [
    BodyStyle {
        body_id: MALE_BODY_ID,
        color: [200, 170, 140],
        size: (18, 40),
        center_x: 0,
        skipped: &[],
    },
    BodyStyle {
        body_id: FEMALE_BODY_ID,
        color: [220, 160, 170],
        size: (18, 38),
        center_x: 0,
        // Running falls back to the standing group.
        skipped: &[AnimationState::Running],
    },
    BodyStyle {
        body_id: DEER_BODY,
        color: [150, 110, 70],
        size: (34, 26),
        center_x: 4,
        skipped: &[],
    },
    BodyStyle {
        body_id: ORC_BODY,
        color: [90, 130, 80],
        size: (24, 44),
        center_x: 0,
        skipped: &[AnimationState::CastingSpell],
    },
];

const GENERATED_STATES: [(AnimationState, usize); 7] = [
    (AnimationState::Standing, 2),
    (AnimationState::Walking, 5),
    (AnimationState::Running, 5),
    (AnimationState::Attacking, 6),
    (AnimationState::CastingSpell, 6),
    (AnimationState::GettingHit, 3),
    (AnimationState::Dying, 5),
];

fn generate_animations() -> HashMap<(u16, u8, u8), Animation> {
    let mut animations = HashMap::new();
    for style in &BODY_STYLES {
        let class = BodyClass::of(style.body_id);
        for (state, frame_count) in GENERATED_STATES {
            if style.skipped.contains(&state) {
                continue;
            }
            let group = class.group_for(state);
            for direction in 0..GENERATED_DIRECTIONS {
                animations
                    .entry((style.body_id, group, direction))
                    .or_insert_with(|| figure_animation(style, state, direction, frame_count));
            }
        }
    }
    debug!(sequences = animations.len(), "demo_animations_generated");
    animations
}

fn figure_animation(
    style: &BodyStyle,
    state: AnimationState,
    direction: u8,
    frame_count: usize,
) -> Animation {
    let frames = (0..frame_count)
        .map(|frame| AnimationFrame {
            texture: figure_frame(style, state, direction, frame, frame_count),
            center_x: style.center_x,
            center_y: 0,
        })
        .collect();
    Animation { frames }
}

/// Blocky figure whose legs sway with the frame index and which sinks while dying.
fn figure_frame(
    style: &BodyStyle,
    state: AnimationState,
    direction: u8,
    frame: usize,
    frame_count: usize,
) -> Texture {
    let (width, height) = style.size;
    let sway = [-2_i32, 0, 2, 0][frame % 4];
    let visible = if state == AnimationState::Dying {
        (height as usize * (frame_count - frame) / frame_count).max(height as usize / 4) as u32
    } else {
        height
    };
    let top = height - visible;
    let legs_from = top + visible * 2 / 3;
    let flash = matches!(
        state,
        AnimationState::Attacking | AnimationState::CastingSpell | AnimationState::GettingHit
    ) && frame % 2 == 1;
    let tone = direction as i16 * 6 - 12;
    let body = if flash {
        Rgba([255, 255, 255, 255])
    } else {
        Rgba([
            shade(style.color[0], tone),
            shade(style.color[1], tone),
            shade(style.color[2], tone),
            255,
        ])
    };
    let legs = Rgba([50, 40, 35, 255]);
    let clear = Rgba([0, 0, 0, 0]);
    let quarter = width as i32 / 4;

    Texture::from_image(RgbaImage::from_fn(width, height, |x, y| {
        if y < top {
            return clear;
        }
        if y < legs_from {
            let inset = if y < top + visible / 5 { quarter } else { 1 };
            return if (x as i32) >= inset && (x as i32) < width as i32 - inset {
                body
            } else {
                clear
            };
        }
        let x = x as i32;
        let left = quarter + sway;
        let right = width as i32 - quarter - 3 - sway;
        if (left..left + 3).contains(&x) || (right..right + 3).contains(&x) {
            legs
        } else {
            clear
        }
    }))
}

/// Screen-space movement request: `screen_x` right, `screen_y` down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MoveIntent {
    pub(crate) screen_x: i32,
    pub(crate) screen_y: i32,
    pub(crate) run: bool,
}

impl MoveIntent {
    pub(crate) fn direction(self) -> Option<Direction> {
        let dx = (self.screen_x + self.screen_y).signum();
        let dy = (self.screen_y - self.screen_x).signum();
        direction_from_delta(dx, dy)
    }
}

fn direction_from_delta(dx: i32, dy: i32) -> Option<Direction> {
    match (dx, dy) {
        (0, -1) => Some(Direction::North),
        (1, -1) => Some(Direction::NorthEast),
        (1, 0) => Some(Direction::East),
        (1, 1) => Some(Direction::SouthEast),
        (0, 1) => Some(Direction::South),
        (-1, 1) => Some(Direction::SouthWest),
        (-1, 0) => Some(Direction::West),
        (-1, -1) => Some(Direction::NorthWest),
        _ => None,
    }
}

fn direction_delta(direction: Direction) -> (i32, i32) {
    match direction {
        Direction::North => (0, -1),
        Direction::NorthEast => (1, -1),
        Direction::East => (1, 0),
        Direction::SouthEast => (1, 1),
        Direction::South => (0, 1),
        Direction::SouthWest => (-1, 1),
        Direction::West => (-1, 0),
        Direction::NorthWest => (-1, -1),
    }
}

/// Moves one whole cell; void or off-map cells block the step.
fn try_step(entity: &mut EntitySnapshot, direction: Direction, map: &dyn MapProvider) -> bool {
    let (dx, dy) = direction_delta(direction);
    let from = entity.position.tile();
    let to = TilePosition::new(from.x + dx, from.y + dy);
    if map.land_tile(to.x, to.y).is_void {
        return false;
    }
    entity.position = cell_position(to);
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AnimationCue {
    pub(crate) id: EntityId,
    pub(crate) kind: OneShot,
    pub(crate) duration: Duration,
}

#[derive(Debug, Default)]
struct NpcBrain {
    route_offset: usize,
    steps: u32,
    step_timer: Duration,
    pause_left: Duration,
    respawn_at: Option<Duration>,
}

impl NpcBrain {
    fn tick(
        &mut self,
        entity: &mut EntitySnapshot,
        dt: Duration,
        now: Duration,
        map: &dyn MapProvider,
    ) {
        if entity.health <= 0 {
            if self.respawn_at.is_some_and(|at| now >= at) {
                entity.health = 1;
                self.respawn_at = None;
                debug!(entity_id = entity.id.0, "demo_npc_respawned");
            }
            return;
        }
        if !self.pause_left.is_zero() {
            self.pause_left = self.pause_left.saturating_sub(dt);
            return;
        }
        self.step_timer = self.step_timer.saturating_add(dt);
        if self.step_timer < NPC_STEP_INTERVAL {
            return;
        }
        self.step_timer -= NPC_STEP_INTERVAL;

        let leg = (self.steps / PATROL_LEG_LENGTH) as usize;
        let direction = PATROL_ROUTE[(self.route_offset + leg) % PATROL_ROUTE.len()];
        entity.facing = direction;
        try_step(entity, direction, map);
        self.steps += 1;
        if self.steps % (PATROL_LEG_LENGTH * PATROL_ROUTE.len() as u32) == 0 {
            self.pause_left = PATROL_PAUSE;
        }
    }
}

/// Scripted entities: a keyboard-driven player plus patrolling NPCs that take turns
/// attacking, casting, getting hit and dying.
#[derive(Debug)]
pub(crate) struct DemoGame {
    entities: Vec<EntitySnapshot>,
    brains: Vec<NpcBrain>,
    player_step_timer: Duration,
    elapsed: Duration,
    next_cue_at: Duration,
    cues_issued: usize,
}

impl DemoGame {
    pub(crate) fn new(world: &DemoWorld, npc_count: u32) -> Self {
        let spawn = world.spawn();
        let mut entities = Vec::with_capacity(npc_count as usize + 1);
        let mut player = EntitySnapshot::new(
            PLAYER_ID,
            EntityKind::Player { female: false },
            cell_position(spawn),
        );
        player.hue = Some(BLUE_HUE);
        entities.push(player);

        let mut brains = Vec::with_capacity(npc_count as usize);
        for index in 0..npc_count {
            let tile = npc_spawn(world, spawn, index);
            let mut npc = EntitySnapshot::new(
                EntityId(index + 2),
                npc_kind(index),
                cell_position(tile),
            );
            if index % 6 == 4 {
                npc.hue = Some([RED_HUE, BLUE_HUE, MISSING_HUE][(index / 6 % 3) as usize]);
            }
            entities.push(npc);
            brains.push(NpcBrain {
                route_offset: index as usize % PATROL_ROUTE.len(),
                ..NpcBrain::default()
            });
        }
        info!(npcs = npc_count, "demo_game_spawned");

        Self {
            entities,
            brains,
            player_step_timer: WALK_STEP_INTERVAL,
            elapsed: Duration::ZERO,
            next_cue_at: CUE_INTERVAL,
            cues_issued: 0,
        }
    }

    /// Advances scripted movement and appends one-shot animations that started this tick.
    pub(crate) fn tick(
        &mut self,
        dt: Duration,
        intent: MoveIntent,
        map: &dyn MapProvider,
        cues: &mut Vec<AnimationCue>,
    ) {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.tick_player(dt, intent, map);
        let now = self.elapsed;
        for (entity, brain) in self.entities.iter_mut().skip(1).zip(&mut self.brains) {
            brain.tick(entity, dt, now, map);
        }
        self.schedule_cue(cues);
    }

    fn tick_player(&mut self, dt: Duration, intent: MoveIntent, map: &dyn MapProvider) {
        let Some(player) = self.entities.first_mut() else {
            return;
        };
        let Some(direction) = intent.direction() else {
            player.is_running = false;
            self.player_step_timer = WALK_STEP_INTERVAL;
            return;
        };
        let interval = if intent.run {
            RUN_STEP_INTERVAL
        } else {
            WALK_STEP_INTERVAL
        };
        player.facing = direction;
        player.is_running = intent.run;
        self.player_step_timer = self.player_step_timer.saturating_add(dt);
        if self.player_step_timer >= interval {
            self.player_step_timer = (self.player_step_timer - interval).min(interval);
            try_step(player, direction, map);
        }
    }

    fn schedule_cue(&mut self, cues: &mut Vec<AnimationCue>) {
        if self.brains.is_empty() || self.elapsed < self.next_cue_at {
            return;
        }
        self.next_cue_at = self.elapsed.saturating_add(CUE_INTERVAL);
        let issued = self.cues_issued;
        self.cues_issued += 1;

        let npc = issued % self.brains.len();
        let Some(entity) = self.entities.get_mut(npc + 1) else {
            return;
        };
        if entity.health <= 0 {
            return;
        }
        let (kind, duration) = CUE_CYCLE[issued % CUE_CYCLE.len()];
        if kind == OneShot::Death {
            entity.health = 0;
            self.brains[npc].respawn_at = Some(self.elapsed.saturating_add(RESPAWN_DELAY));
        }
        cues.push(AnimationCue {
            id: entity.id,
            kind,
            duration,
        });
    }
}

impl GameState for DemoGame {
    fn entities(&self) -> &[EntitySnapshot] {
        &self.entities
    }

    fn player_id(&self) -> Option<EntityId> {
        Some(PLAYER_ID)
    }
}

/// Entity z is an offset above the terrain; the renderer adds the land elevation.
fn cell_position(tile: TilePosition) -> WorldPosition {
    WorldPosition::new(tile.x as f32, tile.y as f32, 0.0)
}

fn npc_kind(index: u32) -> EntityKind {
    match index % 6 {
        0 | 4 => EntityKind::Npc {
            type_id: TOWNSMAN_TYPE,
        },
        1 => EntityKind::Npc {
            type_id: TOWNSWOMAN_TYPE,
        },
        2 => EntityKind::Creature { type_id: DEER_TYPE },
        3 => EntityKind::Creature { type_id: ORC_TYPE },
        _ => EntityKind::Creature {
            type_id: UNMAPPED_TYPE,
        },
    }
}

/// Nearest non-void cell to a point on a spiral around the spawn.
fn npc_spawn(map: &dyn MapProvider, spawn: TilePosition, index: u32) -> TilePosition {
    let angle = index as f32 * 2.4;
    let radius = 3.0 + index as f32 * 0.8;
    let wanted = TilePosition::new(
        spawn.x + (angle.cos() * radius).round() as i32,
        spawn.y + (angle.sin() * radius).round() as i32,
    );
    for ring in 0..8_i32 {
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                let candidate = TilePosition::new(wanted.x + dx, wanted.y + dy);
                if !map.land_tile(candidate.x, candidate.y).is_void {
                    return candidate;
                }
            }
        }
    }
    spawn
}
