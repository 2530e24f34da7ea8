use std::time::Duration;

use tracing::{debug, info, warn};

use super::camera::Camera;
use super::depth::{DepthKey, DrawLayer};
use super::raster::FrameBuffer;
use super::sprites::{bottom_center_anchor, SpriteBatch, SpriteKind};
use super::stats::RenderStats;
use super::terrain::{
    choose_terrain_texture, collect_terrain_quads, draw_terrain_quad, quad_screen_rect,
    ResolvedTexture, TerrainQuad, TerrainTextureResolver, TextureSource,
};
use super::transform::{world_to_iso, ViewTransform, Viewport};
use super::PLACEHOLDER_HALF_SIZE_PX;
use crate::animation::EntityAnimator;
use crate::assets::{AssetKind, MissingAssetLog};
use crate::config::{ConfigError, RenderConfig};
use crate::world::{
    EntityId, EntityKind, EntitySnapshot, GameState, MapProvider, TilePosition, Vec2,
    WorldPosition, WorldSources,
};

const PLAYER_PLACEHOLDER_COLOR: [u8; 4] = [80, 160, 255, 255];
const NPC_PLACEHOLDER_COLOR: [u8; 4] = [90, 220, 120, 255];
const CREATURE_PLACEHOLDER_COLOR: [u8; 4] = [230, 80, 70, 255];
const HIGHLIGHT_COLOR: [u8; 4] = [255, 236, 120, 255];

/// Toggles owned by the surrounding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub highlighted_tile: Option<TilePosition>,
    pub highlighted_entity: Option<EntityId>,
    pub show_statics: bool,
    pub use_asset_tiles: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            highlighted_tile: None,
            highlighted_entity: None,
            show_statics: true,
            use_asset_tiles: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MapNotLoaded,
    EmptyViewport,
    FrameBufferUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Drawn,
    Skipped(SkipReason),
}

/// Composites terrain, statics, entities and overlays into an off-screen frame.
#[derive(Debug)]
pub struct WorldRenderer {
    config: RenderConfig,
    camera: Camera,
    camera_primed: bool,
    display: DisplayOptions,
    frame: Option<FrameBuffer>,
    resolver: TerrainTextureResolver,
    missing: MissingAssetLog,
    animator: EntityAnimator,
    batch: SpriteBatch,
    quads: Vec<TerrainQuad>,
    stats: RenderStats,
    last_map_id: Option<u32>,
    waiting_for_map_logged: bool,
}

impl WorldRenderer {
    pub fn new(config: RenderConfig, viewport: Viewport) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let mut camera = Camera::new(viewport);
        camera.set_zoom(config.initial_zoom);
        camera.set_smoothing(config.camera_smoothing);
        camera.set_bounds(config.camera_bounds);

        Ok(Self {
            camera,
            camera_primed: false,
            display: DisplayOptions {
                show_statics: config.show_statics,
                use_asset_tiles: config.use_asset_tiles,
                ..DisplayOptions::default()
            },
            frame: None,
            resolver: TerrainTextureResolver::new(
                config.fallback_texture_size,
                config.fallback_checker_cell,
            ),
            missing: MissingAssetLog::new(),
            animator: EntityAnimator::new(config.move_anim_window(), config.movement_epsilon),
            batch: SpriteBatch::default(),
            quads: Vec::new(),
            stats: RenderStats::default(),
            last_map_id: None,
            waiting_for_map_logged: false,
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn display(&self) -> DisplayOptions {
        self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayOptions {
        &mut self.display
    }

    /// Counters from the most recent [`WorldRenderer::render`] call.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn animator(&self) -> &EntityAnimator {
        &self.animator
    }

    pub fn missing_assets(&self) -> &MissingAssetLog {
        &self.missing
    }

    pub fn frame_buffer(&self) -> Option<&FrameBuffer> {
        self.frame.as_ref()
    }

    /// Releases the frame buffer; the next render recreates it at the new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(Viewport::new(width, height));
        self.frame = None;
        debug!(width, height, "renderer_resized");
    }

    pub fn play_attack_animation(&mut self, id: EntityId, duration: Duration) {
        self.animator.play_attack_animation(id, duration);
    }

    pub fn play_cast_animation(&mut self, id: EntityId, duration: Duration) {
        self.animator.play_cast_animation(id, duration);
    }

    pub fn play_hit_animation(&mut self, id: EntityId, duration: Duration) {
        self.animator.play_hit_animation(id, duration);
    }

    pub fn play_death_animation(&mut self, id: EntityId, duration: Duration) {
        self.animator.play_death_animation(id, duration);
    }

    pub fn on_map_reloaded(&mut self) {
        self.missing.reset();
        self.resolver.release();
        self.camera_primed = false;
        info!(map_id = ?self.last_map_id, "renderer_map_reloaded");
    }

    pub fn dispose(&mut self) {
        self.frame = None;
        self.resolver.release();
        self.missing.reset();
        self.animator.clear();
        self.batch.begin();
        self.quads.clear();
        self.last_map_id = None;
        self.camera_primed = false;
        info!("renderer_disposed");
    }

    /// Follows the player, eases the camera and advances every entity animation.
    pub fn update(&mut self, sources: WorldSources<'_>, game: &dyn GameState, dt: Duration) {
        self.track_map_identity(sources.map);
        if let Some(player) = game.player() {
            self.camera.follow(grounded_position(sources.map, player.position));
            if self.camera_primed {
                self.camera.update();
            } else {
                self.camera.snap_to_target();
                self.camera_primed = true;
            }
        } else {
            self.camera.update();
        }
        self.animator.update(game.entities(), dt, sources.animations);
    }

    pub fn frame(
        &mut self,
        sources: WorldSources<'_>,
        game: &dyn GameState,
        dt: Duration,
    ) -> RenderOutcome {
        self.update(sources, game, dt);
        self.render(sources, game)
    }

    pub fn render(&mut self, sources: WorldSources<'_>, game: &dyn GameState) -> RenderOutcome {
        self.stats = RenderStats::default();
        if !sources.map.is_loaded() {
            if !self.waiting_for_map_logged {
                info!("renderer_waiting_for_map");
                self.waiting_for_map_logged = true;
            }
            return RenderOutcome::Skipped(SkipReason::MapNotLoaded);
        }
        self.waiting_for_map_logged = false;

        let viewport = self.camera.viewport();
        if viewport.is_empty() {
            return RenderOutcome::Skipped(SkipReason::EmptyViewport);
        }
        self.track_map_identity(sources.map);

        let mut frame = match self.frame.take() {
            Some(frame) if frame.viewport() == viewport => frame,
            _ => match FrameBuffer::new(viewport) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(error = %err, "renderer_frame_buffer_unavailable");
                    return RenderOutcome::Skipped(SkipReason::FrameBufferUnavailable);
                }
            },
        };
        frame.clear(self.config.clear_color);

        let transform = self.camera.transform();
        let center = self.render_center(game);
        self.draw_terrain(&mut frame, sources, &transform, center);
        self.draw_sprites(&mut frame, sources, game, &transform, center);

        self.frame = Some(frame);
        RenderOutcome::Drawn
    }

    /// Grid cell under a screen point, assuming the point lies at elevation `assumed_z`.
    pub fn screen_to_tile(&self, x: f32, y: f32, assumed_z: f32) -> TilePosition {
        self.camera
            .screen_to_world_at(Vec2::new(x, y), assumed_z)
            .tile()
    }

    /// Topmost entity drawn at a screen pixel in the last frame.
    pub fn pick_entity(&self, x: i32, y: i32) -> Option<EntityId> {
        self.batch.pick_entity(x, y)
    }

    fn track_map_identity(&mut self, map: &dyn MapProvider) {
        if !map.is_loaded() {
            return;
        }
        let map_id = map.map_id();
        match self.last_map_id {
            Some(previous) if previous == map_id => {}
            Some(previous) => {
                info!(previous, map_id, "renderer_map_changed");
                self.last_map_id = Some(map_id);
                self.on_map_reloaded();
            }
            None => self.last_map_id = Some(map_id),
        }
    }

    fn render_center(&self, game: &dyn GameState) -> TilePosition {
        match game.player() {
            Some(player) => player.position.tile(),
            None => self
                .camera
                .screen_to_world(self.camera.viewport().center())
                .tile(),
        }
    }

    fn draw_terrain(
        &mut self,
        frame: &mut FrameBuffer,
        sources: WorldSources<'_>,
        transform: &ViewTransform,
        center: TilePosition,
    ) {
        let mut quads = std::mem::take(&mut self.quads);
        let skipped = collect_terrain_quads(
            sources.map,
            center.x,
            center.y,
            self.config.render_range_tiles,
            &mut quads,
        );
        self.stats.quads_skipped_void = skipped as u32;

        let viewport = frame.viewport();
        let use_assets = self.display.use_asset_tiles
            && sources.materials.is_loaded()
            && sources.images.is_loaded();
        for quad in &quads {
            let corners = quad.screen_corners(transform);
            let on_screen =
                quad_screen_rect(&corners).is_some_and(|rect| rect.intersects_viewport(viewport));
            if !on_screen {
                self.stats.quads_culled += 1;
                continue;
            }

            let resolved = if use_assets {
                let choice = choose_terrain_texture(quad, sources.materials);
                self.resolver.resolve(&choice, sources.images, &mut self.missing)
            } else {
                ResolvedTexture {
                    texture: self.resolver.fallback_texture(),
                    source: TextureSource::Placeholder,
                }
            };
            match resolved.source {
                TextureSource::Texmap => self.stats.texmap_hits += 1,
                TextureSource::ArtTile => self.stats.art_fallbacks += 1,
                TextureSource::Placeholder => self.stats.placeholder_fallbacks += 1,
            }
            draw_terrain_quad(frame, corners, &resolved.texture);
            self.stats.quads_rendered += 1;
        }
        self.quads = quads;
    }

    fn draw_sprites(
        &mut self,
        frame: &mut FrameBuffer,
        sources: WorldSources<'_>,
        game: &dyn GameState,
        transform: &ViewTransform,
        center: TilePosition,
    ) {
        self.batch.begin();
        if self.display.show_statics && sources.images.is_loaded() {
            self.queue_statics(sources, transform, center);
        }
        if let Some(tile) = self.display.highlighted_tile {
            self.queue_tile_highlight(sources.map, transform, tile);
        }
        for entity in game.entities() {
            self.queue_entity(sources, transform, entity);
        }

        self.stats.sprites_culled = self.batch.cull(frame.viewport()) as u32;
        for draw in self.batch.draws() {
            match draw.kind {
                SpriteKind::Static { .. } => self.stats.statics_rendered += 1,
                SpriteKind::Entity { .. } => self.stats.entities_rendered += 1,
                SpriteKind::EntityPlaceholder { .. } => {
                    self.stats.entities_rendered += 1;
                    self.stats.entities_without_animation += 1;
                }
                SpriteKind::TileOutline { .. } => {}
            }
        }
        self.stats.sprite_draws = self.batch.end(frame) as u32;
    }

    fn queue_statics(
        &mut self,
        sources: WorldSources<'_>,
        transform: &ViewTransform,
        center: TilePosition,
    ) {
        let Some((x_min, x_max, y_min, y_max)) =
            cell_range(sources.map, center, self.config.render_range_tiles)
        else {
            return;
        };
        let zoom = transform.zoom;
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                for item in sources.map.static_tiles(x, y) {
                    let Some(texture) = sources.images.static_art(item.item_id) else {
                        self.missing
                            .report(AssetKind::StaticArt, item.item_id as u32);
                        continue;
                    };
                    let iso = world_to_iso(WorldPosition::new(x as f32, y as f32, item.z as f32));
                    let anchor =
                        bottom_center_anchor(iso, texture.width() as f32, texture.height() as f32);
                    self.batch.push(
                        DepthKey::new(x, y, item.z as i32, DrawLayer::Static),
                        SpriteKind::Static {
                            item_id: item.item_id,
                            texture: texture.clone(),
                        },
                        transform.apply(anchor),
                        zoom,
                    );
                }
            }
        }
    }

    fn queue_tile_highlight(
        &mut self,
        map: &dyn MapProvider,
        transform: &ViewTransform,
        tile: TilePosition,
    ) {
        let Some(quad) = TerrainQuad::sample(map, tile.x, tile.y) else {
            return;
        };
        let max_z = quad.nw.z.max(quad.ne.z).max(quad.sw.z).max(quad.se.z);
        self.batch.push(
            DepthKey::new(tile.x, tile.y, max_z as i32, DrawLayer::Highlight),
            SpriteKind::TileOutline {
                corners: quad.screen_corners(transform),
                color: HIGHLIGHT_COLOR,
            },
            Vec2::ZERO,
            1.0,
        );
    }

    fn queue_entity(
        &mut self,
        sources: WorldSources<'_>,
        transform: &ViewTransform,
        entity: &EntitySnapshot,
    ) {
        // Keyed on the same rounded cell `grounded_position` reads elevation from.
        let tile = entity.position.rounded_tile();
        let world = grounded_position(sources.map, entity.position);
        let iso = world_to_iso(world);
        let key = DepthKey::new(tile.x, tile.y, world.z.round() as i32, DrawLayer::Entity);
        let highlighted = self.display.highlighted_entity == Some(entity.id);

        let state = self.animator.state(entity.id);
        let art = state.and_then(|state| {
            state
                .current_frame(sources.animations)
                .map(|frame| (frame, state.mirror()))
        });
        let Some((art, mirror)) = art else {
            if let Some(state) = state {
                self.missing
                    .report(AssetKind::Animation, state.body_id() as u32);
            }
            let feet = transform.apply(iso);
            self.batch.push(
                key,
                SpriteKind::EntityPlaceholder {
                    id: entity.id,
                    half_size: PLACEHOLDER_HALF_SIZE_PX,
                    color: if highlighted {
                        HIGHLIGHT_COLOR
                    } else {
                        placeholder_color(entity.kind)
                    },
                },
                Vec2::new(feet.x, feet.y - PLACEHOLDER_HALF_SIZE_PX as f32),
                1.0,
            );
            return;
        };

        let tint = entity.hue.and_then(|hue_id| match sources.hues.hue(hue_id) {
            Some(hue) => Some(hue.primary_color),
            None => {
                self.missing.report(AssetKind::Hue, hue_id as u32);
                None
            }
        });
        let width = art.texture.width() as f32;
        let height = art.texture.height() as f32;
        let base = bottom_center_anchor(iso, width, height);
        // Frame centers shift the feet point; mirrored frames shift the other way.
        let center_x = if mirror {
            -(art.center_x as f32)
        } else {
            art.center_x as f32
        };
        let anchor = Vec2::new(base.x - center_x, base.y - art.center_y as f32);
        self.batch.push(
            key,
            SpriteKind::Entity {
                id: entity.id,
                texture: art.texture.clone(),
                mirror,
                tint,
                highlighted,
            },
            transform.apply(anchor),
            transform.zoom,
        );
    }
}

/// Adds the land elevation under the entity's rounded cell to its own z.
fn grounded_position(map: &dyn MapProvider, position: WorldPosition) -> WorldPosition {
    let tile = position.rounded_tile();
    let land = map.land_tile(tile.x, tile.y);
    let ground = if land.is_void { 0.0 } else { land.z as f32 };
    WorldPosition {
        z: position.z + ground,
        ..position
    }
}

fn cell_range(
    map: &dyn MapProvider,
    center: TilePosition,
    range: i32,
) -> Option<(i32, i32, i32, i32)> {
    let range = range.max(0);
    let max_x = map.width().min(i32::MAX as u32) as i32 - 1;
    let max_y = map.height().min(i32::MAX as u32) as i32 - 1;
    let x_min = center.x.saturating_sub(range).max(0);
    let x_max = center.x.saturating_add(range).min(max_x);
    let y_min = center.y.saturating_sub(range).max(0);
    let y_max = center.y.saturating_add(range).min(max_y);
    (x_min <= x_max && y_min <= y_max).then_some((x_min, x_max, y_min, y_max))
}

fn placeholder_color(kind: EntityKind) -> [u8; 4] {
    match kind {
        EntityKind::Player { .. } => PLAYER_PLACEHOLDER_COLOR,
        EntityKind::Npc { .. } => NPC_PLACEHOLDER_COLOR,
        EntityKind::Creature { .. } => CREATURE_PLACEHOLDER_COLOR,
    }
}
