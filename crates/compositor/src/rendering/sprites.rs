use super::depth::DepthKey;
use super::raster::{
    draw_line, draw_rect_outline, draw_sprite, draw_square, scaled_sprite_dimensions,
    FrameBuffer, ScreenRect, SpriteStyle,
};
use super::transform::{Viewport, TILE_HALF_STEP_PX};
use crate::assets::Texture;
use crate::world::{EntityId, Vec2};

const HIGHLIGHT_LIGHTEN: f32 = 0.35;

#[derive(Debug, Clone)]
pub enum SpriteKind {
    Static {
        item_id: u16,
        texture: Texture,
    },
    Entity {
        id: EntityId,
        texture: Texture,
        mirror: bool,
        tint: Option<[u8; 4]>,
        highlighted: bool,
    },
    EntityPlaceholder {
        id: EntityId,
        half_size: i32,
        color: [u8; 4],
    },
    TileOutline {
        corners: [Vec2; 4],
        color: [u8; 4],
    },
}

#[derive(Debug, Clone)]
pub struct SpriteDraw {
    pub key: DepthKey,
    pub sequence: u32,
    pub kind: SpriteKind,
    /// Top-left corner for textured kinds, center for placeholders.
    pub screen: Vec2,
    pub scale: f32,
}

impl SpriteDraw {
    pub fn screen_rect(&self) -> Option<ScreenRect> {
        match &self.kind {
            SpriteKind::Static { texture, .. } | SpriteKind::Entity { texture, .. } => {
                let (w, h) = scaled_sprite_dimensions(texture, self.scale);
                let left = self.screen.x.round() as i32;
                let top = self.screen.y.round() as i32;
                Some(ScreenRect {
                    left,
                    top,
                    right: left + w as i32,
                    bottom: top + h as i32,
                })
            }
            SpriteKind::EntityPlaceholder { half_size, .. } => {
                let cx = self.screen.x.round() as i32;
                let cy = self.screen.y.round() as i32;
                Some(ScreenRect {
                    left: cx - half_size,
                    top: cy - half_size,
                    right: cx + half_size + 1,
                    bottom: cy + half_size + 1,
                })
            }
            SpriteKind::TileOutline { corners, .. } => ScreenRect::from_points(corners),
        }
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        match &self.kind {
            SpriteKind::Entity { id, .. } | SpriteKind::EntityPlaceholder { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Bottom-center anchoring shared by statics and entity frames, in iso space:
/// `(x - width / 2, y - height + half tile step)`.
pub fn bottom_center_anchor(iso: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2 {
        x: iso.x - width * 0.5,
        y: iso.y - height + TILE_HALF_STEP_PX,
    }
}

/// Draws queued sprites back to front in one pass.
#[derive(Debug, Default)]
pub struct SpriteBatch {
    draws: Vec<SpriteDraw>,
    next_sequence: u32,
}

impl SpriteBatch {
    pub fn begin(&mut self) {
        self.draws.clear();
        self.next_sequence = 0;
    }

    pub fn push(&mut self, key: DepthKey, kind: SpriteKind, screen: Vec2, scale: f32) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.draws.push(SpriteDraw {
            key,
            sequence,
            kind,
            screen,
            scale,
        });
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Sorts queued sprites; ties keep submission order.
    pub fn sort(&mut self) {
        self.draws.sort_by(|left, right| {
            left.key
                .cmp(&right.key)
                .then_with(|| left.sequence.cmp(&right.sequence))
        });
    }

    pub fn draws(&self) -> &[SpriteDraw] {
        &self.draws
    }

    /// Drops sprites whose bounds miss the viewport. Returns how many were dropped.
    pub fn cull(&mut self, viewport: Viewport) -> usize {
        let before = self.draws.len();
        self.draws.retain(|draw| {
            draw.screen_rect()
                .is_some_and(|rect| rect.intersects_viewport(viewport))
        });
        before - self.draws.len()
    }

    pub fn end(&mut self, frame: &mut FrameBuffer) -> usize {
        self.sort();
        for draw in &self.draws {
            draw_one(frame, draw);
        }
        self.draws.len()
    }

    /// Topmost entity whose sprite bounds contain the screen point.
    pub fn pick_entity(&self, x: i32, y: i32) -> Option<EntityId> {
        self.draws
            .iter()
            .rev()
            .filter(|draw| draw.screen_rect().is_some_and(|rect| rect.contains(x, y)))
            .find_map(SpriteDraw::entity_id)
    }
}

fn draw_one(frame: &mut FrameBuffer, draw: &SpriteDraw) {
    let left = draw.screen.x.round() as i32;
    let top = draw.screen.y.round() as i32;
    match &draw.kind {
        SpriteKind::Static { texture, .. } => {
            draw_sprite(
                frame,
                left,
                top,
                texture,
                SpriteStyle {
                    scale: draw.scale,
                    ..SpriteStyle::default()
                },
            );
        }
        SpriteKind::Entity {
            texture,
            mirror,
            tint,
            highlighted,
            ..
        } => {
            draw_sprite(
                frame,
                left,
                top,
                texture,
                SpriteStyle {
                    scale: draw.scale,
                    mirror: *mirror,
                    tint: *tint,
                    lighten: if *highlighted { HIGHLIGHT_LIGHTEN } else { 0.0 },
                },
            );
            if *highlighted {
                if let Some(rect) = draw.screen_rect() {
                    draw_rect_outline(frame, rect, [255, 236, 120, 255]);
                }
            }
        }
        SpriteKind::EntityPlaceholder {
            half_size, color, ..
        } => {
            draw_square(frame, left, top, *half_size, *color);
        }
        SpriteKind::TileOutline { corners, color } => {
            // Corner order is NW, NE, SW, SE; walk the diamond rim.
            let [nw, ne, sw, se] = *corners;
            draw_line(frame, nw, ne, *color);
            draw_line(frame, ne, se, *color);
            draw_line(frame, se, sw, *color);
            draw_line(frame, sw, nw, *color);
        }
    }
}
