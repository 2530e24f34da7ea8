use std::fmt;

use image::RgbaImage;

use super::transform::Viewport;
use super::RenderError;
use crate::assets::Texture;
use crate::world::Vec2;

/// Off-screen RGBA8 render target.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(viewport: Viewport) -> Result<Self, RenderError> {
        let len = (viewport.width as usize)
            .checked_mul(viewport.height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or(RenderError::FrameBufferTooLarge {
                width: viewport.width,
                height: viewport.height,
            })?;
        Ok(Self {
            width: viewport.width,
            height: viewport.height,
            rgba: vec![0; len],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Copies the frame into an [`RgbaImage`] (screenshots, tests).
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
    }

    pub(crate) fn write_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let Some(byte_offset) = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
            .and_then(|pixel| pixel.checked_mul(4))
        else {
            return;
        };
        let Some(end) = byte_offset.checked_add(4) else {
            return;
        };
        if end > self.rgba.len() {
            return;
        }
        self.rgba[byte_offset..end].copy_from_slice(&color);
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexturedVertex {
    pub position: Vec2,
    pub uv: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        for point in &points[1..] {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        Some(Self {
            left: min.x.floor() as i32,
            top: min.y.floor() as i32,
            right: max.x.ceil() as i32,
            bottom: max.y.ceil() as i32,
        })
    }

    pub fn intersects_viewport(&self, viewport: Viewport) -> bool {
        !(self.right < 0
            || self.bottom < 0
            || self.left >= viewport.width as i32
            || self.top >= viewport.height as i32)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// Fills a triangle with nearest-sampled, perspective-free UV interpolation.
pub fn fill_textured_triangle(
    frame: &mut FrameBuffer,
    vertices: [TexturedVertex; 3],
    texture: &Texture,
) {
    if texture.is_empty() {
        return;
    }
    let [a, b, c] = vertices;
    let area = edge(a.position, b.position, c.position);
    if area.abs() <= f32::EPSILON {
        return;
    }
    let Some(rect) = ScreenRect::from_points(&[a.position, b.position, c.position]) else {
        return;
    };
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.right.min(frame.width() as i32);
    let bottom = rect.bottom.min(frame.height() as i32);

    for y in top..bottom {
        for x in left..right {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b.position, c.position, p) / area;
            let w1 = edge(c.position, a.position, p) / area;
            let w2 = edge(a.position, b.position, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let u = w0 * a.uv.x + w1 * b.uv.x + w2 * c.uv.x;
            let v = w0 * a.uv.y + w1 * b.uv.y + w2 * c.uv.y;
            let texel = texture.sample_uv(u, v);
            if texel[3] == 0 {
                continue;
            }
            frame.write_pixel(x, y, texel);
        }
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpriteStyle {
    pub scale: f32,
    pub mirror: bool,
    pub tint: Option<[u8; 4]>,
    pub lighten: f32,
}

fn normalized_sprite_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

pub fn scaled_sprite_dimensions(texture: &Texture, scale: f32) -> (u32, u32) {
    let scale = normalized_sprite_scale(scale);
    let width = (texture.width() as f32 * scale).round().max(1.0) as u32;
    let height = (texture.height() as f32 * scale).round().max(1.0) as u32;
    (width, height)
}

/// Draws `texture` with its top-left corner at `(left, top)`.
pub fn draw_sprite(
    frame: &mut FrameBuffer,
    left: i32,
    top: i32,
    texture: &Texture,
    style: SpriteStyle,
) {
    if texture.is_empty() || frame.width() == 0 || frame.height() == 0 {
        return;
    }
    let scale = normalized_sprite_scale(style.scale);
    let inv_scale = scale.recip();
    let (scaled_w, scaled_h) = scaled_sprite_dimensions(texture, scale);
    let right = left + scaled_w as i32;
    let bottom = top + scaled_h as i32;

    let draw_left = left.max(0);
    let draw_top = top.max(0);
    let draw_right = right.min(frame.width() as i32);
    let draw_bottom = bottom.min(frame.height() as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    for out_y in draw_top..draw_bottom {
        let src_y = (((out_y - top) as f32) * inv_scale).floor() as u32;
        for out_x in draw_left..draw_right {
            let dx = if style.mirror {
                right - 1 - out_x
            } else {
                out_x - left
            };
            let src_x = ((dx as f32) * inv_scale).floor() as u32;
            let texel = texture.sample(src_x, src_y);
            if texel[3] == 0 {
                continue;
            }
            frame.write_pixel(out_x, out_y, shade(texel, style));
        }
    }
}

fn shade(texel: [u8; 4], style: SpriteStyle) -> [u8; 4] {
    let mut out = texel;
    if let Some(tint) = style.tint {
        for channel in 0..3 {
            out[channel] = ((out[channel] as u16 * tint[channel] as u16) / 255) as u8;
        }
    }
    if style.lighten > 0.0 {
        let amount = style.lighten.clamp(0.0, 1.0);
        for channel in out.iter_mut().take(3) {
            let value = *channel as f32;
            *channel = (value + (255.0 - value) * amount).round() as u8;
        }
    }
    out
}

pub fn draw_square(frame: &mut FrameBuffer, cx: i32, cy: i32, half_size: i32, color: [u8; 4]) {
    for y in (cy - half_size)..=(cy + half_size) {
        for x in (cx - half_size)..=(cx + half_size) {
            frame.write_pixel(x, y, color);
        }
    }
}

pub fn draw_rect_outline(frame: &mut FrameBuffer, rect: ScreenRect, color: [u8; 4]) {
    for x in rect.left..rect.right {
        frame.write_pixel(x, rect.top, color);
        frame.write_pixel(x, rect.bottom - 1, color);
    }
    for y in rect.top..rect.bottom {
        frame.write_pixel(rect.left, y, color);
        frame.write_pixel(rect.right - 1, y, color);
    }
}

pub fn draw_line(frame: &mut FrameBuffer, from: Vec2, to: Vec2, color: [u8; 4]) {
    let mut x0 = from.x.round() as i32;
    let mut y0 = from.y.round() as i32;
    let x1 = to.x.round() as i32;
    let y1 = to.y.round() as i32;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let max_steps = (dx - dy + 1).min(1 << 16);

    for _ in 0..max_steps {
        frame.write_pixel(x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x0 += sx;
        }
        if doubled <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32) -> FrameBuffer {
        let mut frame = FrameBuffer::new(Viewport::new(width, height)).expect("frame");
        frame.clear([0, 0, 0, 255]);
        frame
    }

    #[test]
    fn write_pixel_ignores_out_of_range_coordinates() {
        let mut frame = frame(4, 4);
        frame.write_pixel(-1, 0, [255; 4]);
        frame.write_pixel(4, 0, [255; 4]);
        frame.write_pixel(0, 9, [255; 4]);
        assert!(frame.as_bytes().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn zero_sized_frame_is_allowed() {
        let frame = FrameBuffer::new(Viewport::new(0, 0)).expect("frame");
        assert!(frame.as_bytes().is_empty());
        assert_eq!(frame.pixel(0, 0), None);
    }

    #[test]
    fn textured_triangle_covers_interior_only() {
        let mut frame = frame(16, 16);
        let texture = Texture::solid(2, 2, [200, 10, 10, 255]);
        fill_textured_triangle(
            &mut frame,
            [
                TexturedVertex {
                    position: Vec2::new(0.0, 0.0),
                    uv: Vec2::new(0.0, 0.0),
                },
                TexturedVertex {
                    position: Vec2::new(16.0, 0.0),
                    uv: Vec2::new(1.0, 0.0),
                },
                TexturedVertex {
                    position: Vec2::new(0.0, 16.0),
                    uv: Vec2::new(0.0, 1.0),
                },
            ],
            &texture,
        );
        assert_eq!(frame.pixel(2, 2), Some([200, 10, 10, 255]));
        assert_eq!(frame.pixel(14, 14), Some([0, 0, 0, 255]));
    }

    #[test]
    fn triangle_winding_does_not_matter() {
        let texture = Texture::solid(1, 1, [9, 9, 9, 255]);
        let a = TexturedVertex {
            position: Vec2::new(1.0, 1.0),
            uv: Vec2::ZERO,
        };
        let b = TexturedVertex {
            position: Vec2::new(9.0, 1.0),
            uv: Vec2::ZERO,
        };
        let c = TexturedVertex {
            position: Vec2::new(1.0, 9.0),
            uv: Vec2::ZERO,
        };
        let mut clockwise = frame(10, 10);
        let mut counter = frame(10, 10);
        fill_textured_triangle(&mut clockwise, [a, b, c], &texture);
        fill_textured_triangle(&mut counter, [a, c, b], &texture);
        assert_eq!(clockwise.as_bytes(), counter.as_bytes());
    }

    #[test]
    fn mirrored_sprite_flips_columns() {
        let mut image = RgbaImage::from_pixel(2, 1, image::Rgba([0, 0, 255, 255]));
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        let texture = Texture::from_image(image);

        let mut plain = frame(2, 1);
        draw_sprite(
            &mut plain,
            0,
            0,
            &texture,
            SpriteStyle {
                scale: 1.0,
                ..SpriteStyle::default()
            },
        );
        assert_eq!(plain.pixel(0, 0), Some([255, 0, 0, 255]));

        let mut mirrored = frame(2, 1);
        draw_sprite(
            &mut mirrored,
            0,
            0,
            &texture,
            SpriteStyle {
                scale: 1.0,
                mirror: true,
                ..SpriteStyle::default()
            },
        );
        assert_eq!(mirrored.pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(mirrored.pixel(1, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn tint_multiplies_channels() {
        let texel = shade(
            [200, 100, 50, 255],
            SpriteStyle {
                tint: Some([255, 0, 128, 255]),
                ..SpriteStyle::default()
            },
        );
        assert_eq!(texel, [200, 0, 25, 255]);
    }

    #[test]
    fn scaled_dimensions_multiply_native_size() {
        let texture = Texture::solid(10, 4, [1; 4]);
        assert_eq!(scaled_sprite_dimensions(&texture, 2.0), (20, 8));
        assert_eq!(scaled_sprite_dimensions(&texture, f32::NAN), (10, 4));
        assert_eq!(scaled_sprite_dimensions(&texture, 0.01), (1, 1));
    }

    #[test]
    fn line_reaches_both_endpoints() {
        let mut frame = frame(8, 8);
        draw_line(&mut frame, Vec2::new(1.0, 6.0), Vec2::new(6.0, 2.0), [255; 4]);
        assert_eq!(frame.pixel(1, 6), Some([255; 4]));
        assert_eq!(frame.pixel(6, 2), Some([255; 4]));
    }

    #[test]
    fn screen_rect_viewport_intersection() {
        let viewport = Viewport::new(100, 100);
        let inside = ScreenRect::from_points(&[Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0)])
            .expect("rect");
        let outside = ScreenRect::from_points(&[Vec2::new(-30.0, 10.0), Vec2::new(-5.0, 20.0)])
            .expect("rect");
        assert!(inside.intersects_viewport(viewport));
        assert!(!outside.intersects_viewport(viewport));
        assert!(inside.contains(10, 19));
        assert!(!inside.contains(20, 20));
    }
}
