//! Drawing surface and the software framebuffer behind it
//!
//! The corridor renderer only needs polygon fills, outlines, lines and
//! clipped affine triangle blits. `Canvas` names exactly that; the
//! `Framebuffer` implements it in software.

use super::math::{convex_contains, edge, Affine2, Vec2};
use super::types::{Color, Texture};

/// The 2D primitives the corridor renderer draws with
pub trait Canvas {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Fill a convex polygon; colors with alpha < 255 are blended
    fn fill_polygon(&mut self, points: &[Vec2], color: Color);

    /// One pixel outline of a closed polygon
    fn stroke_polygon(&mut self, points: &[Vec2], color: Color) {
        let n = points.len();
        for i in 0..n {
            self.draw_line(points[i], points[(i + 1) % n], color);
        }
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color);

    /// Draw `image` through `transform` (texture pixels -> screen pixels),
    /// covering `triangle` but never leaving the convex `clip` polygon.
    /// `shade` multiplies the sampled color.
    fn blit_triangle(
        &mut self,
        image: &Texture,
        transform: &Affine2,
        triangle: &[Vec2; 3],
        clip: &[Vec2],
        shade: f32,
    );
}

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&self.pixels[idx..idx + 4]);
            Some(Color::from_bytes(bytes))
        } else {
            None
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&color.to_bytes());
        }
    }

    /// Composite `color` over whatever is already there
    pub fn blend_pixel(&mut self, x: usize, y: usize, color: Color) {
        if color.a == 255 {
            self.set_pixel(x, y, color);
        } else if let Some(dst) = self.get_pixel(x, y) {
            self.set_pixel(x, y, color.over(dst));
        }
    }

    /// Pixel bounds of a point set, clamped to the framebuffer.
    /// `None` when nothing is on screen.
    fn pixel_bounds(&self, points: &[Vec2]) -> Option<(usize, usize, usize, usize)> {
        if points.is_empty() || self.width == 0 || self.height == 0 {
            return None;
        }
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }
        if max_x < 0.0 || max_y < 0.0 || min_x >= self.width as f32 || min_y >= self.height as f32 {
            return None;
        }
        let x0 = min_x.max(0.0).floor() as usize;
        let y0 = min_y.max(0.0).floor() as usize;
        let x1 = (max_x.ceil() as usize).min(self.width);
        let y1 = (max_y.ceil() as usize).min(self.height);
        Some((x0, y0, x1, y1))
    }
}

/// Inclusive point-in-triangle test for either winding
fn triangle_contains(tri: &[Vec2; 3], p: Vec2) -> bool {
    const ERR: f32 = -0.0001;
    let w0 = edge(tri[1], tri[2], p);
    let w1 = edge(tri[2], tri[0], p);
    let w2 = edge(tri[0], tri[1], p);
    (w0 >= ERR && w1 >= ERR && w2 >= ERR) || (w0 <= -ERR && w1 <= -ERR && w2 <= -ERR)
}

impl Canvas for Framebuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        if points.len() < 3 || color.a == 0 {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(points) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if convex_contains(points, p) {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Bresenham line
    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color) {
        if !(from.x.is_finite() && from.y.is_finite() && to.x.is_finite() && to.y.is_finite()) {
            return;
        }
        let (x0, y0) = (from.x.round() as i32, from.y.round() as i32);
        let (x1, y1) = (to.x.round() as i32, to.y.round() as i32);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut x = x0;
        let mut y = y0;

        loop {
            if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
                self.blend_pixel(x as usize, y as usize, color);
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn blit_triangle(
        &mut self,
        image: &Texture,
        transform: &Affine2,
        triangle: &[Vec2; 3],
        clip: &[Vec2],
        shade: f32,
    ) {
        if image.is_empty() {
            return;
        }
        // Screen -> texture, one inversion per triangle
        let Some(inverse) = transform.inverse() else {
            return;
        };
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(triangle) else {
            return;
        };

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if !triangle_contains(triangle, p) || !convex_contains(clip, p) {
                    continue;
                }
                let uv = inverse.apply(p);
                let texel = image.texel(uv.x, uv.y);
                if texel.a == 0 {
                    continue;
                }
                self.blend_pixel(x, y, texel.shade(shade));
            }
        }
    }
}
