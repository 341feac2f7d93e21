//! Core types for the rasterizer

use serde::{Serialize, Deserialize};

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha replaced by `opacity` (0.0-1.0)
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Apply shading (multiply by intensity, saturating above 1.0)
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.max(0.0);
        Self {
            r: (self.r as f32 * i).min(255.0) as u8,
            g: (self.g as f32 * i).min(255.0) as u8,
            b: (self.b as f32 * i).min(255.0) as u8,
            a: self.a,
        }
    }

    /// Linear mix towards `other`; alpha is kept from `self`
    pub fn mix(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let m = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: m(self.r, other.r),
            g: m(self.g, other.g),
            b: m(self.b, other.b),
            a: self.a,
        }
    }

    /// Source-over composite of `self` onto an opaque `dst`
    pub fn over(self, dst: Color) -> Color {
        match self.a {
            255 => self,
            0 => dst,
            a => {
                let t = a as f32 / 255.0;
                Color { a: dst.a, ..dst.mix(self, t) }
            }
        }
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::with_alpha(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// Simple texture (array of colors)
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::WHITE; width * height],
            name: String::new(),
        }
    }

    /// Load texture from an image file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self::from_image(img, name))
    }

    fn from_image(img: image::DynamicImage, name: String) -> Self {
        use image::GenericImageView;

        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();

        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name,
        }
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Staggered brick courses separated by mortar lines
    pub fn bricks(size: usize, brick: Color, mortar: Color, seed: u32) -> Self {
        let course = (size / 4).max(1);
        let brick_w = (size / 2).max(1);
        let mut pixels = Vec::with_capacity(size * size);
        for y in 0..size {
            let row = y / course;
            let stagger = if row % 2 == 0 { 0 } else { brick_w / 2 };
            for x in 0..size {
                let bx = (x + stagger) % brick_w;
                let is_mortar = y % course == 0 || bx == 0;
                let color = if is_mortar {
                    mortar
                } else {
                    let n = crate::corridor::seeded_random(seed ^ ((row * 31 + (x + stagger) / brick_w) as u32));
                    brick.shade(0.85 + n * 0.3)
                };
                pixels.push(color);
            }
        }
        Self { width: size, height: size, pixels, name: format!("bricks_{}", seed) }
    }

    /// True when there is nothing to sample
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.len() < self.width * self.height
    }

    /// Nearest texel at pixel coordinates, wrapping in both axes
    pub fn texel(&self, x: f32, y: f32) -> Color {
        if self.is_empty() {
            return Color::TRANSPARENT;
        }
        let tx = (x.floor() as i64).rem_euclid(self.width as i64) as usize;
        let ty = (y.floor() as i64).rem_euclid(self.height as i64) as usize;
        self.pixels[ty * self.width + tx]
    }

    /// Get pixel at x,y coordinates
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            Color::BLACK
        }
    }
}
