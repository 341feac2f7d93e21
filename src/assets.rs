//! Surface image lookup
//!
//! The renderer asks for an image by (biome, surface kind, positional seed)
//! and gets `None` whenever nothing is loaded yet; it never waits. The
//! `TextureCache` here is one provider: images loaded from
//! `assets/textures/<biome>/<surface>*.png` (entity billboards from
//! `enemy*.png`, `item*.png` and `hazard*.png` in the same directory), or
//! generated procedurally.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use crate::config::ThemeTable;
use crate::rasterizer::{Color, Texture};
use crate::view::EntityKind;

/// Which family of images a surface draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Floor,
    Ceiling,
    Wall,
    Door,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 4] = [
        SurfaceKind::Floor,
        SurfaceKind::Ceiling,
        SurfaceKind::Wall,
        SurfaceKind::Door,
    ];

    /// File name prefix in a biome directory
    pub fn file_prefix(&self) -> &'static str {
        match self {
            SurfaceKind::Floor => "floor",
            SurfaceKind::Ceiling => "ceiling",
            SurfaceKind::Wall => "wall",
            SurfaceKind::Door => "door",
        }
    }

    pub fn from_file_stem(stem: &str) -> Option<SurfaceKind> {
        let stem = stem.to_ascii_lowercase();
        SurfaceKind::ALL
            .into_iter()
            .find(|k| stem.starts_with(k.file_prefix()))
    }
}

/// Entity kind named by a sprite file stem (`enemy_01.png` and so on)
pub fn sprite_kind_from_file_stem(stem: &str) -> Option<EntityKind> {
    let stem = stem.to_ascii_lowercase();
    [
        ("enemy", EntityKind::Enemy),
        ("item", EntityKind::Item),
        ("hazard", EntityKind::Hazard),
    ]
    .into_iter()
    .find(|(prefix, _)| stem.starts_with(prefix))
    .map(|(_, kind)| kind)
}

/// Read-only image provider queried during rendering
pub trait SurfaceImages {
    /// Image for a surface, or `None` to use the flat-color fallback.
    /// Must return the same image for the same seed.
    fn surface_variant(&self, biome: &str, surface: SurfaceKind, seed: u32) -> Option<&Texture>;

    /// Billboard image for an entity, if any
    fn sprite(&self, _biome: &str, _kind: EntityKind, _seed: u32) -> Option<&Texture> {
        None
    }
}

/// Provider with nothing loaded; everything renders flat
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl SurfaceImages for NoImages {
    fn surface_variant(&self, _biome: &str, _surface: SurfaceKind, _seed: u32) -> Option<&Texture> {
        None
    }
}

/// Images grouped by (biome, surface kind), variants picked by seed
#[derive(Default)]
pub struct TextureCache {
    surfaces: HashMap<(String, SurfaceKind), Vec<Texture>>,
    sprites: HashMap<(String, EntityKind), Vec<Texture>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, biome: &str, surface: SurfaceKind, texture: Texture) {
        self.surfaces
            .entry((biome.to_string(), surface))
            .or_default()
            .push(texture);
    }

    pub fn insert_sprite(&mut self, biome: &str, kind: EntityKind, texture: Texture) {
        self.sprites
            .entry((biome.to_string(), kind))
            .or_default()
            .push(texture);
    }

    /// Drop every image of a biome; later lookups fall back to flat color
    pub fn invalidate(&mut self, biome: &str) {
        self.surfaces.retain(|(b, _), _| b != biome);
        self.sprites.retain(|(b, _), _| b != biome);
    }

    pub fn variant_count(&self, biome: &str, surface: SurfaceKind) -> usize {
        self.surfaces
            .get(&(biome.to_string(), surface))
            .map_or(0, |v| v.len())
    }

    pub fn len(&self) -> usize {
        self.surfaces.values().map(|v| v.len()).sum::<usize>()
            + self.sprites.values().map(|v| v.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every biome directory under `root`
    pub fn load_directory<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        let mut cache = Self::new();

        let Ok(entries) = std::fs::read_dir(root) else {
            debug!("No texture directory at {}", root.display());
            return cache;
        };

        let mut biome_dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        biome_dirs.sort();

        for dir in biome_dirs {
            let biome = match dir.file_name() {
                Some(name) => name.to_string_lossy().to_string(),
                None => continue,
            };
            cache.load_biome(&biome, &dir);
        }

        debug!("Loaded {} textures from {}", cache.len(), root.display());
        cache
    }

    fn load_biome(&mut self, biome: &str, dir: &Path) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.to_ascii_lowercase() == "png")
                    .unwrap_or(false)
            })
            .collect();
        // Sorted so variant indices, and therefore seeds, are stable
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let surface = SurfaceKind::from_file_stem(&stem);
            let sprite = sprite_kind_from_file_stem(&stem);
            if surface.is_none() && sprite.is_none() {
                continue;
            }
            let tex = match Texture::from_file(&path) {
                Ok(tex) => tex,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };
            match (surface, sprite) {
                (Some(kind), _) => self.insert(biome, kind, tex),
                (None, Some(kind)) => self.insert_sprite(biome, kind, tex),
                (None, None) => {}
            }
        }
    }

    /// Generated brick, flagstone and plank textures for every biome
    pub fn procedural(themes: &ThemeTable) -> Self {
        let mut cache = Self::new();
        for biome in themes.biome_ids() {
            let theme = themes.get(biome);
            for variant in 0..3u32 {
                let seed = variant.wrapping_mul(7919) + 1;
                cache.insert(biome, SurfaceKind::Wall, Texture::bricks(32, theme.wall, theme.wall.shade(0.55), seed));
                cache.insert(biome, SurfaceKind::Floor, Texture::bricks(32, theme.floor, theme.floor.shade(0.6), seed ^ 0x55));
            }
            cache.insert(
                biome,
                SurfaceKind::Ceiling,
                Texture::checkerboard(32, 32, theme.ceiling, theme.ceiling.shade(0.85)),
            );
            cache.insert(biome, SurfaceKind::Door, planks(32, theme.door));
        }
        debug!("Generated {} procedural textures", cache.len());
        cache
    }
}

/// Vertical planks with dark seams
fn planks(size: usize, wood: Color) -> Texture {
    let plank = (size / 4).max(1);
    let mut pixels = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let seam = x % plank == 0;
            let grain = ((y as f32 * 0.7 + (x / plank) as f32 * 3.1).sin() * 0.08) + 0.95;
            pixels.push(if seam { wood.shade(0.45) } else { wood.shade(grain) });
        }
    }
    Texture { width: size, height: size, pixels, name: "planks".to_string() }
}

impl SurfaceImages for TextureCache {
    fn surface_variant(&self, biome: &str, surface: SurfaceKind, seed: u32) -> Option<&Texture> {
        let variants = self.surfaces.get(&(biome.to_string(), surface))?;
        if variants.is_empty() {
            return None;
        }
        variants.get(seed as usize % variants.len())
    }

    fn sprite(&self, biome: &str, kind: EntityKind, seed: u32) -> Option<&Texture> {
        let variants = self.sprites.get(&(biome.to_string(), kind))?;
        if variants.is_empty() {
            return None;
        }
        variants.get(seed as usize % variants.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_selection_is_deterministic() {
        let cache = TextureCache::procedural(&ThemeTable::builtin());
        for seed in [0u32, 1, 2, 99, 12345] {
            let a = cache.surface_variant("crypt", SurfaceKind::Wall, seed).map(|t| t.name.clone());
            let b = cache.surface_variant("crypt", SurfaceKind::Wall, seed).map(|t| t.name.clone());
            assert!(a.is_some());
            assert_eq!(a, b);
        }
        assert_eq!(cache.variant_count("crypt", SurfaceKind::Wall), 3);
    }

    #[test]
    fn test_miss_returns_none() {
        let cache = TextureCache::new();
        assert!(cache.surface_variant("crypt", SurfaceKind::Floor, 4).is_none());
        assert!(NoImages.surface_variant("crypt", SurfaceKind::Floor, 4).is_none());
    }

    #[test]
    fn test_invalidate_drops_biome() {
        let mut cache = TextureCache::procedural(&ThemeTable::builtin());
        cache.invalidate("crypt");
        assert!(cache.surface_variant("crypt", SurfaceKind::Wall, 0).is_none());
        assert!(cache.surface_variant("frost", SurfaceKind::Wall, 0).is_some());
    }

    #[test]
    fn test_surface_kind_from_file_stem() {
        assert_eq!(SurfaceKind::from_file_stem("Wall_02"), Some(SurfaceKind::Wall));
        assert_eq!(SurfaceKind::from_file_stem("ceiling"), Some(SurfaceKind::Ceiling));
        assert_eq!(SurfaceKind::from_file_stem("banner"), None);
    }

    #[test]
    fn test_directory_loads_surfaces_and_sprites() {
        let root = std::env::temp_dir().join(format!("corridor_textures_{}", std::process::id()));
        let biome = root.join("crypt");
        std::fs::create_dir_all(&biome).unwrap();
        let img = image::RgbaImage::from_pixel(4, 8, image::Rgba([200, 40, 40, 255]));
        for name in ["wall_01.png", "enemy_ghoul.png", "notes.png"] {
            img.save(biome.join(name)).unwrap();
        }

        let cache = TextureCache::load_directory(&root);
        let _ = std::fs::remove_dir_all(&root);

        assert_eq!(cache.variant_count("crypt", SurfaceKind::Wall), 1);
        let ghoul = cache.sprite("crypt", EntityKind::Enemy, 7).unwrap();
        assert_eq!((ghoul.width, ghoul.height), (4, 8));
        assert!(cache.sprite("crypt", EntityKind::Item, 7).is_none());
        assert!(cache.sprite("frost", EntityKind::Enemy, 7).is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_sprite_kind_from_file_stem() {
        assert_eq!(sprite_kind_from_file_stem("Enemy_02"), Some(EntityKind::Enemy));
        assert_eq!(sprite_kind_from_file_stem("hazard"), Some(EntityKind::Hazard));
        assert_eq!(sprite_kind_from_file_stem("wall"), None);
    }

    #[test]
    fn test_missing_directory_gives_empty_cache() {
        let cache = TextureCache::load_directory("/definitely/not/here");
        assert!(cache.is_empty());
    }
}
