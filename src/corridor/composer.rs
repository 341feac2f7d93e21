//! Surface composer
//!
//! Draws one planned surface: textured through the slicer when an image is
//! available and the surface is not lost in fog, otherwise a flat palette
//! fill. Decor goes on top, then a banded fog overlay.

use crate::assets::{SurfaceImages, SurfaceKind};
use crate::config::{BiomeTheme, RenderSettings};
use crate::rasterizer::{Canvas, Color, Vec2};
use crate::view::EntityKind;
use super::decor::{ceiling_cobweb, torch_flicker, wall_decor, DecorKind, DecorMark};
use super::entities::PlacedEntity;
use super::projection::{depth_fade, fog_amount, Viewport, FOG_SKIP_THRESHOLD};
use super::slicer::{
    axis_extent, draw_textured_quad, slice_boundaries, slice_count, DepthRange, ScreenQuad,
    TexMapping,
};

/// Upper bound on fog overlay bands per surface
const MAX_FOG_BANDS: usize = 16;
/// Overlay alpha below this is not worth a fill
const MIN_FOG_ALPHA: f32 = 0.004;
/// How far the viewer's own torch reaches, in tiles
const HAND_TORCH_REACH: f32 = 4.0;

const ENEMY_COLOR: Color = Color::new(150, 40, 40);
const ITEM_COLOR: Color = Color::new(220, 190, 60);
const HAZARD_COLOR: Color = Color::new(90, 160, 60);

/// Where a surface sits in the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Floor,
    Ceiling,
    LeftWall,
    RightWall,
    /// Faces the viewer: end walls and the front of interior blocks
    Front,
}

/// One surface ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDraw {
    pub facet: Facet,
    pub kind: SurfaceKind,
    pub quad: ScreenQuad,
    pub depths: DepthRange,
    pub mapping: TexMapping,
    /// Picks the image variant
    pub seed: u32,
    /// One decor seed per tile along the surface, near to far (or left to
    /// right for front faces)
    pub tile_seeds: Vec<u32>,
}

/// A wall sconce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorchDraw {
    pub depth: f32,
    /// Bracket position on screen
    pub position: Vec2,
    /// Wall span at the torch, sizes everything else
    pub scale: f32,
    pub seed: u32,
}

/// Per-frame inputs shared by every draw call
pub struct RenderContext<'a> {
    pub viewport: Viewport,
    pub theme: &'a BiomeTheme,
    pub settings: &'a RenderSettings,
    pub images: &'a dyn SurfaceImages,
    pub time: f32,
}

impl<'a> RenderContext<'a> {
    /// Light multiplier at a world depth
    pub fn light(&self, depth: f32) -> f32 {
        let flicker = torch_flicker(0, self.time, self.settings.enable_animations);
        let reach = (1.0 - depth / HAND_TORCH_REACH).max(0.0);
        let torch = 1.0 + self.settings.torch_intensity * 0.35 * reach * flicker;
        depth_fade(depth) * self.settings.brightness * torch
    }

    pub fn fog(&self, depth: f32) -> f32 {
        fog_amount(depth, self.settings.fog_density)
    }

    fn base_color(&self, kind: SurfaceKind) -> Color {
        match kind {
            SurfaceKind::Floor => self.theme.floor,
            SurfaceKind::Ceiling => self.theme.ceiling,
            SurfaceKind::Wall => self.theme.wall,
            SurfaceKind::Door => self.theme.door,
        }
    }
}

/// How a surface ended up on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOutcome {
    /// Drawn through the slicer with this many triangles
    Textured(usize),
    /// No image available
    Flat,
    /// Too deep in fog for texture work
    Fogged,
    /// Nothing visible on screen
    Skipped,
}

/// Draw one surface with fallback, decor and fog
pub fn draw_surface<C: Canvas + ?Sized>(
    canvas: &mut C,
    surface: &SurfaceDraw,
    ctx: &RenderContext,
) -> SurfaceOutcome {
    if surface.quad.is_degenerate() {
        return SurfaceOutcome::Skipped;
    }

    let depths = surface.depths;
    let base = ctx.base_color(surface.kind);
    let outline = surface.quad.outline();

    let outcome = if ctx.fog(depths.near) > FOG_SKIP_THRESHOLD {
        canvas.fill_polygon(&outline, base.shade(ctx.light(depths.mid())));
        SurfaceOutcome::Fogged
    } else {
        let image = ctx
            .images
            .surface_variant(&ctx.settings.biome, surface.kind, surface.seed);
        let drawn = image.map_or(0, |image| {
            draw_textured_quad(canvas, &surface.quad, depths, &surface.mapping, image, |d| {
                ctx.light(d)
            })
        });
        if drawn > 0 {
            SurfaceOutcome::Textured(drawn)
        } else {
            let light = ctx.light(depths.mid());
            canvas.fill_polygon(&outline, base.shade(light));
            canvas.stroke_polygon(&outline, base.shade(light * 0.7));
            SurfaceOutcome::Flat
        }
    };

    if outcome != SurfaceOutcome::Fogged {
        draw_decor(canvas, surface, ctx);
        if surface.kind == SurfaceKind::Door {
            draw_door_frame(canvas, surface, ctx);
        }
    }
    draw_fog_overlay(canvas, surface, ctx);

    outcome
}

/// Map a tile-local decor point onto the surface
fn decor_point(surface: &SurfaceDraw, tile: usize, local: Vec2) -> Vec2 {
    let tiles = surface.tile_seeds.len().max(1) as f32;
    let along = (tile as f32 + local.x) / tiles;
    let screen = surface.depths.screen_fraction(along);
    surface.quad.point_at(screen, local.y)
}

fn draw_decor<C: Canvas + ?Sized>(canvas: &mut C, surface: &SurfaceDraw, ctx: &RenderContext) {
    let marks_for = |seed: u32| -> Vec<DecorMark> {
        match (surface.facet, surface.kind) {
            (Facet::Ceiling, _) => ceiling_cobweb(seed),
            (Facet::Floor, _) | (_, SurfaceKind::Door) => Vec::new(),
            _ => wall_decor(seed),
        }
    };

    for (tile, seed) in surface.tile_seeds.iter().enumerate() {
        let marks = marks_for(*seed);
        if marks.is_empty() {
            continue;
        }
        let depth = if surface.depths.is_flat() {
            surface.depths.near
        } else {
            surface.depths.near + tile as f32 + 0.5
        };
        let light = ctx.light(depth);

        for mark in marks {
            let color = match mark.kind {
                DecorKind::Crack => ctx.theme.wall.shade(0.45 * light),
                DecorKind::Moss => ctx.theme.accent.shade(light),
                DecorKind::Cobweb => Color::with_alpha(200, 200, 200, 255).shade(light).with_opacity(0.5),
            };
            let from = decor_point(surface, tile, mark.from);
            let to = decor_point(surface, tile, mark.to);
            canvas.draw_line(from, to, color);
        }
    }
}

fn draw_door_frame<C: Canvas + ?Sized>(canvas: &mut C, surface: &SurfaceDraw, ctx: &RenderContext) {
    let frame = [
        surface.quad.point_at(0.1, 0.08),
        surface.quad.point_at(0.9, 0.08),
        surface.quad.point_at(0.9, 1.0),
        surface.quad.point_at(0.1, 1.0),
    ];
    let light = ctx.light(surface.depths.mid());
    canvas.stroke_polygon(&frame, ctx.theme.door.shade(0.4 * light));

    let handle = surface.quad.point_at(0.78, 0.55);
    canvas.draw_line(handle, handle + Vec2::new(0.0, 1.0), ctx.theme.light.shade(light));
}

/// Fog as bands along the depth axis, each at the fog of its mid depth
fn draw_fog_overlay<C: Canvas + ?Sized>(canvas: &mut C, surface: &SurfaceDraw, ctx: &RenderContext) {
    let bands = slice_count(axis_extent(&surface.quad, surface.mapping.axis), surface.depths)
        .min(MAX_FOG_BANDS);
    let bounds = slice_boundaries(&surface.quad, surface.depths, surface.mapping.axis, bands);

    for pair in bounds.windows(2) {
        let alpha = ctx.fog((pair[0].depth + pair[1].depth) * 0.5);
        if alpha < MIN_FOG_ALPHA {
            continue;
        }
        let band = [pair[0].left_point, pair[0].right_point, pair[1].right_point, pair[1].left_point];
        canvas.fill_polygon(&band, ctx.theme.fog.with_opacity(alpha));
    }
}

/// Regular polygon approximating a circle
fn disc(centre: Vec2, radius: f32, sides: usize) -> Vec<Vec2> {
    (0..sides)
        .map(|i| {
            let a = i as f32 / sides as f32 * std::f32::consts::TAU;
            centre + Vec2::new(a.cos(), a.sin()) * radius
        })
        .collect()
}

/// Bracket, flame and glow of a wall torch
pub fn draw_torch<C: Canvas + ?Sized>(canvas: &mut C, torch: &TorchDraw, ctx: &RenderContext) {
    let fog = ctx.fog(torch.depth);
    if fog > FOG_SKIP_THRESHOLD {
        return;
    }
    let flicker = torch_flicker(torch.seed, ctx.time, ctx.settings.enable_animations);
    let s = torch.scale;
    let p = torch.position;

    let glow = ctx.settings.torch_intensity * 0.35 * flicker * (1.0 - fog);
    if glow > MIN_FOG_ALPHA {
        canvas.fill_polygon(&disc(p - Vec2::new(0.0, s * 0.08), s * 0.22, 12), ctx.theme.light.with_opacity(glow));
    }

    let bracket = [
        p + Vec2::new(-s * 0.015, 0.0),
        p + Vec2::new(s * 0.015, 0.0),
        p + Vec2::new(s * 0.015, s * 0.09),
        p + Vec2::new(-s * 0.015, s * 0.09),
    ];
    canvas.fill_polygon(&bracket, ctx.theme.wall.shade(0.3));

    let flame_height = s * 0.09 * flicker;
    let flame = [
        p + Vec2::new(-s * 0.025, 0.0),
        p + Vec2::new(0.0, -flame_height),
        p + Vec2::new(s * 0.025, 0.0),
    ];
    canvas.fill_polygon(&flame, ctx.theme.light.mix(ctx.theme.fog, fog));
}

fn entity_color(kind: EntityKind) -> Color {
    match kind {
        EntityKind::Enemy => ENEMY_COLOR,
        EntityKind::Item => ITEM_COLOR,
        EntityKind::Hazard => HAZARD_COLOR,
    }
}

/// Billboard sprite when an image exists, otherwise a simple shape
pub fn draw_entity<C: Canvas + ?Sized>(canvas: &mut C, entity: &PlacedEntity, ctx: &RenderContext) {
    let depth = entity.stand_depth();
    let fog = ctx.fog(depth);
    if fog > FOG_SKIP_THRESHOLD || entity.size < 1.0 {
        return;
    }
    let light = ctx.light(depth) * (1.0 - fog);
    let (x, y, s) = (entity.screen_x, entity.ground_y, entity.size);

    if let Some(sprite) = ctx.images.sprite(&ctx.settings.biome, entity.kind, entity.id) {
        let half = s * sprite.width as f32 / sprite.height.max(1) as f32 * 0.5;
        let quad = ScreenQuad::wall(
            Vec2::new(x - half, y - s),
            Vec2::new(x + half, y - s),
            Vec2::new(x + half, y),
            Vec2::new(x - half, y),
        );
        let mapping = TexMapping::new(super::slicer::SliceAxis::Horizontal);
        if draw_textured_quad(canvas, &quad, DepthRange::flat(depth), &mapping, sprite, |_| light) > 0 {
            return;
        }
    }

    let color = entity_color(entity.kind).shade(light).mix(ctx.theme.fog, fog);
    match entity.kind {
        EntityKind::Enemy => {
            let body: Vec<Vec2> = disc(Vec2::new(x, y - s * 0.5), s * 0.5, 10)
                .into_iter()
                .map(|p| Vec2::new(x + (p.x - x) * 0.5, p.y))
                .collect();
            canvas.fill_polygon(&body, color);
            let eye = ctx.theme.light.mix(ctx.theme.fog, fog);
            for dx in [-0.07, 0.07] {
                let c = Vec2::new(x + s * dx, y - s * 0.72);
                canvas.fill_polygon(&disc(c, (s * 0.03).max(0.75), 6), eye);
            }
        }
        EntityKind::Item => {
            let diamond = [
                Vec2::new(x, y - s),
                Vec2::new(x + s * 0.35, y - s * 0.5),
                Vec2::new(x, y),
                Vec2::new(x - s * 0.35, y - s * 0.5),
            ];
            canvas.fill_polygon(&diamond, color);
        }
        EntityKind::Hazard => {
            for i in -1i32..=1 {
                let cx = x + i as f32 * s * 0.6;
                let spike = [
                    Vec2::new(cx - s * 0.3, y),
                    Vec2::new(cx, y - s),
                    Vec2::new(cx + s * 0.3, y),
                ];
                canvas.fill_polygon(&spike, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{NoImages, TextureCache};
    use crate::config::ThemeTable;
    use crate::corridor::entities::place_entities;
    use crate::corridor::projection::project;
    use crate::corridor::slicer::SliceAxis;
    use crate::corridor::testing::RecordingCanvas;
    use crate::rasterizer::Texture;
    use crate::view::Entity;

    fn floor_surface(depth: f32) -> SurfaceDraw {
        let p = |d: f32, l: f32| project(500.0, 400.0, d, l).bottom();
        SurfaceDraw {
            facet: Facet::Floor,
            kind: SurfaceKind::Floor,
            quad: ScreenQuad::floor(p(depth, -0.5), p(depth, 0.5), p(depth + 1.0, -0.5), p(depth + 1.0, 0.5)),
            depths: DepthRange::new(depth, depth + 1.0),
            mapping: TexMapping::new(SliceAxis::Vertical),
            seed: 3,
            tile_seeds: vec![3],
        }
    }

    fn run<S: SurfaceImages>(surface: &SurfaceDraw, settings: &RenderSettings, images: &S) -> (SurfaceOutcome, RecordingCanvas) {
        let theme = ThemeTable::builtin().get("crypt");
        let ctx = RenderContext {
            viewport: Viewport::new(500.0, 400.0),
            theme: &theme,
            settings,
            images,
            time: 0.0,
        };
        let mut canvas = RecordingCanvas::new(500, 400);
        let outcome = draw_surface(&mut canvas, surface, &ctx);
        (outcome, canvas)
    }

    #[test]
    fn test_missing_image_falls_back_to_flat() {
        let (outcome, canvas) = run(&floor_surface(1.0), &RenderSettings::default(), &NoImages);
        assert_eq!(outcome, SurfaceOutcome::Flat);
        assert_eq!(canvas.blits, 0);
        assert!(canvas.fills >= 1);
        assert!(canvas.lines >= 4);
    }

    #[test]
    fn test_image_is_sliced() {
        let cache = TextureCache::procedural(&ThemeTable::builtin());
        let (outcome, canvas) = run(&floor_surface(1.0), &RenderSettings::default(), &cache);
        match outcome {
            SurfaceOutcome::Textured(n) => assert_eq!(canvas.blits, n),
            other => panic!("expected textured, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_fog_skips_texture_work() {
        let cache = TextureCache::procedural(&ThemeTable::builtin());
        let settings = RenderSettings { fog_density: 8.0, ..RenderSettings::default() };
        let (outcome, canvas) = run(&floor_surface(5.0), &settings, &cache);
        assert_eq!(outcome, SurfaceOutcome::Fogged);
        assert_eq!(canvas.blits, 0);
    }

    #[test]
    fn test_zero_fog_adds_no_overlay() {
        let settings = RenderSettings { fog_density: 0.0, ..RenderSettings::default() };
        let (_, canvas) = run(&floor_surface(2.0), &settings, &NoImages);
        // Only the flat fill itself
        assert_eq!(canvas.fills, 1);
    }

    #[test]
    fn test_degenerate_surface_is_skipped() {
        let mut surface = floor_surface(1.0);
        let p = Vec2::new(10.0, 10.0);
        surface.quad = ScreenQuad::floor(p, p, p, p);
        let (outcome, canvas) = run(&surface, &RenderSettings::default(), &NoImages);
        assert_eq!(outcome, SurfaceOutcome::Skipped);
        assert_eq!(canvas.fills + canvas.blits + canvas.lines, 0);
    }

    fn door_surface(kind: SurfaceKind) -> SurfaceDraw {
        let l = project(500.0, 400.0, 2.0, -0.5);
        let r = project(500.0, 400.0, 2.0, 0.5);
        SurfaceDraw {
            facet: Facet::Front,
            kind,
            quad: ScreenQuad::wall(l.top(), r.top(), r.bottom(), l.bottom()),
            depths: DepthRange::flat(2.0),
            mapping: TexMapping::new(SliceAxis::Horizontal),
            seed: 5,
            tile_seeds: vec![5],
        }
    }

    #[test]
    fn test_door_gets_frame_and_handle() {
        let settings = RenderSettings { fog_density: 0.0, ..RenderSettings::default() };
        let (outcome, door) = run(&door_surface(SurfaceKind::Door), &settings, &NoImages);
        assert_eq!(outcome, SurfaceOutcome::Flat);
        // Outline, frame and handle; doors carry no decor
        assert_eq!(door.lines, 4 + 4 + 1);

        let (_, wall) = run(&door_surface(SurfaceKind::Wall), &settings, &NoImages);
        assert_ne!(door.fill_colors[0], wall.fill_colors[0]);
    }

    #[test]
    fn test_torch_intensity_lights_near_surfaces_only() {
        let dark = RenderSettings {
            torch_intensity: 0.0,
            fog_density: 0.0,
            enable_animations: false,
            ..RenderSettings::default()
        };
        let lit = RenderSettings { torch_intensity: 1.0, ..dark.clone() };
        let sum = |c: Color| c.r as u32 + c.g as u32 + c.b as u32;

        let (_, a) = run(&floor_surface(1.0), &dark, &NoImages);
        let (_, b) = run(&floor_surface(1.0), &lit, &NoImages);
        assert!(sum(b.fill_colors[0]) > sum(a.fill_colors[0]));

        // Past the hand torch's reach intensity changes nothing
        let (_, a) = run(&floor_surface(5.0), &dark, &NoImages);
        let (_, b) = run(&floor_surface(5.0), &lit, &NoImages);
        assert_eq!(a.fill_colors[0], b.fill_colors[0]);
    }

    fn torch_at(depth: f32) -> TorchDraw {
        let p = project(500.0, 400.0, depth, -1.5);
        TorchDraw {
            depth,
            position: Vec2::new(p.anchor_x, p.wall_top + p.wall_span() * 0.38),
            scale: p.wall_span(),
            seed: 9,
        }
    }

    fn run_torch(torch: &TorchDraw, settings: &RenderSettings) -> RecordingCanvas {
        let theme = ThemeTable::builtin().get("crypt");
        let ctx = RenderContext {
            viewport: Viewport::new(500.0, 400.0),
            theme: &theme,
            settings,
            images: &NoImages,
            time: 0.0,
        };
        let mut canvas = RecordingCanvas::new(500, 400);
        draw_torch(&mut canvas, torch, &ctx);
        canvas
    }

    #[test]
    fn test_torch_in_deep_fog_draws_nothing() {
        let settings = RenderSettings { fog_density: 8.0, ..RenderSettings::default() };
        let canvas = run_torch(&torch_at(6.5), &settings);
        assert_eq!(canvas.fills + canvas.lines + canvas.blits, 0);
    }

    #[test]
    fn test_torch_glow_follows_intensity() {
        // Bracket and flame always, glow only when lit
        let unlit = RenderSettings { torch_intensity: 0.0, ..RenderSettings::default() };
        assert_eq!(run_torch(&torch_at(1.5), &unlit).fills, 2);
        assert_eq!(run_torch(&torch_at(1.5), &RenderSettings::default()).fills, 3);
    }

    #[test]
    fn test_entity_sprite_is_blitted() {
        let mut cache = TextureCache::new();
        cache.insert_sprite(
            "crypt",
            EntityKind::Enemy,
            Texture::checkerboard(8, 16, Color::new(200, 30, 30), Color::new(30, 30, 30)),
        );
        let entities = [
            Entity::new(1, EntityKind::Enemy, 2, 0.0),
            Entity::new(2, EntityKind::Item, 2, 1.0),
        ];
        let placed = place_entities(&entities, Viewport::new(500.0, 400.0), None);
        let theme = ThemeTable::builtin().get("crypt");
        let settings = RenderSettings::default();
        let ctx = RenderContext {
            viewport: Viewport::new(500.0, 400.0),
            theme: &theme,
            settings: &settings,
            images: &cache,
            time: 0.0,
        };

        let enemy = placed.iter().find(|p| p.kind == EntityKind::Enemy).unwrap();
        let mut canvas = RecordingCanvas::new(500, 400);
        draw_entity(&mut canvas, enemy, &ctx);
        assert!(canvas.blits > 0);
        assert_eq!(canvas.fills, 0);

        // No item sprite loaded: falls back to a shape
        let item = placed.iter().find(|p| p.kind == EntityKind::Item).unwrap();
        let mut canvas = RecordingCanvas::new(500, 400);
        draw_entity(&mut canvas, item, &ctx);
        assert_eq!(canvas.blits, 0);
        assert_eq!(canvas.fills, 1);
    }

    #[test]
    fn test_light_respects_brightness() {
        let theme = ThemeTable::builtin().get("crypt");
        let dim = RenderSettings { brightness: 0.5, ..RenderSettings::default() };
        let full = RenderSettings::default();
        fn light_at(theme: &BiomeTheme, settings: &RenderSettings) -> f32 {
            let ctx = RenderContext {
                viewport: Viewport::new(500.0, 400.0),
                theme,
                settings,
                images: &NoImages,
                time: 0.0,
            };
            ctx.light(2.0)
        }
        let a = light_at(&theme, &dim);
        let b = light_at(&theme, &full);
        assert!((a * 2.0 - b).abs() < 1e-5);
    }
}
