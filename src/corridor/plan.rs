//! Frame planner
//!
//! Turns an analyzed view into an ordered list of draws (painter's
//! algorithm): floors and ceilings far to near, the end wall, merged side
//! walls and their torches, then interior blocks and entities interleaved
//! far to near.

use log::trace;
use crate::assets::{SurfaceImages, SurfaceKind};
use crate::config::{BiomeTheme, RenderSettings};
use crate::rasterizer::{Canvas, Vec2};
use crate::view::{TileKind, View};
use super::analyzer::{analyze, CorridorLayout, FrontWall, Side, WallFragment, WallRun};
use super::composer::{draw_entity, draw_surface, draw_torch, Facet, RenderContext, SurfaceDraw, TorchDraw};
use super::decor::has_torch;
use super::entities::{place_entities, PlacedEntity};
use super::projection::{project_in, Viewport};
use super::slicer::{DepthRange, ScreenQuad, SliceAxis, TexMapping};

/// Torch bracket height as a fraction down the wall
const TORCH_HEIGHT: f32 = 0.38;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem {
    Surface(SurfaceDraw),
    Torch(TorchDraw),
    Entity(PlacedEntity),
}

/// Everything one frame draws, in order
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub layout: CorridorLayout,
    pub items: Vec<DrawItem>,
}

impl FramePlan {
    pub fn build(view: &View, viewport: Viewport) -> Self {
        let layout = analyze(view);
        let mut items = Vec::new();

        // Floors and ceilings, far to near
        let mut open_rows: Vec<_> = layout.open_rows().collect();
        open_rows.sort_by(|a, b| b.depth.cmp(&a.depth));
        for row in open_rows {
            for &lateral in &row.open {
                let seed = view.position_seed(row.depth, lateral);
                items.push(DrawItem::Surface(floor_tile(viewport, row.depth, lateral, seed)));
                items.push(DrawItem::Surface(ceiling_tile(viewport, row.depth, lateral, seed)));
            }
        }

        if let Some(front) = layout.front {
            items.push(DrawItem::Surface(front_wall(view, viewport, &front)));
        }

        // Side walls, far runs first
        let mut runs: Vec<&WallRun> = layout.left_runs.iter().chain(layout.right_runs.iter()).collect();
        runs.sort_by(|a, b| b.start.cmp(&a.start));
        let mut torches = Vec::new();
        for run in runs {
            items.push(DrawItem::Surface(side_wall(view, viewport, run)));
            torches.extend(run_torches(view, viewport, run));
        }
        items.extend(torches.into_iter().map(DrawItem::Torch));

        // Interior blocks and entities, far to near; blocks first on ties
        let cutoff = layout.front.map(|f| f.depth);
        let mut depth_sorted: Vec<(i32, u8, DrawItem)> = Vec::new();
        for fragment in layout.interior() {
            for surface in fragment_faces(view, viewport, fragment) {
                depth_sorted.push((fragment.depth, 0, DrawItem::Surface(surface)));
            }
        }
        for cap in layout.caps() {
            let x = cap.lateral_offset as f32;
            let seed = view.position_seed(cap.depth, cap.lateral_offset);
            let face = front_face(viewport, cap.depth, x - 0.5, x + 0.5, surface_kind(cap.kind), vec![seed]);
            depth_sorted.push((cap.depth, 0, DrawItem::Surface(face)));
        }
        for entity in place_entities(&view.entities, viewport, cutoff) {
            depth_sorted.push((entity.depth, 1, DrawItem::Entity(entity)));
        }
        // Stable sort keeps each block's side face ahead of its front face
        depth_sorted.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        items.extend(depth_sorted.into_iter().map(|(_, _, item)| item));

        trace!(
            "frame plan: {} rows, {} items, front {:?}",
            layout.rows.len(),
            items.len(),
            layout.front.map(|f| f.depth)
        );

        Self { layout, items }
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &SurfaceDraw> {
        self.items.iter().filter_map(|item| match item {
            DrawItem::Surface(s) => Some(s),
            _ => None,
        })
    }

    pub fn surfaces_of(&self, facet: Facet) -> impl Iterator<Item = &SurfaceDraw> {
        self.surfaces().filter(move |s| s.facet == facet)
    }
}

fn surface_kind(kind: TileKind) -> SurfaceKind {
    match kind {
        TileKind::Door => SurfaceKind::Door,
        _ => SurfaceKind::Wall,
    }
}

fn floor_tile(viewport: Viewport, depth: i32, lateral: i32, seed: u32) -> SurfaceDraw {
    let (d, x) = (depth as f32, lateral as f32);
    let p = |d: f32, l: f32| project_in(viewport, d, l).bottom();
    SurfaceDraw {
        facet: Facet::Floor,
        kind: SurfaceKind::Floor,
        quad: ScreenQuad::floor(p(d, x - 0.5), p(d, x + 0.5), p(d + 1.0, x - 0.5), p(d + 1.0, x + 0.5)),
        depths: DepthRange::new(d, d + 1.0),
        // Far edge at the top of the image
        mapping: TexMapping::new(SliceAxis::Vertical).flipped(true, false),
        seed,
        tile_seeds: vec![seed],
    }
}

fn ceiling_tile(viewport: Viewport, depth: i32, lateral: i32, seed: u32) -> SurfaceDraw {
    let (d, x) = (depth as f32, lateral as f32);
    let p = |d: f32, l: f32| project_in(viewport, d, l).top();
    SurfaceDraw {
        facet: Facet::Ceiling,
        kind: SurfaceKind::Ceiling,
        quad: ScreenQuad::floor(p(d, x - 0.5), p(d, x + 0.5), p(d + 1.0, x - 0.5), p(d + 1.0, x + 0.5)),
        depths: DepthRange::new(d, d + 1.0),
        mapping: TexMapping::new(SliceAxis::Vertical),
        seed,
        tile_seeds: vec![seed],
    }
}

/// A flat face at `depth` from lateral `left` to `right`
fn front_face(viewport: Viewport, depth: i32, left: f32, right: f32, kind: SurfaceKind, tile_seeds: Vec<u32>) -> SurfaceDraw {
    let d = depth as f32;
    let l = project_in(viewport, d, left);
    let r = project_in(viewport, d, right);
    SurfaceDraw {
        facet: Facet::Front,
        kind,
        quad: ScreenQuad::wall(l.top(), r.top(), r.bottom(), l.bottom()),
        depths: DepthRange::flat(d),
        mapping: TexMapping::new(SliceAxis::Horizontal).repeated((right - left).max(1.0), 1.0),
        seed: tile_seeds.first().copied().unwrap_or(0),
        tile_seeds,
    }
}

fn front_wall(view: &View, viewport: Viewport, front: &FrontWall) -> SurfaceDraw {
    let first = (front.left_edge + 0.5).round() as i32;
    let last = (front.right_edge - 0.5).round() as i32;
    let seeds = (first..=last).map(|x| view.position_seed(front.depth, x)).collect();
    let mut surface = front_face(viewport, front.depth, front.left_edge, front.right_edge, surface_kind(front.kind), seeds);
    surface.seed = view.position_seed(front.depth, 0);
    surface
}

/// A wall face at lateral `face` running from depth `start` to `end`
fn side_face(viewport: Viewport, side: Side, start: i32, end: i32, face: f32, kind: SurfaceKind, tile_seeds: Vec<u32>) -> SurfaceDraw {
    let (near, far) = (start as f32, end as f32);
    let n = project_in(viewport, near, face);
    let f = project_in(viewport, far, face);
    let facet = match side {
        Side::Left => Facet::LeftWall,
        Side::Right => Facet::RightWall,
    };
    SurfaceDraw {
        facet,
        kind,
        quad: ScreenQuad::wall(n.top(), f.top(), f.bottom(), n.bottom()),
        depths: DepthRange::new(near, far),
        // Right walls read right to left so both sides mirror
        mapping: TexMapping::new(SliceAxis::Horizontal)
            .flipped(side == Side::Right, false)
            .repeated((end - start).max(1) as f32, 1.0),
        seed: tile_seeds.first().copied().unwrap_or(0),
        tile_seeds,
    }
}

/// Lateral of the wall tile behind a run's face
fn run_tile_lateral(run: &WallRun) -> i32 {
    match run.side {
        Side::Left => (run.face - 0.5).round() as i32,
        Side::Right => (run.face + 0.5).round() as i32,
    }
}

fn side_wall(view: &View, viewport: Viewport, run: &WallRun) -> SurfaceDraw {
    let lateral = run_tile_lateral(run);
    let seeds = (run.start..run.end).map(|d| view.position_seed(d, lateral)).collect();
    side_face(viewport, run.side, run.start, run.end, run.face, SurfaceKind::Wall, seeds)
}

fn run_torches(view: &View, viewport: Viewport, run: &WallRun) -> Vec<TorchDraw> {
    let lateral = run_tile_lateral(run);
    (run.start..run.end)
        .filter_map(|d| {
            let seed = view.position_seed(d, lateral);
            if !has_torch(seed) {
                return None;
            }
            let depth = d as f32 + 0.5;
            let p = project_in(viewport, depth, run.face);
            let y = p.wall_top + (p.wall_bottom - p.wall_top) * TORCH_HEIGHT;
            Some(TorchDraw {
                depth,
                position: Vec2::new(p.anchor_x, y),
                scale: p.wall_span(),
                seed,
            })
        })
        .collect()
}

/// Visible faces of an interior block: the side facing the centerline
/// (if any) then the front
fn fragment_faces(view: &View, viewport: Viewport, fragment: &WallFragment) -> Vec<SurfaceDraw> {
    let x = fragment.lateral_offset;
    let seed = view.position_seed(fragment.depth, x);
    let kind = surface_kind(fragment.kind);
    let mut faces = Vec::with_capacity(2);

    if x < 0 {
        faces.push(side_face(viewport, Side::Right, fragment.depth, fragment.depth + 1, x as f32 + 0.5, kind, vec![seed]));
    } else if x > 0 {
        faces.push(side_face(viewport, Side::Left, fragment.depth, fragment.depth + 1, x as f32 - 0.5, kind, vec![seed]));
    }
    faces.push(front_face(viewport, fragment.depth, x as f32 - 0.5, x as f32 + 0.5, kind, vec![seed]));
    faces
}

/// Render a whole view onto `canvas`
pub fn draw_view<C: Canvas + ?Sized>(
    canvas: &mut C,
    viewport: Viewport,
    view: &View,
    theme: &BiomeTheme,
    settings: &RenderSettings,
    images: &dyn SurfaceImages,
    time: f32,
) {
    let ctx = RenderContext { viewport, theme, settings, images, time };

    // Distance colour behind everything; floor half slightly lighter
    let (w, h) = (viewport.width, viewport.height);
    let horizon = viewport.horizon();
    let sky = [Vec2::new(0.0, 0.0), Vec2::new(w, 0.0), Vec2::new(w, horizon), Vec2::new(0.0, horizon)];
    let ground = [Vec2::new(0.0, horizon), Vec2::new(w, horizon), Vec2::new(w, h), Vec2::new(0.0, h)];
    canvas.fill_polygon(&sky, theme.ceiling.mix(theme.fog, 0.85));
    canvas.fill_polygon(&ground, theme.floor.mix(theme.fog, 0.8));

    let plan = FramePlan::build(view, viewport);
    for item in &plan.items {
        match item {
            DrawItem::Surface(surface) => {
                draw_surface(canvas, surface, &ctx);
            }
            DrawItem::Torch(torch) => draw_torch(canvas, torch, &ctx),
            DrawItem::Entity(entity) => draw_entity(canvas, entity, &ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{NoImages, TextureCache};
    use crate::config::ThemeTable;
    use crate::corridor::testing::RecordingCanvas;
    use crate::rasterizer::Framebuffer;
    use crate::view::{Entity, EntityKind, Facing, Row};

    fn view_of(rows: &[&str]) -> View {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(d, s)| Row::from_symbols(d as i32, s))
            .collect();
        View::new(rows, Facing::NORTH)
    }

    fn viewport() -> Viewport {
        Viewport::new(500.0, 400.0)
    }

    #[test]
    fn test_straight_corridor_merges_side_walls() {
        let view = view_of(&["#...#"; 6]);
        let plan = FramePlan::build(&view, viewport());

        let left: Vec<_> = plan.surfaces_of(Facet::LeftWall).collect();
        let right: Vec<_> = plan.surfaces_of(Facet::RightWall).collect();
        assert_eq!(left.len(), 1);
        assert_eq!(right.len(), 1);
        for wall in left.iter().chain(right.iter()) {
            assert_eq!(wall.depths, DepthRange::new(0.0, 6.0));
            assert_eq!(wall.tile_seeds.len(), 6);
        }
        assert_eq!(plan.surfaces_of(Facet::Front).count(), 0);
    }

    #[test]
    fn test_dead_end_draws_one_end_wall() {
        let view = view_of(&["#...#", "#...#", "#...#", "#####", "#...#"]);
        let plan = FramePlan::build(&view, viewport());

        let fronts: Vec<_> = plan.surfaces_of(Facet::Front).collect();
        assert_eq!(fronts.len(), 1);
        assert_eq!(fronts[0].depths, DepthRange::flat(3.0));

        // Spans the full corridor width
        let far_left = project_in(viewport(), 3.0, -2.5).anchor_x;
        let far_right = project_in(viewport(), 3.0, 2.5).anchor_x;
        assert_eq!(fronts[0].quad.near_a.x, far_left);
        assert_eq!(fronts[0].quad.far_a.x, far_right);

        let mut floor_depths: Vec<f32> = plan.surfaces_of(Facet::Floor).map(|s| s.depths.near).collect();
        floor_depths.sort_by(|a, b| a.partial_cmp(b).unwrap());
        floor_depths.dedup();
        assert_eq!(floor_depths, vec![0.0, 1.0, 2.0]);
        assert_eq!(plan.surfaces_of(Facet::Ceiling).count(), 9);

        // Side walls stop at the end wall
        for wall in plan.surfaces_of(Facet::LeftWall) {
            assert!(wall.depths.far <= 3.0);
        }
    }

    #[test]
    fn test_adjacent_floor_tiles_share_exact_edges() {
        let view = view_of(&["#...#"; 4]);
        let plan = FramePlan::build(&view, viewport());
        let floors: Vec<_> = plan.surfaces_of(Facet::Floor).collect();

        // Across: tile x's right edge is tile x+1's left edge
        let mut shared = 0;
        for a in &floors {
            for b in &floors {
                if a.depths == b.depths && a.quad.near_b == b.quad.near_a {
                    assert_eq!(a.quad.far_b, b.quad.far_a);
                    shared += 1;
                }
            }
        }
        assert_eq!(shared, 8);
        // Along depth: tile d's far edge is tile d+1's near edge
        let at = |d: f32| floors.iter().find(|s| s.depths.near == d && s.quad.near_a.x < 250.0 && s.quad.near_b.x > 250.0).copied();
        let (Some(near), Some(far)) = (at(1.0), at(2.0)) else {
            panic!("centre floor tiles missing");
        };
        assert_eq!(near.quad.far_a, far.quad.near_a);
        assert_eq!(near.quad.far_b, far.quad.near_b);
    }

    #[test]
    fn test_pillar_draws_block_faces_not_end_wall() {
        let view = view_of(&["#...#", "#.#.#", "#...#"]);
        let plan = FramePlan::build(&view, viewport());
        assert!(plan.layout.front.is_none());
        // Pillar on the centerline shows only its front face
        assert_eq!(plan.surfaces_of(Facet::Front).count(), 1);
    }

    #[test]
    fn test_off_centre_block_shows_inner_side() {
        let view = view_of(&["#.....#", "#.#...#", "#.....#"]);
        let plan = FramePlan::build(&view, viewport());
        let fronts = plan.surfaces_of(Facet::Front).count();
        let inner = plan
            .surfaces_of(Facet::RightWall)
            .filter(|s| s.depths == DepthRange::new(1.0, 2.0))
            .count();
        assert_eq!(fronts, 1);
        assert_eq!(inner, 1);
    }

    #[test]
    fn test_side_room_back_walls_are_capped() {
        let view = view_of(&["###.###", "#.....#", "###.###", "###.###"]);
        let plan = FramePlan::build(&view, viewport());
        let caps: Vec<_> = plan
            .surfaces_of(Facet::Front)
            .filter(|s| s.depths == DepthRange::flat(2.0))
            .collect();
        assert_eq!(caps.len(), 4);
        // The narrow corridor itself is still one merged wall per side
        assert_eq!(
            plan.surfaces_of(Facet::LeftWall)
                .filter(|s| s.depths == DepthRange::new(2.0, 4.0))
                .count(),
            1
        );
    }

    #[test]
    fn test_torches_sit_on_wall_runs_only() {
        let mut rows = vec!["#...#"; 10];
        rows[3] = "....#";
        rows[8] = "#####";

        let mut seen = 0;
        for origin in 0..40 {
            let view = view_of(&rows).with_origin((origin * 5, origin * 3));
            let plan = FramePlan::build(&view, viewport());
            let torches: Vec<&TorchDraw> = plan
                .items
                .iter()
                .filter_map(|i| match i {
                    DrawItem::Torch(t) => Some(t),
                    _ => None,
                })
                .collect();

            // One per seeded wall tile along each run
            let expected: usize = plan
                .layout
                .left_runs
                .iter()
                .chain(plan.layout.right_runs.iter())
                .map(|run| {
                    let lateral = run_tile_lateral(run);
                    (run.start..run.end)
                        .filter(|&d| has_torch(view.position_seed(d, lateral)))
                        .count()
                })
                .sum();
            assert_eq!(torches.len(), expected);

            for torch in &torches {
                let depth = torch.depth.floor() as i32;
                assert!(depth < 8, "torch past the end wall");
                let left = project_in(viewport(), torch.depth, -1.5).anchor_x;
                let right = project_in(viewport(), torch.depth, 1.5).anchor_x;
                if torch.position.x == left {
                    assert_ne!(depth, 3, "torch in the side opening");
                    assert!(has_torch(view.position_seed(depth, -2)));
                } else {
                    assert_eq!(torch.position.x, right);
                    assert!(has_torch(view.position_seed(depth, 2)));
                }
            }
            seen += torches.len();
        }
        assert!(seen > 0);
    }

    #[test]
    fn test_entities_behind_end_wall_are_culled() {
        let view = view_of(&["#...#", "#...#", "#####", "#...#"]).with_entities(vec![
            Entity::new(1, EntityKind::Enemy, 1, 0.0),
            Entity::new(2, EntityKind::Enemy, 3, 0.0),
        ]);
        let plan = FramePlan::build(&view, viewport());
        let ids: Vec<u32> = plan
            .items
            .iter()
            .filter_map(|i| match i {
                DrawItem::Entity(e) => Some(e.id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_empty_view_draws_only_background() {
        let view = View::new(Vec::new(), Facing::NORTH);
        let theme = ThemeTable::builtin().get("crypt");
        let mut canvas = RecordingCanvas::new(500, 400);
        draw_view(&mut canvas, viewport(), &view, &theme, &RenderSettings::default(), &NoImages, 0.0);
        assert_eq!(canvas.fills, 2);
        assert_eq!(canvas.blits, 0);
    }

    #[test]
    fn test_full_frame_into_framebuffer() {
        let view = view_of(&["#...#", "#...#", "#...#", "#.#.#", "#...#", "#####"]);
        let themes = ThemeTable::builtin();
        let theme = themes.get("crypt");
        let cache = TextureCache::procedural(&themes);
        let mut fb = Framebuffer::new(500, 400);
        draw_view(&mut fb, viewport(), &view, &theme, &RenderSettings::default(), &cache, 0.5);

        // Centre column at the bottom is near floor, not background
        let background = theme.floor.mix(theme.fog, 0.8);
        let px = fb.get_pixel(250, 395).unwrap();
        assert_ne!(px, background);
    }
}
