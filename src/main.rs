//! Corridor Engine demo viewer
//!
//! Walks a dungeon map with the arrow keys and presents the software
//! framebuffer in a macroquad window.
//!
//! Optional files next to the binary:
//! - `assets/map.ron` dungeon map (falls back to the built-in demo map)
//! - `assets/settings.ron` render settings
//! - `assets/themes.ron` biome palettes
//! - `assets/textures/<biome>/*.png` surface images

use macroquad::prelude::*;
use corridor_engine::assets::{NoImages, SurfaceImages, TextureCache};
use corridor_engine::config::{RenderSettings, ThemeTable};
use corridor_engine::corridor::Viewport;
use corridor_engine::rasterizer::{Framebuffer, HEIGHT, WIDTH};
use corridor_engine::view::{create_demo_map, load_map, DungeonMap, Facing};
use corridor_engine::{draw_view, VERSION};

/// How far ahead the viewer sees, in tiles
const VIEW_DEPTH: i32 = 8;
/// Tiles captured either side of the centerline
const VIEW_HALF_WIDTH: i32 = 3;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Corridor Engine v{}", VERSION),
        window_width: WIDTH as i32 * 2,
        window_height: HEIGHT as i32 * 2,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn load_dungeon() -> DungeonMap {
    match load_map("assets/map.ron") {
        Ok(map) => {
            log::info!("Loaded map '{}'", map.name);
            map
        }
        Err(e) => {
            log::info!("Using built-in demo map ({})", e);
            create_demo_map()
        }
    }
}

fn load_settings(map: &DungeonMap) -> RenderSettings {
    RenderSettings::load("assets/settings.ron").unwrap_or_else(|e| {
        log::debug!("Default render settings ({})", e);
        RenderSettings { biome: map.biome.clone(), ..RenderSettings::default() }
    })
}

fn load_themes() -> ThemeTable {
    ThemeTable::load("assets/themes.ron").unwrap_or_else(|e| {
        log::debug!("Built-in themes ({})", e);
        ThemeTable::builtin()
    })
}

/// Viewer position and heading on the map
struct Walker {
    cell: (i32, i32),
    facing: Facing,
}

impl Walker {
    fn step(&mut self, map: &DungeonMap, dir: Facing) {
        let next = (self.cell.0 + dir.dx, self.cell.1 + dir.dy);
        if map.is_walkable(next.0, next.1) {
            self.cell = next;
        }
    }

    fn handle_input(&mut self, map: &DungeonMap) {
        if is_key_pressed(KeyCode::Up) || is_key_pressed(KeyCode::W) {
            self.step(map, self.facing);
        }
        if is_key_pressed(KeyCode::Down) || is_key_pressed(KeyCode::S) {
            self.step(map, self.facing.back());
        }
        if is_key_pressed(KeyCode::Q) {
            self.step(map, self.facing.left());
        }
        if is_key_pressed(KeyCode::E) {
            self.step(map, self.facing.right());
        }
        if is_key_pressed(KeyCode::Left) || is_key_pressed(KeyCode::A) {
            self.facing = self.facing.left();
        }
        if is_key_pressed(KeyCode::Right) || is_key_pressed(KeyCode::D) {
            self.facing = self.facing.right();
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        simplelog::ConfigBuilder::default()
            .set_time_level(log::LevelFilter::Trace)
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .unwrap_or_else(|e| eprintln!("Logger already set: {}", e));

    let map = load_dungeon();
    if let Err(e) = map.validate() {
        log::error!("{}", e);
        return;
    }

    let mut settings = load_settings(&map);
    let themes = load_themes();

    let loaded = TextureCache::load_directory("assets/textures");
    let textures = if loaded.is_empty() {
        TextureCache::procedural(&themes)
    } else {
        loaded
    };
    let mut textured = true;

    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let viewport = Viewport::new(WIDTH as f32, HEIGHT as f32);
    let mut walker = Walker { cell: map.start, facing: map.start_facing };
    let biomes: Vec<String> = themes.biome_ids().map(str::to_string).collect();

    log::info!("=== Corridor Engine v{} ===", VERSION);

    loop {
        walker.handle_input(&map);
        if is_key_pressed(KeyCode::T) {
            textured = !textured;
        }
        if is_key_pressed(KeyCode::B) && !biomes.is_empty() {
            let i = biomes.iter().position(|b| *b == settings.biome).map_or(0, |i| i + 1);
            settings.biome = biomes[i % biomes.len()].clone();
            log::info!("Biome: {}", settings.biome);
        }
        if is_key_pressed(KeyCode::F) {
            settings.fog_density = if settings.fog_density >= 2.0 { 0.0 } else { settings.fog_density + 0.5 };
        }

        let view = map.capture(walker.cell, walker.facing, VIEW_DEPTH, VIEW_HALF_WIDTH);
        let theme = themes.get(&settings.biome);
        let images: &dyn SurfaceImages = if textured { &textures } else { &NoImages };
        draw_view(&mut fb, viewport, &view, &theme, &settings, images, get_time() as f32);

        clear_background(BLACK);
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
        texture.set_filter(FilterMode::Nearest);

        // Fit the window, keeping aspect
        let scale = (screen_width() / fb.width as f32).min(screen_height() / fb.height as f32);
        let (draw_w, draw_h) = (fb.width as f32 * scale, fb.height as f32 * scale);
        draw_texture_ex(
            &texture,
            (screen_width() - draw_w) * 0.5,
            (screen_height() - draw_h) * 0.5,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(draw_w, draw_h)),
                ..Default::default()
            },
        );

        let hud = format!(
            "{} ({}, {}) facing {} | biome {} | fog {:.1} | [T]extures {} | [B]iome [F]og",
            map.name,
            walker.cell.0,
            walker.cell.1,
            walker.facing.label(),
            settings.biome,
            settings.fog_density,
            if textured { "on" } else { "off" },
        );
        draw_text(&hud, 10.0, 20.0, 20.0, Color::from_rgba(220, 220, 220, 255));

        next_frame().await;
    }
}
