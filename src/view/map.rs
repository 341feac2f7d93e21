//! Dungeon maps and view capture
//!
//! The corridor renderer only ever sees a `View`. This is the game-state
//! side that produces one: an ASCII grid plus entity placements, loaded
//! from RON, and a function that slices the grid into depth rows.
//!
//! Map rows use `#` for walls, `+` for doors and `.` for floor. The aliases
//! listed on [`TileKind::classify`](super::TileKind::classify) are accepted
//! too; any other symbol counts as wall.

use std::fs;
use std::path::Path;
use log::debug;
use serde::{Serialize, Deserialize};
use crate::config::ConfigError;
use super::{Entity, EntityKind, Facing, Row, Tile, View, FLOOR, WALL};

/// An entity placed on the map grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntity {
    pub id: u32,
    pub kind: EntityKind,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub label: String,
}

/// Grid dungeon, one string per map row (y grows southwards)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonMap {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_biome")]
    pub biome: String,
    pub rows: Vec<String>,
    #[serde(default)]
    pub entities: Vec<MapEntity>,
    pub start: (i32, i32),
    #[serde(default)]
    pub start_facing: Facing,
}

fn default_biome() -> String {
    "crypt".to_string()
}

impl DungeonMap {
    /// Symbol at a world cell; anything off the grid is solid wall
    pub fn symbol_at(&self, x: i32, y: i32) -> char {
        if x < 0 || y < 0 {
            return WALL;
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.chars().nth(x as usize))
            .unwrap_or(WALL)
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        Tile::new(self.symbol_at(x, y), 0, 0).walkable
    }

    /// Check the grid is non-empty and the start cell can be stood on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows.is_empty() {
            return Err(ConfigError::InvalidMap("map has no rows".to_string()));
        }
        if !self.is_walkable(self.start.0, self.start.1) {
            return Err(ConfigError::InvalidMap(format!(
                "start cell ({}, {}) is not walkable",
                self.start.0, self.start.1
            )));
        }
        Ok(())
    }

    /// Slice the grid into depth rows as seen from `origin` looking along
    /// `facing`: `max_depth + 1` rows, each `2 * half_width + 1` tiles wide.
    pub fn capture(&self, origin: (i32, i32), facing: Facing, max_depth: i32, half_width: i32) -> View {
        let right = facing.right();
        let mut rows = Vec::with_capacity(max_depth.max(0) as usize + 1);

        for depth in 0..=max_depth {
            let tiles = (-half_width..=half_width)
                .map(|lateral| {
                    let x = origin.0 + facing.dx * depth + right.dx * lateral;
                    let y = origin.1 + facing.dy * depth + right.dy * lateral;
                    let symbol = self.symbol_at(x, y);
                    // The viewer's own cell never occludes, even in a doorway
                    if depth == 0 && lateral == 0 && self.is_walkable(x, y) {
                        Tile::new(FLOOR, depth, lateral)
                    } else {
                        Tile::new(symbol, depth, lateral)
                    }
                })
                .collect();
            rows.push(Row::new(depth, tiles));
        }

        let entities = self
            .entities
            .iter()
            .filter_map(|e| {
                let (rx, ry) = (e.x - origin.0, e.y - origin.1);
                let depth = rx * facing.dx + ry * facing.dy;
                let lateral = rx * right.dx + ry * right.dy;
                if depth < 0 || depth > max_depth || lateral.abs() > half_width {
                    return None;
                }
                let mut entity = Entity::new(e.id, e.kind, depth, lateral as f32);
                entity.label = e.label.clone();
                Some(entity)
            })
            .collect();

        View::new(rows, facing)
            .with_entities(entities)
            .with_origin(origin)
    }
}

/// Load a map from a RON file
pub fn load_map<P: AsRef<Path>>(path: P) -> Result<DungeonMap, ConfigError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let map = load_map_from_str(&contents)?;
    debug!("Loaded map '{}' ({} rows) from {}", map.name, map.rows.len(), path.as_ref().display());
    Ok(map)
}

/// Load a map from a RON string (for embedded maps or testing)
pub fn load_map_from_str(s: &str) -> Result<DungeonMap, ConfigError> {
    let map: DungeonMap = ron::from_str(s)?;
    map.validate()?;
    Ok(map)
}

/// Save a map to a RON file
pub fn save_map<P: AsRef<Path>>(map: &DungeonMap, path: P) -> Result<(), ConfigError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(map, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Small built-in dungeon for the demo and tests
pub fn create_demo_map() -> DungeonMap {
    let rows = [
        "###############",
        "#.....#.......#",
        "#.###.#.#####.#",
        "#.#.........#.#",
        "#.#.###+###.#.#",
        "#...#.....#...#",
        "###.#..#..#.###",
        "#...#.....#...#",
        "#.#.###.###.#.#",
        "#.#.........#.#",
        "#.#####.#####.#",
        "#.............#",
        "###############",
    ];
    DungeonMap {
        name: "Demo Crypt".to_string(),
        biome: default_biome(),
        rows: rows.iter().map(|r| r.to_string()).collect(),
        entities: vec![
            MapEntity { id: 1, kind: EntityKind::Enemy, x: 7, y: 9, label: "ghoul".to_string() },
            MapEntity { id: 2, kind: EntityKind::Item, x: 6, y: 9, label: "potion".to_string() },
            MapEntity { id: 3, kind: EntityKind::Hazard, x: 6, y: 7, label: "spikes".to_string() },
            MapEntity { id: 4, kind: EntityKind::Enemy, x: 8, y: 9, label: "rat".to_string() },
        ],
        start: (7, 11),
        start_facing: Facing::NORTH,
    }
}
