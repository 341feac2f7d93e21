//! Per-frame view snapshot: tiles, rows, entities and facing
//!
//! Pure data. A `View` is built once per game-state update and borrowed
//! immutably for every render pass it is active for.

use serde::{Serialize, Deserialize};

/// Symbol conventions shared by maps and views
pub const WALL: char = '#';
pub const DOOR: char = '+';
pub const FLOOR: char = '.';

/// What a tile symbol means to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Floor,
    Wall,
    Door,
}

impl TileKind {
    /// Classify a symbol; unknown symbols fall back on walkability.
    ///
    /// | Kind  | Symbols                  |
    /// |-------|--------------------------|
    /// | Wall  | `#` `X` `%`              |
    /// | Door  | `+` `D` `\|` `-`        |
    /// | Floor | `.` `,` `_` and space    |
    pub fn classify(symbol: char, walkable: bool) -> TileKind {
        match symbol {
            WALL | 'X' | '%' => TileKind::Wall,
            DOOR | 'D' | '|' | '-' => TileKind::Door,
            FLOOR | ',' | ' ' | '_' => TileKind::Floor,
            _ if walkable => TileKind::Floor,
            _ => TileKind::Wall,
        }
    }

    /// Walls and doors both stop sight
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Door)
    }
}

/// One grid cell as seen from the viewer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub symbol: char,
    /// Distance along the facing axis (0 = viewer's cell)
    pub depth: i32,
    /// Signed column distance from the corridor centerline
    pub lateral_offset: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub walkable: bool,
}

fn default_true() -> bool {
    true
}

impl Tile {
    pub fn new(symbol: char, depth: i32, lateral_offset: i32) -> Self {
        let walkable = TileKind::classify(symbol, false) != TileKind::Wall;
        Self {
            symbol,
            depth,
            lateral_offset,
            visible: true,
            walkable,
        }
    }

    pub fn kind(&self) -> TileKind {
        TileKind::classify(self.symbol, self.walkable)
    }
}

/// Tiles sharing one depth, ordered left to right
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub depth: i32,
    pub tiles: Vec<Tile>,
}

impl Row {
    pub fn new(depth: i32, tiles: Vec<Tile>) -> Self {
        Self { depth, tiles }
    }

    /// Build a row from a symbol string centred on lateral offset 0.
    /// `"#...#"` gives offsets -2..=2.
    pub fn from_symbols(depth: i32, symbols: &str) -> Self {
        let chars: Vec<char> = symbols.chars().collect();
        let half = (chars.len() as i32 - 1) / 2;
        let tiles = chars
            .iter()
            .enumerate()
            .map(|(i, &c)| Tile::new(c, depth, i as i32 - half))
            .collect();
        Self { depth, tiles }
    }

    /// Visible tiles in lateral order
    pub fn visible_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| t.visible)
    }

    /// Tile at a lateral offset, if present and visible
    pub fn tile_at(&self, lateral_offset: i32) -> Option<&Tile> {
        self.visible_tiles().find(|t| t.lateral_offset == lateral_offset)
    }
}

/// Grid direction the viewer faces (unit vector, y grows southwards)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facing {
    pub dx: i32,
    pub dy: i32,
}

impl Facing {
    pub const NORTH: Facing = Facing { dx: 0, dy: -1 };
    pub const EAST: Facing = Facing { dx: 1, dy: 0 };
    pub const SOUTH: Facing = Facing { dx: 0, dy: 1 };
    pub const WEST: Facing = Facing { dx: -1, dy: 0 };

    /// Direction of increasing lateral offset
    pub fn right(self) -> Facing {
        Facing { dx: -self.dy, dy: self.dx }
    }

    pub fn left(self) -> Facing {
        Facing { dx: self.dy, dy: -self.dx }
    }

    pub fn back(self) -> Facing {
        Facing { dx: -self.dx, dy: -self.dy }
    }

    pub fn label(self) -> &'static str {
        match (self.dx, self.dy) {
            (0, -1) => "N",
            (1, 0) => "E",
            (0, 1) => "S",
            (-1, 0) => "W",
            _ => "?",
        }
    }
}

impl Default for Facing {
    fn default() -> Self {
        Facing::NORTH
    }
}

/// Point entity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Enemy,
    Item,
    Hazard,
}

/// A point entity in view space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub depth: i32,
    pub lateral_offset: f32,
    #[serde(default)]
    pub label: String,
}

impl Entity {
    pub fn new(id: u32, kind: EntityKind, depth: i32, lateral_offset: f32) -> Self {
        Self {
            id,
            kind,
            depth,
            lateral_offset,
            label: String::new(),
        }
    }
}

/// Everything the renderer reads for one pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// Near to far
    pub rows: Vec<Row>,
    pub facing: Facing,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Viewer's world cell, used for positional seeds
    #[serde(default)]
    pub origin: (i32, i32),
}

impl View {
    pub fn new(rows: Vec<Row>, facing: Facing) -> Self {
        Self {
            rows,
            facing,
            entities: Vec::new(),
            origin: (0, 0),
        }
    }

    pub fn with_entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_origin(mut self, origin: (i32, i32)) -> Self {
        self.origin = origin;
        self
    }

    /// World cell of a view-space position
    pub fn world_cell(&self, depth: i32, lateral_offset: i32) -> (i32, i32) {
        let right = self.facing.right();
        (
            self.origin.0 + self.facing.dx * depth + right.dx * lateral_offset,
            self.origin.1 + self.facing.dy * depth + right.dy * lateral_offset,
        )
    }

    /// Stable per-cell seed for variant selection and decor
    pub fn position_seed(&self, depth: i32, lateral_offset: i32) -> u32 {
        let (x, y) = self.world_cell(depth, lateral_offset);
        cell_seed(x, y)
    }
}

/// Integer hash of a world cell
pub fn cell_seed(x: i32, y: i32) -> u32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343) ^ (y as u32).wrapping_mul(0xd816_3841);
    h ^= h >> 13;
    h = h.wrapping_mul(0xcb1a_b31f);
    h ^ (h >> 16)
}
