//! Corridor analyzer
//!
//! Reads the rows of a view and decides which walls are one continuous
//! surface. Side walls become runs (one quad per run instead of one per
//! tile), a blocking centerline wall becomes a single full-width end wall,
//! and everything else solid is an interior fragment drawn per tile.
//!
//! A side wall is the whole solid stretch touching a row's edge, so a one
//! tile corridor captured wider than itself still merges into runs.

use log::trace;
use crate::view::{Row, TileKind, View};

/// Lateral span assumed for a row with nothing in it
const DEFAULT_SPAN: (i32, i32) = (-1, 1);

/// A solid tile that is not part of a side wall or the end wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallFragment {
    pub depth: i32,
    pub lateral_offset: i32,
    pub kind: TileKind,
}

/// Blocking wall at the end of the visible corridor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontWall {
    pub depth: i32,
    pub kind: TileKind,
    /// Outer lateral edges of the whole row
    pub left_edge: f32,
    pub right_edge: f32,
}

/// Classification of one depth row
#[derive(Debug, Clone, PartialEq)]
pub struct RowAnalysis {
    pub depth: i32,
    pub left_wall: bool,
    pub right_wall: bool,
    pub front_wall: Option<FrontWall>,
    pub interior: Vec<WallFragment>,
    /// Solid tiles belonging to the left and right wall stretches
    pub edge_tiles: Vec<WallFragment>,
    /// Lateral offsets of open (floor) tiles
    pub open: Vec<i32>,
    /// Leftmost and rightmost lateral offsets present
    pub span: (i32, i32),
    /// Innermost tiles of the left and right wall stretches
    pub inner: (i32, i32),
}

impl RowAnalysis {
    /// Lateral position of the left wall's inner face
    pub fn left_face(&self) -> f32 {
        self.inner.0 as f32 + 0.5
    }

    /// Lateral position of the right wall's inner face
    pub fn right_face(&self) -> f32 {
        self.inner.1 as f32 - 0.5
    }

    /// A row with nothing visible: both walls and the front wall present
    fn blocked(depth: i32, span: (i32, i32)) -> Self {
        Self {
            depth,
            left_wall: true,
            right_wall: true,
            front_wall: Some(FrontWall {
                depth,
                kind: TileKind::Wall,
                left_edge: span.0 as f32 - 0.5,
                right_edge: span.1 as f32 + 0.5,
            }),
            interior: Vec::new(),
            edge_tiles: Vec::new(),
            open: Vec::new(),
            span,
            inner: span,
        }
    }
}

/// Which side of the corridor a run belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Contiguous stretch of side wall drawn as one quad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallRun {
    pub side: Side,
    /// First depth covered
    pub start: i32,
    /// One past the last depth covered
    pub end: i32,
    /// Lateral position of the wall's inner face
    pub face: f32,
}

impl WallRun {
    pub fn len(&self) -> i32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }
}

/// Everything the planner needs to know about the corridor shape
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorridorLayout {
    /// Rows up to and including the first blocking row
    pub rows: Vec<RowAnalysis>,
    pub left_runs: Vec<WallRun>,
    pub right_runs: Vec<WallRun>,
    pub front: Option<FrontWall>,
}

impl CorridorLayout {
    /// Deepest depth the left wall reaches continuously from the viewer
    pub fn max_left_depth(&self) -> Option<i32> {
        self.left_runs.iter().find(|r| r.start == 0).map(|r| r.end)
    }

    pub fn max_right_depth(&self) -> Option<i32> {
        self.right_runs.iter().find(|r| r.start == 0).map(|r| r.end)
    }

    /// Rows the viewer can see floor in (everything before the end wall)
    pub fn open_rows(&self) -> impl Iterator<Item = &RowAnalysis> {
        let limit = self.front.map(|f| f.depth).unwrap_or(i32::MAX);
        self.rows.iter().filter(move |r| r.depth < limit)
    }

    pub fn interior(&self) -> impl Iterator<Item = &WallFragment> {
        self.open_rows().flat_map(|r| r.interior.iter())
    }

    /// Side-wall tiles whose front is exposed because the tile in front of
    /// them (one depth nearer) is open floor
    pub fn caps(&self) -> Vec<WallFragment> {
        let rows: Vec<&RowAnalysis> = self.open_rows().collect();
        rows.windows(2)
            .flat_map(|pair| {
                let (near, far) = (pair[0], pair[1]);
                far.edge_tiles
                    .iter()
                    .filter(move |t| near.open.contains(&t.lateral_offset))
                    .copied()
            })
            .collect()
    }
}

/// Classify a single row. `fallback_span` is used when the row is empty.
pub fn classify_row(row: &Row, fallback_span: (i32, i32)) -> RowAnalysis {
    let visible: Vec<_> = row.visible_tiles().collect();
    let (Some(first), Some(last)) = (visible.first(), visible.last()) else {
        return RowAnalysis::blocked(row.depth, fallback_span);
    };

    let span = (first.lateral_offset, last.lateral_offset);
    let left_wall = first.kind().is_solid();
    let right_wall = last.kind().is_solid();

    // Length of the solid stretches touching each edge
    let leading = visible.iter().take_while(|t| t.kind().is_solid()).count();
    let trailing = visible.iter().rev().take_while(|t| t.kind().is_solid()).count();
    let inner = (
        if leading > 0 { visible[leading - 1].lateral_offset } else { span.0 },
        if trailing > 0 { visible[visible.len() - trailing].lateral_offset } else { span.1 },
    );

    let is_open = |lateral: i32| {
        row.tile_at(lateral)
            .map(|t| t.kind() == TileKind::Floor)
            .unwrap_or(false)
    };

    // Centerline: missing means unknown geometry and always blocks. A solid
    // centre with open floor beside it is a pillar, not an end wall.
    let centre_kind = row.tile_at(0).map(|t| t.kind()).unwrap_or(TileKind::Wall);
    let blocking = match row.tile_at(0) {
        None => true,
        Some(centre) => centre.kind().is_solid() && !is_open(-1) && !is_open(1),
    };
    let front_wall = blocking.then(|| FrontWall {
        depth: row.depth,
        kind: centre_kind,
        left_edge: span.0 as f32 - 0.5,
        right_edge: span.1 as f32 + 0.5,
    });

    let mut interior = Vec::new();
    let mut edge_tiles = Vec::new();
    let mut open = Vec::new();
    for (i, tile) in visible.iter().enumerate() {
        let kind = tile.kind();
        if !kind.is_solid() {
            open.push(tile.lateral_offset);
            continue;
        }
        let fragment = WallFragment {
            depth: row.depth,
            lateral_offset: tile.lateral_offset,
            kind,
        };
        if i < leading || i >= visible.len() - trailing {
            edge_tiles.push(fragment);
        } else if !(blocking && tile.lateral_offset == 0) {
            interior.push(fragment);
        }
    }

    RowAnalysis {
        depth: row.depth,
        left_wall,
        right_wall,
        front_wall,
        interior,
        edge_tiles,
        open,
        span,
        inner,
    }
}

/// Extend the last run on `side` or start a new one
fn push_run(runs: &mut Vec<WallRun>, side: Side, depth: i32, face: f32) {
    if let Some(run) = runs.last_mut() {
        if run.end == depth && run.face == face {
            run.end = depth + 1;
            return;
        }
    }
    runs.push(WallRun { side, start: depth, end: depth + 1, face });
}

/// Analyze a whole view, near to far, stopping at the first blocking row
pub fn analyze(view: &View) -> CorridorLayout {
    let mut layout = CorridorLayout::default();
    let mut span = DEFAULT_SPAN;
    let mut expected = view.rows.first().map(|r| r.depth).unwrap_or(0);

    for row in &view.rows {
        // A skipped depth is an empty row, which blocks
        let analysis = if row.depth > expected {
            RowAnalysis::blocked(expected, span)
        } else {
            classify_row(row, span)
        };
        span = analysis.span;
        expected = analysis.depth + 1;

        if let Some(front) = analysis.front_wall {
            layout.front = Some(front);
            layout.rows.push(analysis);
            break;
        }

        if analysis.left_wall {
            push_run(&mut layout.left_runs, Side::Left, analysis.depth, analysis.left_face());
        }
        if analysis.right_wall {
            push_run(&mut layout.right_runs, Side::Right, analysis.depth, analysis.right_face());
        }
        layout.rows.push(analysis);
    }

    trace!(
        "corridor: {} rows, {} left runs, {} right runs, front {:?}",
        layout.rows.len(),
        layout.left_runs.len(),
        layout.right_runs.len(),
        layout.front.map(|f| f.depth)
    );
    layout
}
