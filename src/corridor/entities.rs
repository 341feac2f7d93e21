//! Entity placer
//!
//! Projects point entities into the corridor and spreads out entities that
//! share a depth so they do not stack on the same spot.

use std::collections::BTreeMap;
use crate::view::{Entity, EntityKind};
use super::projection::{project_in, Viewport};

/// Most lateral slots any depth offers
pub const MAX_ENTITY_SLOTS: usize = 5;
/// Lateral distance between neighbouring slots, in tile widths
pub const SLOT_SPACING: f32 = 0.6;
/// Entities stand in the middle of their tile
const STAND_OFFSET: f32 = 0.5;

/// Lateral slots available at `depth`; the view cone narrows towards the viewer
pub fn slot_count(depth: i32) -> usize {
    (2 * depth.max(0) as usize + 1).clamp(1, MAX_ENTITY_SLOTS)
}

/// `count` evenly spaced offsets centred on zero
pub fn slot_offsets(count: usize) -> Vec<f32> {
    let centre = (count as f32 - 1.0) / 2.0;
    (0..count).map(|i| (i as f32 - centre) * SLOT_SPACING).collect()
}

/// An entity with its final lateral offset and screen placement
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEntity {
    pub id: u32,
    pub kind: EntityKind,
    pub depth: i32,
    pub lateral_offset: f32,
    /// Centre x on screen
    pub screen_x: f32,
    /// Where the entity touches the floor
    pub ground_y: f32,
    /// Sprite height in pixels
    pub size: f32,
}

impl PlacedEntity {
    /// World depth the sprite is drawn at
    pub fn stand_depth(&self) -> f32 {
        self.depth as f32 + STAND_OFFSET
    }
}

/// Half width of the widest slot layout
fn slot_reach() -> f32 {
    (MAX_ENTITY_SLOTS as f32 - 1.0) / 2.0 * SLOT_SPACING
}

/// Resolve lateral offsets so entities sharing a depth spread out.
/// Returns (entity, final offset) in input order within each depth group.
///
/// A group whose offsets are already distinct and inside the widest slot
/// layout keeps them, even where the depth has fewer slots than members.
pub fn distribute(entities: &[Entity]) -> Vec<(&Entity, f32)> {
    let mut groups: BTreeMap<i32, Vec<&Entity>> = BTreeMap::new();
    for e in entities {
        groups.entry(e.depth).or_default().push(e);
    }

    let mut out = Vec::with_capacity(entities.len());
    for (depth, group) in groups {
        let slots = slot_count(depth);
        let k = group.len();

        let collides = group.iter().enumerate().any(|(i, a)| {
            group[i + 1..].iter().any(|b| a.lateral_offset == b.lateral_offset)
        });
        let in_reach = group.iter().all(|e| e.lateral_offset.abs() <= slot_reach());
        if !collides && in_reach {
            out.extend(group.into_iter().map(|e| (e, e.lateral_offset)));
            continue;
        }

        if k > slots {
            // Round-robin over the available slots
            let offsets = slot_offsets(slots);
            for (i, e) in group.into_iter().enumerate() {
                out.push((e, offsets[i % slots]));
            }
            continue;
        }

        if collides {
            // Keep the left-to-right order of the original offsets
            let mut order: Vec<&Entity> = group;
            order.sort_by(|a, b| {
                a.lateral_offset
                    .partial_cmp(&b.lateral_offset)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            });
            let offsets = slot_offsets(k);
            for (e, off) in order.into_iter().zip(offsets) {
                out.push((e, off));
            }
        } else {
            out.extend(group.into_iter().map(|e| (e, e.lateral_offset)));
        }
    }
    out
}

/// Place all entities on screen, sorted far to near (painter's order).
/// Entities at or beyond `cutoff_depth` are hidden behind the end wall.
pub fn place_entities(entities: &[Entity], viewport: Viewport, cutoff_depth: Option<i32>) -> Vec<PlacedEntity> {
    let mut placed: Vec<PlacedEntity> = distribute(entities)
        .into_iter()
        .filter(|(e, _)| e.depth >= 0 && cutoff_depth.map_or(true, |c| e.depth < c))
        .map(|(e, lateral)| {
            let depth = e.depth as f32 + STAND_OFFSET;
            let p = project_in(viewport, depth, lateral);
            PlacedEntity {
                id: e.id,
                kind: e.kind,
                depth: e.depth,
                lateral_offset: lateral,
                screen_x: p.anchor_x,
                ground_y: p.wall_bottom,
                size: p.wall_span() * size_factor(e.kind),
            }
        })
        .collect();

    placed.sort_by(|a, b| b.depth.cmp(&a.depth).then(a.id.cmp(&b.id)));
    placed
}

/// Sprite height relative to wall height
pub fn size_factor(kind: EntityKind) -> f32 {
    match kind {
        EntityKind::Enemy => 0.62,
        EntityKind::Item => 0.22,
        EntityKind::Hazard => 0.16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crowd(k: usize, depth: i32) -> Vec<Entity> {
        (0..k).map(|i| Entity::new(i as u32, EntityKind::Enemy, depth, 0.0)).collect()
    }

    #[test]
    fn test_slot_count_grows_with_depth() {
        assert_eq!(slot_count(0), 1);
        assert_eq!(slot_count(1), 3);
        assert_eq!(slot_count(2), 5);
        assert_eq!(slot_count(9), MAX_ENTITY_SLOTS);
    }

    #[test]
    fn test_overflow_uses_at_most_slot_count_offsets() {
        let entities = crowd(5, 1);
        let out = distribute(&entities);
        assert_eq!(out.len(), 5);
        let mut distinct: Vec<f32> = out.iter().map(|(_, o)| *o).collect();
        distinct.sort_by(|a, b| a.partial_cmp(b).unwrap());
        distinct.dedup();
        assert!(distinct.len() <= 3);
        // Centred on zero
        assert!((distinct.iter().sum::<f32>()).abs() < 1e-5);
    }

    #[test]
    fn test_collisions_spread_when_slots_suffice() {
        let entities = crowd(3, 2);
        let out = distribute(&entities);
        let mut offsets: Vec<f32> = out.iter().map(|(_, o)| *o).collect();
        offsets.sort_by(|a, b| a.partial_cmp(b).unwrap());
        offsets.dedup();
        assert_eq!(offsets.len(), 3);
    }

    #[test]
    fn test_distinct_offsets_are_kept() {
        let entities = vec![
            Entity::new(1, EntityKind::Item, 2, -1.0),
            Entity::new(2, EntityKind::Item, 2, 1.0),
        ];
        let out = distribute(&entities);
        assert_eq!(out[0].1, -1.0);
        assert_eq!(out[1].1, 1.0);
    }

    #[test]
    fn test_distinct_offsets_in_viewer_cell_stay_apart() {
        let entities = vec![
            Entity::new(1, EntityKind::Enemy, 0, -1.0),
            Entity::new(2, EntityKind::Item, 0, 1.0),
        ];
        let offsets: Vec<f32> = distribute(&entities).into_iter().map(|(_, o)| o).collect();
        assert_eq!(offsets, vec![-1.0, 1.0]);
    }

    #[test]
    fn test_far_out_offsets_are_pulled_into_slots() {
        let entities = vec![
            Entity::new(1, EntityKind::Enemy, 0, -3.0),
            Entity::new(2, EntityKind::Enemy, 0, 3.0),
        ];
        let out = distribute(&entities);
        assert!(out.iter().all(|(_, o)| *o == 0.0));
    }

    #[test]
    fn test_placement_is_far_to_near_and_culled() {
        let entities = vec![
            Entity::new(1, EntityKind::Enemy, 1, 0.0),
            Entity::new(2, EntityKind::Enemy, 4, 0.0),
            Entity::new(3, EntityKind::Item, 2, 0.0),
            Entity::new(4, EntityKind::Enemy, 6, 0.0),
        ];
        let placed = place_entities(&entities, Viewport::new(500.0, 400.0), Some(5));
        let depths: Vec<i32> = placed.iter().map(|p| p.depth).collect();
        assert_eq!(depths, vec![4, 2, 1]);
        assert!(placed[0].size < placed[2].size);
    }
}
