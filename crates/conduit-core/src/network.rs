//! Cached endpoint lists and transfer ordering.
//!
//! The topology scanner leaves position tags on each source entity. At
//! distribution time those tags are turned into a distance-sorted node
//! list, cached as JSON in an entity property and reused until the entity
//! is marked dirty again.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::id::EntityId;
use crate::pos::BlockPos;
use crate::tag::{DIRTY_TAG, PositionTag, TagPrefix};
use crate::world::EntityAccess;

/// Entity property holding the transfer policy.
pub const TRANSFER_MODE_PROPERTY: &str = "transferMode";

// ---------------------------------------------------------------------------
// Transfer mode
// ---------------------------------------------------------------------------

/// Order in which a source visits its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Closest endpoints first.
    #[default]
    Nearest,
    /// Farthest endpoints first.
    Farthest,
    /// Equal share per endpoint, starting point rotating every round.
    Round,
}

impl TransferMode {
    pub fn name(self) -> &'static str {
        match self {
            TransferMode::Nearest => "nearest",
            TransferMode::Farthest => "farthest",
            TransferMode::Round => "round",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nearest" => Some(TransferMode::Nearest),
            "farthest" => Some(TransferMode::Farthest),
            "round" => Some(TransferMode::Round),
            _ => None,
        }
    }

    /// Explicit mode if given, else the entity's `transferMode` setting,
    /// else nearest.
    pub fn resolve<W: EntityAccess + ?Sized>(
        explicit: Option<TransferMode>,
        world: &W,
        source: EntityId,
    ) -> TransferMode {
        explicit
            .or_else(|| {
                world
                    .property(source, TRANSFER_MODE_PROPERTY)
                    .and_then(TransferMode::parse)
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Display for TransferMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Node cache
// ---------------------------------------------------------------------------

/// Where one resource kind caches its endpoint list on a source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCache {
    /// Property holding the JSON node array.
    pub property: &'static str,
    /// Property holding the round-robin start index.
    pub rotation_property: &'static str,
    /// Tag prefixes whose positions feed the list.
    pub prefixes: &'static [TagPrefix],
}

pub const ENERGY_NODES: NodeCache = NodeCache {
    property: "dorios:energy_nodes",
    rotation_property: "dorios:energy_round_idx",
    prefixes: &[TagPrefix::Pos, TagPrefix::Net],
};

pub const FLUID_NODES: NodeCache = NodeCache {
    property: "dorios:fluid_nodes",
    rotation_property: "dorios:fluid_round_idx",
    prefixes: &[TagPrefix::Ent],
};

pub const ITEM_NODES: NodeCache = NodeCache {
    property: "dorios:item_nodes",
    rotation_property: "dorios:item_round_idx",
    prefixes: &[TagPrefix::Van, TagPrefix::Ent, TagPrefix::Dra],
};

impl NodeCache {
    /// The cached list if present, parseable and not marked dirty.
    pub fn cached<W: EntityAccess + ?Sized>(
        &self,
        world: &W,
        source: EntityId,
    ) -> Option<Vec<BlockPos>> {
        if world.has_tag(source, DIRTY_TAG) {
            return None;
        }
        let raw = world.property(source, self.property)?;
        match serde_json::from_str(raw) {
            Ok(nodes) => Some(nodes),
            Err(e) => {
                warn!(property = self.property, error = %e, "discarding unreadable node cache");
                None
            }
        }
    }

    /// The cached list, rebuilt first if missing or stale.
    pub fn load<W: EntityAccess + ?Sized>(&self, world: &mut W, source: EntityId) -> Vec<BlockPos> {
        match self.cached(world, source) {
            Some(nodes) => nodes,
            None => self.rebuild(world, source),
        }
    }

    /// Rebuild from position tags: dedupe, sort by distance from the
    /// source (stable), store, and clear the dirty marker.
    pub fn rebuild<W: EntityAccess + ?Sized>(
        &self,
        world: &mut W,
        source: EntityId,
    ) -> Vec<BlockPos> {
        let origin = world.entity_pos(source).unwrap_or_default();
        let mut nodes: Vec<BlockPos> = Vec::new();
        for tag in world.tags(source) {
            let Some(parsed) = PositionTag::parse(tag) else {
                continue;
            };
            if self.prefixes.contains(&parsed.prefix) && !nodes.contains(&parsed.pos) {
                nodes.push(parsed.pos);
            }
        }
        nodes.sort_by_key(|p| origin.distance_squared(p));

        match serde_json::to_string(&nodes) {
            Ok(json) => world.set_property(source, self.property, json),
            Err(e) => warn!(property = self.property, error = %e, "failed to encode node cache"),
        }
        world.remove_tag(source, DIRTY_TAG);
        trace!(property = self.property, nodes = nodes.len(), "rebuilt node cache");
        nodes
    }

    /// Next round-robin start index, advancing the stored one.
    pub fn next_rotation<W: EntityAccess + ?Sized>(
        &self,
        world: &mut W,
        source: EntityId,
        len: usize,
    ) -> usize {
        if len == 0 {
            return 0;
        }
        let current = world
            .property(source, self.rotation_property)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0)
            % len;
        world.set_property(source, self.rotation_property, ((current + 1) % len).to_string());
        current
    }
}

/// Mark a source's node list stale.
pub fn invalidate<W: EntityAccess + ?Sized>(world: &mut W, source: EntityId) {
    world.add_tag(source, DIRTY_TAG);
}

/// Apply a mode's ordering to a nearest-first list.
pub fn order_targets(mut nodes: Vec<BlockPos>, mode: TransferMode, rotation: usize) -> Vec<BlockPos> {
    match mode {
        TransferMode::Nearest => {}
        TransferMode::Farthest => nodes.reverse(),
        TransferMode::Round => {
            if !nodes.is_empty() {
                let start = rotation % nodes.len();
                nodes.rotate_left(start);
            }
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::position_tag;
    use crate::test_utils::*;

    #[test]
    fn mode_resolution() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 0, 10);
        assert_eq!(TransferMode::resolve(None, &world, id), TransferMode::Nearest);
        world.set_property(id, TRANSFER_MODE_PROPERTY, "round".into());
        assert_eq!(TransferMode::resolve(None, &world, id), TransferMode::Round);
        assert_eq!(
            TransferMode::resolve(Some(TransferMode::Farthest), &world, id),
            TransferMode::Farthest
        );
        world.set_property(id, TRANSFER_MODE_PROPERTY, "sideways".into());
        assert_eq!(TransferMode::resolve(None, &world, id), TransferMode::Nearest);
    }

    #[test]
    fn rebuild_sorts_dedupes_and_clears_dirty() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 0, 10);
        let far = BlockPos::new(5, 0, 0);
        let near = BlockPos::new(1, 0, 0);
        world.add_tag(id, &position_tag(TagPrefix::Net, far));
        world.add_tag(id, &position_tag(TagPrefix::Pos, near));
        world.add_tag(id, &position_tag(TagPrefix::Net, near));
        world.add_tag(id, &position_tag(TagPrefix::Van, BlockPos::new(2, 0, 0)));
        invalidate(&mut world, id);

        assert_eq!(ENERGY_NODES.cached(&world, id), None);
        let nodes = ENERGY_NODES.load(&mut world, id);
        assert_eq!(nodes, vec![near, far]);
        assert!(!world.has_tag(id, DIRTY_TAG));
        assert_eq!(
            world.property(id, "dorios:energy_nodes"),
            Some(r#"[{"x":1,"y":0,"z":0},{"x":5,"y":0,"z":0}]"#)
        );
        assert_eq!(ENERGY_NODES.cached(&world, id), Some(vec![near, far]));
    }

    #[test]
    fn stale_cache_is_kept_until_dirty() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 0, 10);
        world.add_tag(id, "ent:[1,0,0]");
        assert_eq!(FLUID_NODES.load(&mut world, id).len(), 1);
        world.add_tag(id, "ent:[2,0,0]");
        assert_eq!(FLUID_NODES.load(&mut world, id).len(), 1);
        invalidate(&mut world, id);
        assert_eq!(FLUID_NODES.load(&mut world, id).len(), 2);
    }

    #[test]
    fn unreadable_cache_rebuilds() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 0, 10);
        world.set_property(id, "dorios:item_nodes", "not json".into());
        world.add_tag(id, "dra:[0,1,0]");
        assert_eq!(ITEM_NODES.load(&mut world, id), vec![BlockPos::new(0, 1, 0)]);
    }

    #[test]
    fn ordering_per_mode() {
        let nodes: Vec<BlockPos> = (1..=4).map(|x| BlockPos::new(x, 0, 0)).collect();
        assert_eq!(order_targets(nodes.clone(), TransferMode::Nearest, 0), nodes);
        let far = order_targets(nodes.clone(), TransferMode::Farthest, 0);
        assert_eq!(far[0], BlockPos::new(4, 0, 0));
        let round = order_targets(nodes.clone(), TransferMode::Round, 5);
        assert_eq!(round[0], BlockPos::new(2, 0, 0));
        assert!(order_targets(Vec::new(), TransferMode::Round, 3).is_empty());
    }

    #[test]
    fn rotation_advances_and_wraps() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 0, 10);
        let seen: Vec<usize> = (0..4)
            .map(|_| ENERGY_NODES.next_rotation(&mut world, id, 3))
            .collect();
        assert_eq!(seen, vec![0, 1, 2, 0]);
        assert_eq!(ENERGY_NODES.next_rotation(&mut world, id, 0), 0);
    }
}
