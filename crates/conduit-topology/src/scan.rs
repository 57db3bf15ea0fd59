//! Pieces shared by the three scanners.

use std::collections::{BTreeSet, VecDeque};

use conduit_core::id::EntityId;
use conduit_core::pos::BlockPos;
use conduit_core::tag::{DIRTY_TAG, PositionTag, TagPrefix, position_tag};
use conduit_core::world::{Block, BlockAccess, EntityAccess};
use tracing::debug;

use crate::ResourceKind;
use crate::rules::FACE_STATE;

/// What one rescan saw and changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub kind: ResourceKind,
    pub origin: BlockPos,
    /// Every position dequeued by the outer search.
    pub visited: BTreeSet<BlockPos>,
    /// Carrier blocks (cables, conduits, pipes, exporters) expanded.
    pub carriers: usize,
    /// Endpoint tags written per source, summed over sources.
    pub endpoints: usize,
    /// Source entities whose tags were rewritten.
    pub sources: Vec<EntityId>,
}

impl ScanReport {
    pub fn new(kind: ResourceKind, origin: BlockPos) -> Self {
        Self {
            kind,
            origin,
            visited: BTreeSet::new(),
            carriers: 0,
            endpoints: 0,
            sources: Vec::new(),
        }
    }

    /// True when no entity was touched.
    pub fn is_noop(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn reached(&self, pos: BlockPos) -> bool {
        self.visited.contains(&pos)
    }
}

/// The entity a port block redirects to: whichever carries
/// `input:[port]`.
pub fn port_owner<W: EntityAccess + ?Sized>(world: &W, port: BlockPos) -> Option<EntityId> {
    world.entity_with_tag(&position_tag(TagPrefix::Input, port))
}

/// Every `input:` position declared by a multi-block owner.
pub fn input_positions<W: EntityAccess + ?Sized>(world: &W, owner: EntityId) -> Vec<BlockPos> {
    world
        .tags(owner)
        .iter()
        .filter_map(|t| PositionTag::parse(t))
        .filter(|t| t.prefix == TagPrefix::Input)
        .map(|t| t.pos)
        .collect()
}

/// The block an exporter or extractor is mounted on: one step against
/// its placement face.
pub fn attached_source<W>(world: &W, exporter: EntityId) -> Option<BlockPos>
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    let pos = world.entity_pos(exporter)?;
    let face = world.block(pos)?.face_state(FACE_STATE)?;
    Some(pos.step(face.opposite()))
}

// ---------------------------------------------------------------------------
// Exporter networks (item and fluid)
// ---------------------------------------------------------------------------

/// What a visited block contributes to an exporter scan.
pub(crate) enum Found {
    Nothing,
    Input(PositionTag),
    Extractor(EntityId),
}

pub(crate) struct Step {
    /// Keep searching through this block's neighbours.
    pub expand: bool,
    pub found: Found,
}

/// Breadth-first scan for exporter networks. Every exporter reached gets
/// a fresh set of endpoint tags (old tags under `prefixes` removed), minus
/// the blocks any exporter in the scan is mounted on, plus the dirty
/// marker. A scan that expands no carrier writes nothing.
pub(crate) fn scan_exporter_network<W, F>(
    world: &mut W,
    kind: ResourceKind,
    origin: BlockPos,
    prefixes: &[TagPrefix],
    classify: F,
) -> ScanReport
where
    W: BlockAccess + EntityAccess + ?Sized,
    F: Fn(&W, BlockPos, &Block) -> Step,
{
    let mut report = ScanReport::new(kind, origin);
    let mut queue = VecDeque::from([origin]);
    let mut inputs: Vec<PositionTag> = Vec::new();
    let mut extractors: Vec<EntityId> = Vec::new();

    while let Some(pos) = queue.pop_front() {
        if !report.visited.insert(pos) {
            continue;
        }
        let Some(block) = world.block(pos) else {
            continue;
        };
        let step = classify(&*world, pos, block);
        if step.expand {
            report.carriers += 1;
            queue.extend(pos.neighbors());
        }
        match step.found {
            Found::Nothing => {}
            Found::Input(tag) => {
                if !inputs.contains(&tag) {
                    inputs.push(tag);
                }
            }
            Found::Extractor(id) => {
                if !extractors.contains(&id) {
                    extractors.push(id);
                }
            }
        }
    }

    if report.carriers == 0 {
        debug!(kind = %kind, origin = %origin, "no carriers reached, leaving tags untouched");
        return report;
    }

    let blocked: BTreeSet<BlockPos> = extractors
        .iter()
        .filter_map(|&id| attached_source(&*world, id))
        .collect();
    let allowed: Vec<String> = inputs
        .iter()
        .filter(|t| !blocked.contains(&t.pos))
        .map(PositionTag::encode)
        .collect();

    for &id in &extractors {
        world.remove_tags_where(id, &|t| prefixes.iter().any(|p| p.matches(t)));
        for tag in &allowed {
            world.add_tag(id, tag);
        }
        world.add_tag(id, DIRTY_TAG);
        report.endpoints += allowed.len();
    }
    report.sources = extractors;

    debug!(
        kind = %kind,
        origin = %origin,
        visited = report.visited.len(),
        carriers = report.carriers,
        endpoints = allowed.len(),
        sources = report.sources.len(),
        "rescanned network"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::pos::Face;
    use conduit_core::test_utils::*;

    #[test]
    fn port_owner_follows_input_tag() {
        let mut world = empty_world();
        let owner = machine(&mut world, origin(), 0, 100);
        let port = origin().offset(0, 1, 0);
        world.add_tag(owner, &position_tag(TagPrefix::Input, port));
        assert_eq!(port_owner(&world, port), Some(owner));
        assert_eq!(port_owner(&world, origin().offset(5, 0, 0)), None);
        assert_eq!(input_positions(&world, owner), vec![port]);
    }

    #[test]
    fn attached_source_is_behind_the_face() {
        let mut world = empty_world();
        let pos = origin();
        let id = exporter(&mut world, pos, item_exporter(Face::Up));
        assert_eq!(attached_source(&world, id), Some(pos.offset(0, -1, 0)));
        let east = exporter(&mut world, pos.offset(3, 0, 0), item_exporter(Face::East));
        assert_eq!(attached_source(&world, east), Some(pos.offset(2, 0, 0)));
    }

    #[test]
    fn attached_source_needs_a_face() {
        let mut world = empty_world();
        let id = exporter(&mut world, origin(), item_conduit());
        assert_eq!(attached_source(&world, id), None);
    }
}
