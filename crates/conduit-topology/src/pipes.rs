//! Rescan orchestration around a changed block.
//!
//! [`update_pipes`] is what the place, break and signal hooks call: it
//! looks at the changed block and its six neighbours, rescans from each
//! one that belongs to the network (skipping positions an earlier scan in
//! the same call already covered) and refreshes their shape flags.

use std::collections::BTreeSet;

use conduit_core::pos::{BlockPos, Face};
use conduit_core::world::{Block, BlockAccess, EntityAccess};
use tracing::debug;

use crate::ResourceKind;
use crate::geometry::{update_exporter_geometry, update_geometry};
use crate::rules::{EXPORTER_TAG, NetworkRules, TUBE_TAG};
use crate::scan::ScanReport;
use crate::{energy, fluid, item};

/// Neighbour order for [`update_pipes`]: the block itself, then up, down,
/// north, south, west, east.
const UPDATE_ORDER: [Option<Face>; 7] = [
    None,
    Some(Face::Up),
    Some(Face::Down),
    Some(Face::North),
    Some(Face::South),
    Some(Face::West),
    Some(Face::East),
];

/// Outcome of one [`update_pipes`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeUpdate {
    pub reports: Vec<ScanReport>,
    /// Blocks whose shape flags could not all be written.
    pub geometry_failures: usize,
}

impl PipeUpdate {
    pub fn rescans(&self) -> usize {
        self.reports.len()
    }
}

/// Run the scanner for `kind` from `origin`.
pub fn rescan<W>(world: &mut W, rules: &NetworkRules, kind: ResourceKind, origin: BlockPos) -> ScanReport
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    match kind {
        ResourceKind::Energy => energy::rescan(world, rules, origin),
        ResourceKind::Item => item::rescan(world, rules, origin),
        ResourceKind::Fluid => fluid::rescan(world, rules, origin),
    }
}

/// Rescan and reshape the `kind` network around `origin`.
pub fn update_pipes<W>(world: &mut W, rules: &NetworkRules, origin: BlockPos, kind: ResourceKind) -> PipeUpdate
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    let tag = kind.block_tag();
    let mut update = PipeUpdate::default();
    let mut reached: BTreeSet<BlockPos> = BTreeSet::new();

    for step in UPDATE_ORDER {
        let pos = step.map_or(origin, |face| origin.step(face));
        let Some(block) = world.block(pos) else {
            continue;
        };
        if !block.has_tag(tag) {
            continue;
        }
        let is_exporter = block.has_tag(EXPORTER_TAG);
        let is_tube = block.has_tag(TUBE_TAG);

        if !reached.contains(&pos) {
            let report = rescan(world, rules, kind, pos);
            reached.extend(report.visited.iter().copied());
            update.reports.push(report);
        }

        let shaped = if is_exporter {
            update_exporter_geometry(world, rules, pos, kind)
        } else if is_tube {
            update_geometry(world, rules, pos, kind)
        } else {
            true
        };
        if !shaped {
            update.geometry_failures += 1;
        }
    }

    debug!(kind = %kind, origin = %origin, rescans = update.rescans(), "updated pipes");
    update
}

// ---------------------------------------------------------------------------
// Event routing
// ---------------------------------------------------------------------------

/// Networks to refresh after `block` was placed.
pub fn kinds_on_place(rules: &NetworkRules, block: &Block) -> Vec<ResourceKind> {
    let mut kinds = Vec::new();
    if block.has_tag(ResourceKind::Energy.block_tag()) {
        kinds.push(ResourceKind::Energy);
    }
    if block.has_tag(ResourceKind::Item.block_tag()) || rules.is_vanilla_container(&block.type_id) {
        kinds.push(ResourceKind::Item);
    }
    if block.has_tag(ResourceKind::Fluid.block_tag()) {
        kinds.push(ResourceKind::Fluid);
    }
    kinds
}

/// Networks to refresh after a block was broken, judged by what the
/// block was before it went.
pub fn kinds_on_break(rules: &NetworkRules, broken: &Block) -> Vec<ResourceKind> {
    let mut kinds = Vec::new();
    if broken.has_tag(ResourceKind::Energy.block_tag()) {
        kinds.push(ResourceKind::Energy);
    }
    if broken.has_tag(ResourceKind::Item.block_tag()) || rules.is_inventory_block(&broken.type_id) {
        kinds.push(ResourceKind::Item);
    }
    if broken.has_tag(ResourceKind::Fluid.block_tag()) {
        kinds.push(ResourceKind::Fluid);
    }
    kinds
}

/// Refresh every network the block now at `pos` belongs to.
pub fn on_block_placed<W>(world: &mut W, rules: &NetworkRules, pos: BlockPos) -> Vec<PipeUpdate>
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    let kinds = match world.block(pos) {
        Some(block) => kinds_on_place(rules, block),
        None => return Vec::new(),
    };
    kinds
        .into_iter()
        .map(|kind| update_pipes(world, rules, pos, kind))
        .collect()
}

/// Refresh every network `broken` used to belong to.
pub fn on_block_broken<W>(world: &mut W, rules: &NetworkRules, pos: BlockPos, broken: &Block) -> Vec<PipeUpdate>
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    kinds_on_break(rules, broken)
        .into_iter()
        .map(|kind| update_pipes(world, rules, pos, kind))
        .collect()
}
