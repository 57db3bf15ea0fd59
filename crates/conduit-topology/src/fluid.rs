//! Fluid network scan.
//!
//! Pipes and extractors carry the search. Tank blocks (whether or not
//! their entity exists yet), fluid containers and fluid ports become
//! `ent:` endpoints on every extractor reached.

use conduit_core::capability::Capability;
use conduit_core::pos::BlockPos;
use conduit_core::tag::{PositionTag, TagPrefix};
use conduit_core::world::{Block, BlockAccess, EntityAccess};

use crate::ResourceKind;
use crate::rules::{NetworkRules, PORT_TAG};
use crate::scan::{Found, ScanReport, Step, port_owner, scan_exporter_network};

pub const FLUID_PREFIXES: [TagPrefix; 1] = [TagPrefix::Ent];

fn classify<W>(world: &W, rules: &NetworkRules, pos: BlockPos, block: &Block) -> Step
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    let fluid_tag = ResourceKind::Fluid.block_tag();
    let expand = rules.is_fluid_carrier(&block.type_id);

    let found = if rules.is_tank(&block.type_id) {
        Found::Input(PositionTag::new(TagPrefix::Ent, pos))
    } else if block.has_tag(PORT_TAG) && block.has_tag(fluid_tag) {
        port_owner(world, pos)
            .and_then(|owner| world.entity_pos(owner))
            .map_or(Found::Nothing, |p| Found::Input(PositionTag::new(TagPrefix::Ent, p)))
    } else {
        match world.entity_at(pos) {
            Some(entity) => {
                let caps = world.capabilities(entity);
                if caps.contains(Capability::Exporter) && block.has_tag(fluid_tag) {
                    Found::Extractor(entity)
                } else if caps.contains(Capability::FluidContainer) {
                    Found::Input(PositionTag::new(TagPrefix::Ent, pos))
                } else {
                    Found::Nothing
                }
            }
            None => Found::Nothing,
        }
    };

    Step { expand, found }
}

/// Rescan the fluid network touching `origin`.
pub fn rescan<W>(world: &mut W, rules: &NetworkRules, origin: BlockPos) -> ScanReport
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    scan_exporter_network(world, ResourceKind::Fluid, origin, &FLUID_PREFIXES, |w, pos, block| {
        classify(w, rules, pos, block)
    })
}
