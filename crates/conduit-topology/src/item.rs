//! Item network scan.
//!
//! Conduits and exporters carry the search. Vanilla containers, drawer
//! blocks, container entities and item ports become endpoints; exporter
//! entities become the sources that receive them.

use conduit_core::capability::Capability;
use conduit_core::pos::BlockPos;
use conduit_core::tag::{PositionTag, TagPrefix};
use conduit_core::world::{Block, BlockAccess, EntityAccess};

use crate::ResourceKind;
use crate::rules::{NetworkRules, PORT_TAG};
use crate::scan::{Found, ScanReport, Step, port_owner, scan_exporter_network};

/// Tag prefixes an item exporter owns.
pub const ITEM_PREFIXES: [TagPrefix; 3] = [TagPrefix::Van, TagPrefix::Ent, TagPrefix::Dra];

fn classify<W>(world: &W, rules: &NetworkRules, pos: BlockPos, block: &Block) -> Step
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    let item_tag = ResourceKind::Item.block_tag();
    let expand = rules.is_item_carrier(&block.type_id);

    let found = if rules.is_vanilla_container(&block.type_id) {
        Found::Input(PositionTag::new(TagPrefix::Van, pos))
    } else if rules.is_storage(&block.type_id) {
        Found::Input(PositionTag::new(TagPrefix::Dra, pos))
    } else if block.has_tag(PORT_TAG) && block.has_tag(item_tag) {
        port_owner(world, pos)
            .and_then(|owner| world.entity_pos(owner))
            .map_or(Found::Nothing, |p| Found::Input(PositionTag::new(TagPrefix::Ent, p)))
    } else if let Some(entity) = world.entity_at(pos) {
        let caps = world.capabilities(entity);
        if caps.contains(Capability::Exporter) && block.has_tag(item_tag) {
            Found::Extractor(entity)
        } else if caps.contains(Capability::Container) {
            Found::Input(PositionTag::new(TagPrefix::Ent, pos))
        } else {
            Found::Nothing
        }
    } else {
        Found::Nothing
    };

    Step { expand, found }
}

/// Rescan the item network touching `origin`.
pub fn rescan<W>(world: &mut W, rules: &NetworkRules, origin: BlockPos) -> ScanReport
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    scan_exporter_network(world, ResourceKind::Item, origin, &ITEM_PREFIXES, |w, pos, block| {
        classify(w, rules, pos, block)
    })
}
