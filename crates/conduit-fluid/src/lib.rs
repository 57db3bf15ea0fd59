//! Fluid movement: tank blocks, extractors and fluid container items.
//!
//! A fluid extractor is mounted on a tank or machine and drains its first
//! tank into the `ent:` endpoints the fluid scanner wrote onto the
//! extractor. Fluids never mix: a target takes fluid only while it is
//! empty or already holds the same substance, and an empty target
//! inherits the source's substance. Bare tank blocks get their entity on
//! first fill.

pub mod container;
pub mod tank;

use conduit_core::capability::Capability;
use conduit_core::distribution::{Budget, distribute};
use conduit_core::id::EntityId;
use conduit_core::ledger::Ledger;
use conduit_core::network::{FLUID_NODES, TransferMode, order_targets};
use conduit_core::pos::BlockPos;
use conduit_core::quantity::exact_transfer;
use conduit_core::tag::EMPTY_FLUID;
use conduit_core::world::{BlockAccess, EntityAccess, ScoreStore};
use conduit_topology::ResourceKind;
use conduit_topology::rules::NetworkRules;
use conduit_topology::scan::attached_source;
use tracing::trace;

pub use container::{FluidContainerItem, FluidItemTable, ItemInteraction, fluid_item};
pub use tank::{TankCatalog, add_fluid_to_tank, fluid_target, settle_tank, transfer_between, transfer_facing};

/// Offer up to `speed` of `source`'s fluid to `targets`, already ordered
/// for `mode`. Returns the amount moved, which has been consumed from the
/// source.
pub fn transfer_to_network<W>(
    world: &mut W,
    rules: &NetworkRules,
    catalog: &TankCatalog,
    source: &Ledger,
    speed: u64,
    mode: TransferMode,
    targets: &[BlockPos],
) -> u64
where
    W: BlockAccess + EntityAccess + ScoreStore + ?Sized,
{
    let substance = source.fluid_type(world).to_string();
    if substance == EMPTY_FLUID {
        return 0;
    }
    let budget = Budget::new(speed, source.get(world));
    let source_entity = source.entity();
    let mut remaining = source.get(world);

    let total = distribute(targets, mode, budget, |pos, limit| {
        let Some(target) = fluid_target(world, rules, catalog, pos, &substance) else {
            return 0;
        };
        if target.entity() == source_entity {
            return 0;
        }
        let held = target.fluid_type(world);
        if held != EMPTY_FLUID && held != substance {
            return 0;
        }
        if target.free_space(world) == 0 {
            return 0;
        }
        let bound = limit.min(target.free_space(world));
        let exact = exact_transfer(remaining, target.get(world), bound);
        if exact == 0 {
            return 0;
        }
        if held == EMPTY_FLUID {
            target.set_fluid_type(world, &substance);
        }
        let added = target.add(world, exact);
        remaining -= added;
        added
    });

    source.consume(world, total)
}

/// One extractor activation: drain the block it is mounted on into its
/// network. Returns the amount moved.
pub fn run_extractor<W>(
    world: &mut W,
    rules: &NetworkRules,
    catalog: &TankCatalog,
    extractor: EntityId,
    speed: u64,
    mode: Option<TransferMode>,
) -> u64
where
    W: BlockAccess + EntityAccess + ScoreStore + ?Sized,
{
    let Some(source_pos) = attached_source(world, extractor) else {
        return 0;
    };
    if !world.block_has_tag(source_pos, ResourceKind::Fluid.block_tag()) {
        return 0;
    }
    let Some(source_entity) = world.entity_at(source_pos) else {
        return 0;
    };
    if !world.capabilities(source_entity).contains(Capability::FluidContainer) {
        return 0;
    }
    let source = Ledger::fluid(source_entity, 0);
    if source.get(world) == 0 {
        return 0;
    }

    let mode = TransferMode::resolve(mode, world, extractor);
    let nodes = FLUID_NODES.load(world, extractor);
    if nodes.is_empty() {
        return 0;
    }
    let rotation = match mode {
        TransferMode::Round => FLUID_NODES.next_rotation(world, extractor, nodes.len()),
        TransferMode::Nearest | TransferMode::Farthest => 0,
    };
    let targets = order_targets(nodes, mode, rotation);

    let moved = transfer_to_network(world, rules, catalog, &source, speed, mode, &targets);
    if moved > 0 {
        settle_tank(world, rules, source_pos);
    }
    trace!(mode = %mode, targets = targets.len(), moved, "fluid transfer");
    moved
}
