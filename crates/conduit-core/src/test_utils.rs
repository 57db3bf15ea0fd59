//! Shared builders for tests across the workspace.

use crate::capability::{Capabilities, Capability};
use crate::id::EntityId;
use crate::ledger::Ledger;
use crate::pos::{BlockPos, Face};
use crate::sandbox::MemoryWorld;
use crate::tag::fluid_type_tag;
use crate::world::{Block, EntityAccess, EntitySpawn, StateValue};

pub fn empty_world() -> MemoryWorld {
    MemoryWorld::new()
}

pub fn origin() -> BlockPos {
    BlockPos::new(0, 64, 0)
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Declare the six `utilitycraft:{face}` shape flags, all off.
pub fn with_shape_states(mut block: Block) -> Block {
    for face in Face::ALL {
        block = block.with_state(format!("utilitycraft:{}", face.name()), StateValue::Bool(false));
    }
    block
}

fn tube(type_id: &str, kind_tag: &str) -> Block {
    with_shape_states(
        Block::new(type_id)
            .with_tag(kind_tag)
            .with_tag("dorios:isTube"),
    )
}

fn exporter_block(type_id: &str, kind_tag: &str, face: Face) -> Block {
    with_shape_states(
        Block::new(type_id)
            .with_tag(kind_tag)
            .with_tag("dorios:isExporter")
            .with_state("minecraft:block_face", StateValue::Str(face.name().into())),
    )
}

pub fn energy_cable() -> Block {
    tube("utilitycraft:energy_cable", "dorios:energy")
}

pub fn item_conduit() -> Block {
    tube("utilitycraft:item_conduit", "dorios:item")
}

pub fn fluid_pipe() -> Block {
    tube("utilitycraft:fluid_pipe", "dorios:fluid")
}

pub fn item_exporter(face: Face) -> Block {
    exporter_block("utilitycraft:item_exporter", "dorios:item", face)
}

pub fn fluid_extractor(face: Face) -> Block {
    exporter_block("utilitycraft:fluid_extractor", "dorios:fluid", face)
}

/// A port block for `kind` (`"energy"`, `"item"`, `"fluid"`).
pub fn port_block(kind: &str) -> Block {
    Block::new("utilitycraft:port")
        .with_tag(format!("dorios:{kind}"))
        .with_tag("dorios:port")
}

pub fn tank_block(type_id: &str) -> Block {
    Block::new(type_id)
        .with_tag("dorios:fluid")
        .with_state("utilitycraft:axis", StateValue::Str("north".into()))
}

pub fn chest() -> Block {
    Block::new("minecraft:chest")
}

pub fn drawer() -> Block {
    Block::new("dustveyn:storage_drawers_oak")
}

/// Place `n` copies of `block` starting one step from `from` toward
/// `face`. Returns the last position placed.
pub fn lay_line(world: &mut MemoryWorld, from: BlockPos, face: Face, n: usize, block: &Block) -> BlockPos {
    let mut pos = from;
    for _ in 0..n {
        pos = pos.step(face);
        world.set_block(pos, block.clone());
    }
    pos
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

fn spawn(world: &mut MemoryWorld, type_id: &str, pos: BlockPos, caps: &[Capability]) -> EntityId {
    world
        .spawn_entity(EntitySpawn::new(type_id, pos, Capabilities::of(caps)))
        .expect("memory world always spawns")
}

fn fill_energy(world: &mut MemoryWorld, id: EntityId, amount: u64, cap: u64) {
    let ledger = Ledger::energy(id);
    ledger.initialize(world);
    ledger.set_cap(world, cap);
    ledger.set(world, amount);
}

/// A battery block and entity: source, container and battery.
pub fn battery(world: &mut MemoryWorld, pos: BlockPos, amount: u64, cap: u64) -> EntityId {
    world.set_block(pos, Block::new("utilitycraft:basic_battery").with_tag("dorios:energy"));
    let id = spawn(
        world,
        "utilitycraft:machine",
        pos,
        &[
            Capability::EnergySource,
            Capability::EnergyContainer,
            Capability::Battery,
        ],
    );
    fill_energy(world, id, amount, cap);
    id
}

/// A generator block and entity.
pub fn generator(world: &mut MemoryWorld, pos: BlockPos, amount: u64, cap: u64) -> EntityId {
    world.set_block(pos, Block::new("utilitycraft:solar_panel").with_tag("dorios:energy"));
    let id = spawn(world, "utilitycraft:machine", pos, &[Capability::EnergySource]);
    fill_energy(world, id, amount, cap);
    id
}

/// A machine that accepts energy.
pub fn machine(world: &mut MemoryWorld, pos: BlockPos, amount: u64, cap: u64) -> EntityId {
    world.set_block(
        pos,
        Block::new("utilitycraft:crusher")
            .with_tag("dorios:energy")
            .with_tag("dorios:item"),
    );
    let id = spawn(
        world,
        "utilitycraft:machine",
        pos,
        &[Capability::EnergyContainer, Capability::Container],
    );
    fill_energy(world, id, amount, cap);
    world.add_inventory(pos, 64);
    id
}

/// A basic tank block with a tank entity holding `amount` of `substance`.
pub fn tank_entity(
    world: &mut MemoryWorld,
    pos: BlockPos,
    substance: &str,
    amount: u64,
    cap: u64,
) -> EntityId {
    world.set_block(pos, tank_block("utilitycraft:basic_fluid_tank"));
    let id = spawn(
        world,
        &format!("utilitycraft:fluid_tank_{substance}"),
        pos,
        &[Capability::FluidContainer],
    );
    world.add_tag(id, &fluid_type_tag(0, substance));
    let ledger = Ledger::fluid(id, 0);
    ledger.initialize(world);
    ledger.set_cap(world, cap);
    ledger.set(world, amount);
    id
}

/// An exporter block (`item_exporter` or `fluid_extractor`) with its pipe
/// entity.
pub fn exporter(world: &mut MemoryWorld, pos: BlockPos, block: Block) -> EntityId {
    world.set_block(pos, block);
    spawn(world, "utilitycraft:pipe", pos, &[Capability::Exporter])
}

/// A container entity with an inventory, on a plain item-tagged block.
pub fn container(world: &mut MemoryWorld, pos: BlockPos, capacity: u32) -> EntityId {
    world.set_block(pos, Block::new("utilitycraft:crate").with_tag("dorios:item"));
    world.add_inventory(pos, capacity);
    spawn(world, "utilitycraft:crate", pos, &[Capability::Container])
}
