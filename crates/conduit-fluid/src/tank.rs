//! Tank blocks and their entities.
//!
//! A tank block does not need an entity while it is empty. One is spawned
//! the first time fluid has to go in ([`add_fluid_to_tank`]) and removed
//! again once drained ([`settle_tank`]).

use std::collections::BTreeMap;

use conduit_core::capability::{Capabilities, Capability};
use conduit_core::id::EntityId;
use conduit_core::ledger::Ledger;
use conduit_core::pos::BlockPos;
use conduit_core::tag::EMPTY_FLUID;
use conduit_core::world::{BlockAccess, EntityAccess, EntitySpawn, ScoreStore};
use conduit_topology::ResourceKind;
use conduit_topology::rules::{AXIS_STATE, NetworkRules};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Capacity per tank block, in mB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankCatalog {
    pub capacities: BTreeMap<String, u64>,
    /// Capacity for tank blocks missing from the table.
    pub default_capacity: u64,
    /// Tank entity type is this prefix followed by the substance.
    pub entity_prefix: String,
}

impl Default for TankCatalog {
    fn default() -> Self {
        let capacities = [
            ("utilitycraft:basic_fluid_tank", 8_000),
            ("utilitycraft:advanced_fluid_tank", 32_000),
            ("utilitycraft:expert_fluid_tank", 128_000),
            ("utilitycraft:ultimate_fluid_tank", 512_000),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            capacities,
            default_capacity: 8_000,
            entity_prefix: "utilitycraft:fluid_tank_".into(),
        }
    }
}

impl TankCatalog {
    pub fn capacity(&self, block_type: &str) -> u64 {
        self.capacities
            .get(block_type)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    pub fn entity_type(&self, substance: &str) -> String {
        format!("{}{substance}", self.entity_prefix)
    }
}

/// Put `amount` of `substance` into the tank block at `pos`, spawning its
/// entity first if needed. The cap is reset from the catalog and the type
/// overwritten. Returns the tank entity.
pub fn add_fluid_to_tank<W>(
    world: &mut W,
    catalog: &TankCatalog,
    pos: BlockPos,
    substance: &str,
    amount: u64,
) -> Option<EntityId>
where
    W: BlockAccess + EntityAccess + ScoreStore + ?Sized,
{
    let capacity = catalog.capacity(world.block_type(pos)?);
    let entity = match world.entity_at(pos) {
        Some(entity) => entity,
        None => {
            let spawn = EntitySpawn::new(
                catalog.entity_type(substance),
                pos,
                Capabilities::of(&[Capability::FluidContainer]),
            );
            let entity = world.spawn_entity(spawn)?;
            debug!(pos = %pos, substance, "spawned tank entity");
            entity
        }
    };
    let tank = Ledger::fluid(entity, 0);
    tank.initialize(world);
    tank.set_cap(world, capacity);
    tank.set_fluid_type(world, substance);
    tank.add(world, amount);
    Some(entity)
}

/// Remove the entity of a drained tank block. Returns whether one was
/// removed.
pub fn settle_tank<W>(world: &mut W, rules: &NetworkRules, pos: BlockPos) -> bool
where
    W: BlockAccess + EntityAccess + ScoreStore + ?Sized,
{
    if !world.block_type(pos).is_some_and(|t| rules.is_tank(t)) {
        return false;
    }
    let Some(entity) = world.entity_at(pos) else {
        return false;
    };
    if !world.capabilities(entity).contains(Capability::FluidContainer) || Ledger::fluid(entity, 0).get(world) > 0 {
        return false;
    }
    world.remove_entity(entity)
}

/// The first tank of the fluid block at `pos`, materializing an empty tank
/// entity for `substance` if the block is a bare tank. `None` if the block
/// takes no fluid, has no entity, or has no capacity.
pub fn fluid_target<W>(
    world: &mut W,
    rules: &NetworkRules,
    catalog: &TankCatalog,
    pos: BlockPos,
    substance: &str,
) -> Option<Ledger>
where
    W: BlockAccess + EntityAccess + ScoreStore + ?Sized,
{
    let block = world.block(pos)?;
    if !block.has_tag(ResourceKind::Fluid.block_tag()) {
        return None;
    }
    let is_tank = rules.is_tank(&block.type_id);
    let entity = match world.entity_at(pos) {
        Some(entity) => entity,
        None if is_tank && substance != EMPTY_FLUID => add_fluid_to_tank(world, catalog, pos, substance, 0)?,
        None => return None,
    };
    let tank = Ledger::fluid(entity, 0);
    (tank.cap(world) > 0).then_some(tank)
}

/// Move up to `amount` from the fluid block at `from` to the one at `to`.
/// Returns whether anything moved.
pub fn transfer_between<W>(
    world: &mut W,
    rules: &NetworkRules,
    catalog: &TankCatalog,
    from: BlockPos,
    to: BlockPos,
    amount: u64,
) -> bool
where
    W: BlockAccess + EntityAccess + ScoreStore + ?Sized,
{
    if !world.block_has_tag(from, ResourceKind::Fluid.block_tag()) {
        return false;
    }
    let Some(source_entity) = world.entity_at(from) else {
        return false;
    };
    let source = Ledger::fluid(source_entity, 0);
    if source.get(world) == 0 {
        return false;
    }
    let substance = source.fluid_type(world).to_string();
    let Some(target) = fluid_target(world, rules, catalog, to, &substance) else {
        return false;
    };
    source.transfer_to(world, &target, amount) > 0
}

/// Push up to `amount` from `source` (held by the block at `pos`) into
/// the block on the far side of its `axis` state.
pub fn transfer_facing<W>(
    world: &mut W,
    rules: &NetworkRules,
    catalog: &TankCatalog,
    source: &Ledger,
    pos: BlockPos,
    amount: u64,
) -> bool
where
    W: BlockAccess + EntityAccess + ScoreStore + ?Sized,
{
    if !world.is_valid(source.entity()) {
        return false;
    }
    let Some(facing) = world.block(pos).and_then(|b| b.face_state(AXIS_STATE)) else {
        return false;
    };
    let target_pos = pos.output_position(facing);
    let substance = source.fluid_type(world).to_string();
    let Some(target) = fluid_target(world, rules, catalog, target_pos, &substance) else {
        return false;
    };
    source.transfer_to(world, &target, amount) > 0
}
