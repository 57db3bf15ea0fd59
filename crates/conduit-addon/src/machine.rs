//! Machine and generator entities: spawning on placement with state
//! carried in item lore, and capture on destruction.

use conduit_core::capability::{Capabilities, Capability};
use conduit_core::id::EntityId;
use conduit_core::ledger::Ledger;
use conduit_core::lore::StoredResources;
use conduit_core::pos::BlockPos;
use conduit_core::world::{BlockAccess, EntityAccess, EntitySpawn, ScoreStore};
use conduit_data::{AddonConfig, MachineSpec};
use conduit_power::{GeneratorSpec, initialize_generator};
use conduit_topology::ResourceKind;
use tracing::{debug, warn};

use crate::error::PlaceError;

/// Entity type spawned for machines and generators.
pub const MACHINE_ENTITY: &str = "utilitycraft:machine";
/// Entity type spawned for item exporters and fluid extractors.
pub const PIPE_ENTITY: &str = "utilitycraft:pipe";

/// What was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placed {
    Generator(EntityId),
    Machine(EntityId),
}

impl Placed {
    pub fn entity(self) -> EntityId {
        match self {
            Placed::Generator(id) | Placed::Machine(id) => id,
        }
    }
}

fn machine_capabilities(spec: &MachineSpec, has_items: bool) -> Capabilities {
    let mut caps = Capabilities::default();
    if spec.energy_cap > 0 {
        caps.insert(Capability::EnergyContainer);
    }
    if has_items {
        caps.insert(Capability::Container);
    }
    if spec.fluid_cap.is_some() {
        caps.insert(Capability::FluidContainer);
    }
    caps
}

/// Parse lore, dropping what the block cannot hold. Malformed lore is
/// logged and ignored.
fn stored_from_lore<S: AsRef<str>>(lore: &[S], pos: BlockPos, has_tank: bool) -> StoredResources {
    let mut stored = match StoredResources::from_lore(lore) {
        Ok(stored) => stored,
        Err(err) => {
            warn!(pos = %pos, error = %err, "ignoring unreadable lore");
            StoredResources::default()
        }
    };
    if !has_tank {
        stored.fluid = None;
    }
    stored
}

fn spawn_at<W>(world: &mut W, pos: BlockPos, type_id: &str, caps: Capabilities) -> Result<EntityId, PlaceError>
where
    W: EntityAccess + ?Sized,
{
    if world.entity_at(pos).is_some() {
        return Err(PlaceError::Occupied(pos));
    }
    world
        .spawn_entity(EntitySpawn::new(type_id, pos, caps))
        .ok_or(PlaceError::SpawnFailed(pos))
}

fn place_generator<W>(world: &mut W, pos: BlockPos, spec: &GeneratorSpec, stored: &StoredResources) -> Result<EntityId, PlaceError>
where
    W: EntityAccess + ScoreStore + ?Sized,
{
    let entity = spawn_at(world, pos, MACHINE_ENTITY, spec.capabilities())?;
    initialize_generator(world, entity, spec);
    stored.restore(world, entity);
    Ok(entity)
}

fn place_consumer<W>(world: &mut W, pos: BlockPos, spec: &MachineSpec, has_items: bool, stored: &StoredResources) -> Result<EntityId, PlaceError>
where
    W: EntityAccess + ScoreStore + ?Sized,
{
    let entity = spawn_at(world, pos, MACHINE_ENTITY, machine_capabilities(spec, has_items))?;
    let energy = Ledger::energy(entity);
    energy.initialize(world);
    energy.set_cap(world, spec.energy_cap);
    if let Some(cap) = spec.fluid_cap {
        let tank = Ledger::fluid(entity, 0);
        tank.initialize(world);
        tank.set_cap(world, cap);
    }
    stored.restore(world, entity);
    Ok(entity)
}

/// Spawn the entity for the machine or generator block at `pos` and
/// restore the energy and fluid recorded in `lore`.
pub fn place_machine<W, S>(world: &mut W, config: &AddonConfig, pos: BlockPos, lore: &[S]) -> Result<Placed, PlaceError>
where
    W: BlockAccess + EntityAccess + ScoreStore + ?Sized,
    S: AsRef<str>,
{
    let block = world.block(pos).ok_or(PlaceError::NoBlock(pos))?;
    let block_type = block.type_id.clone();
    let has_items = block.has_tag(ResourceKind::Item.block_tag());

    let placed = if let Some(spec) = config.generator(&block_type) {
        let stored = stored_from_lore(lore, pos, spec.fluid_cap.is_some());
        Placed::Generator(place_generator(world, pos, spec, &stored)?)
    } else if let Some(spec) = config.machine(&block_type) {
        let stored = stored_from_lore(lore, pos, spec.fluid_cap.is_some());
        Placed::Machine(place_consumer(world, pos, spec, has_items, &stored)?)
    } else {
        return Err(PlaceError::UnknownBlock(block_type));
    };
    debug!(pos = %pos, block = %block_type, "placed machine");
    Ok(placed)
}

/// Remove the machine entity at `pos`, returning the lore lines its item
/// should carry. `None` if there is no entity.
pub fn destroy_machine<W>(world: &mut W, pos: BlockPos) -> Option<Vec<String>>
where
    W: EntityAccess + ScoreStore + ?Sized,
{
    let entity = world.entity_at(pos)?;
    let lore = StoredResources::capture(world, entity).to_lore();
    world.remove_entity(entity);
    debug!(pos = %pos, lines = lore.len(), "destroyed machine");
    Some(lore)
}

/// Make sure the exporter or extractor block at `pos` has its pipe entity.
pub fn ensure_pipe_entity<W>(world: &mut W, pos: BlockPos) -> Option<EntityId>
where
    W: EntityAccess + ?Sized,
{
    if let Some(existing) = world.entity_at(pos) {
        return Some(existing);
    }
    world.spawn_entity(EntitySpawn::new(
        PIPE_ENTITY,
        pos,
        Capabilities::of(&[Capability::Exporter]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::lore::{energy_line, fluid_line};
    use conduit_core::sandbox::MemoryWorld;
    use conduit_core::tag::{TagPrefix, position_tag};
    use conduit_core::test_utils::*;
    use conduit_core::world::Block;

    const PANEL: &str = "utilitycraft:solar_panel";
    const CRUSHER: &str = "utilitycraft:crusher";
    const BOILER: &str = "utilitycraft:boiler";

    fn config() -> AddonConfig {
        let mut config = AddonConfig::default();
        config.generators.insert(
            PANEL.into(),
            GeneratorSpec {
                energy_cap: 64_000,
                fluid_cap: None,
                production_per_tick: 4,
                rate_speed_base: 40,
                battery: false,
            },
        );
        config.machines.insert(
            CRUSHER.into(),
            MachineSpec {
                energy_cap: 32_000,
                fluid_cap: None,
            },
        );
        config.machines.insert(
            BOILER.into(),
            MachineSpec {
                energy_cap: 8_000,
                fluid_cap: Some(16_000),
            },
        );
        config
    }

    fn place_block(world: &mut MemoryWorld, type_id: &str) {
        world.set_block(
            origin(),
            Block::new(type_id)
                .with_tag("dorios:energy")
                .with_tag("dorios:item"),
        );
    }

    #[test]
    fn generator_restores_energy_and_tags_neighbours() {
        let mut world = empty_world();
        place_block(&mut world, PANEL);
        let lore = [energy_line(15_300, 64_000)];

        let placed = place_machine(&mut world, &config(), origin(), &lore).unwrap();
        let Placed::Generator(id) = placed else {
            panic!("expected a generator, got {placed:?}");
        };
        assert_eq!(Ledger::energy(id).get(&world), 15_300);
        assert_eq!(Ledger::energy(id).cap(&world), 64_000);
        assert!(world.capabilities(id).contains(Capability::EnergySource));
        assert!(world.has_tag(id, &position_tag(TagPrefix::Pos, origin().offset(0, 1, 0))));
    }

    #[test]
    fn machine_caps_come_from_config() {
        let mut world = empty_world();
        place_block(&mut world, CRUSHER);
        let no_lore: [&str; 0] = [];

        let id = place_machine(&mut world, &config(), origin(), &no_lore)
            .unwrap()
            .entity();
        let caps = world.capabilities(id);
        assert!(caps.contains(Capability::EnergyContainer));
        assert!(caps.contains(Capability::Container));
        assert!(!caps.contains(Capability::FluidContainer));
        assert_eq!(Ledger::energy(id).cap(&world), 32_000);
        assert_eq!(Ledger::energy(id).get(&world), 0);
    }

    #[test]
    fn fluid_lore_only_restores_into_tanks() {
        let lore = [energy_line(1_000, 8_000), fluid_line("water", 5_000, 16_000)];

        let mut world = empty_world();
        place_block(&mut world, BOILER);
        let id = place_machine(&mut world, &config(), origin(), &lore).unwrap().entity();
        let tank = Ledger::fluid(id, 0);
        assert_eq!(tank.get(&world), 5_000);
        assert_eq!(tank.fluid_type(&world), "water");
        assert_eq!(tank.cap(&world), 16_000);

        let mut world = empty_world();
        place_block(&mut world, CRUSHER);
        let id = place_machine(&mut world, &config(), origin(), &lore).unwrap().entity();
        assert_eq!(Ledger::energy(id).get(&world), 1_000);
        assert_eq!(Ledger::fluid(id, 0).get(&world), 0);
    }

    #[test]
    fn full_machine_lore_restores_at_capacity() {
        let mut config = config();
        config.machines.insert(
            CRUSHER.into(),
            MachineSpec {
                energy_cap: 1_048_576,
                fluid_cap: None,
            },
        );
        let lore = [energy_line(1_048_576, 1_048_576)];
        assert_eq!(lore[0], "§r§7  Energy: 1.05 MDE/1.05 MDE");

        let mut world = empty_world();
        place_block(&mut world, CRUSHER);
        let id = place_machine(&mut world, &config, origin(), &lore).unwrap().entity();
        let energy = Ledger::energy(id);
        assert_eq!(energy.get(&world), 1_048_576);
        assert!(energy.get(&world) <= energy.cap(&world));
    }

    #[test]
    fn bad_lore_is_ignored() {
        let mut world = empty_world();
        place_block(&mut world, CRUSHER);
        let lore = ["§r§7  Energy: lots"];
        let id = place_machine(&mut world, &config(), origin(), &lore).unwrap().entity();
        assert_eq!(Ledger::energy(id).get(&world), 0);
    }

    #[test]
    fn placement_errors() {
        let no_lore: [&str; 0] = [];
        let mut world = empty_world();
        assert_eq!(
            place_machine(&mut world, &config(), origin(), &no_lore),
            Err(PlaceError::NoBlock(origin()))
        );

        world.set_block(origin(), chest());
        assert_eq!(
            place_machine(&mut world, &config(), origin(), &no_lore),
            Err(PlaceError::UnknownBlock("minecraft:chest".into()))
        );

        place_block(&mut world, CRUSHER);
        place_machine(&mut world, &config(), origin(), &no_lore).unwrap();
        assert_eq!(
            place_machine(&mut world, &config(), origin(), &no_lore),
            Err(PlaceError::Occupied(origin()))
        );
    }

    #[test]
    fn destroy_round_trips_through_lore() {
        let mut world = empty_world();
        place_block(&mut world, BOILER);
        let no_lore: [&str; 0] = [];
        let id = place_machine(&mut world, &config(), origin(), &no_lore).unwrap().entity();
        Ledger::energy(id).set(&mut world, 2_500);
        Ledger::fluid(id, 0).try_insert(&mut world, "lava", 3_000);

        let lore = destroy_machine(&mut world, origin()).unwrap();
        assert!(!world.is_valid(id));
        assert_eq!(destroy_machine(&mut world, origin()), None);

        let again = place_machine(&mut world, &config(), origin(), &lore).unwrap().entity();
        assert_eq!(Ledger::energy(again).get(&world), 2_500);
        assert_eq!(Ledger::fluid(again, 0).get(&world), 3_000);
        assert_eq!(Ledger::fluid(again, 0).fluid_type(&world), "lava");
    }

    #[test]
    fn pipe_entities_are_spawned_once() {
        let mut world = empty_world();
        let first = ensure_pipe_entity(&mut world, origin()).unwrap();
        assert_eq!(ensure_pipe_entity(&mut world, origin()), Some(first));
        assert_eq!(world.entity_type(first), Some(PIPE_ENTITY));
        assert!(world.capabilities(first).contains(Capability::Exporter));
    }
}
