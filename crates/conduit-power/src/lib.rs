//! Energy distribution for the conduit networks.
//!
//! Generators and batteries are energy sources. On each gated tick a
//! source may produce energy into its own ledger, then pushes up to its
//! transfer rate out to the containers listed in its node cache: the
//! `pos:` tags of directly touching blocks and the `net:` tags written by
//! the energy scanner.
//!
//! # Design
//!
//! - Targets are resolved at transfer time. A node whose entity vanished
//!   or lost its container capability is skipped, not an error.
//! - Batteries never charge other batteries.
//! - The source is debited once, with the total the targets accepted.

use conduit_core::capability::{Capabilities, Capability};
use conduit_core::context::SimContext;
use conduit_core::distribution::{Budget, distribute};
use conduit_core::id::EntityId;
use conduit_core::ledger::Ledger;
use conduit_core::network::{ENERGY_NODES, TransferMode, order_targets};
use conduit_core::pos::BlockPos;
use conduit_core::quantity::exact_transfer;
use conduit_core::tag::{TagPrefix, position_tag};
use conduit_core::world::{EntityAccess, ScoreStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Network transfer
// ---------------------------------------------------------------------------

/// Push up to `speed` energy from `source` to its network. Returns the
/// amount moved, which has already been consumed from the source.
///
/// `mode` overrides the entity's own `transferMode` setting.
pub fn transfer_to_network<W>(
    world: &mut W,
    source: EntityId,
    speed: u64,
    mode: Option<TransferMode>,
) -> u64
where
    W: ScoreStore + EntityAccess + ?Sized,
{
    let ledger = Ledger::energy(source);
    let budget = Budget::new(speed, ledger.get(world));
    if budget.is_exhausted() {
        return 0;
    }

    let mode = TransferMode::resolve(mode, world, source);
    let nodes = ENERGY_NODES.load(world, source);
    if nodes.is_empty() {
        return 0;
    }
    let rotation = match mode {
        TransferMode::Round => ENERGY_NODES.next_rotation(world, source, nodes.len()),
        TransferMode::Nearest | TransferMode::Farthest => 0,
    };
    let targets = order_targets(nodes, mode, rotation);
    let source_is_battery = world.capabilities(source).contains(Capability::Battery);
    // Every accepted share keeps the source on a storable value, so the
    // final consume removes exactly the total.
    let mut remaining = ledger.get(world);

    let total = distribute(&targets, mode, budget, |pos, limit| {
        let Some(target) = world.entity_at(pos) else {
            return 0;
        };
        if target == source {
            return 0;
        }
        let caps = world.capabilities(target);
        if !caps.contains(Capability::EnergyContainer)
            || (source_is_battery && caps.contains(Capability::Battery))
        {
            return 0;
        }
        let target = Ledger::energy(target);
        let bound = limit.min(target.free_space(world));
        let exact = exact_transfer(remaining, target.get(world), bound);
        let added = target.add(world, exact);
        remaining -= added;
        added
    });

    let taken = ledger.consume(world, total);
    trace!(mode = %mode, targets = targets.len(), transferred = taken, "energy transfer");
    taken
}

/// Tag the six positions around `source` as `pos:` nodes, so machines
/// touching a generator are fed without any cable.
pub fn add_nearby_machines<W: EntityAccess + ?Sized>(world: &mut W, source: EntityId) {
    let Some(pos) = world.entity_pos(source) else {
        return;
    };
    for neighbour in pos.neighbors() {
        world.add_tag(source, &position_tag(TagPrefix::Pos, neighbour));
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Per-block generator definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    pub energy_cap: u64,
    /// Tank capacity for fluid-burning generators.
    #[serde(default)]
    pub fluid_cap: Option<u64>,
    /// Energy produced per game tick while running. Zero for batteries.
    #[serde(default)]
    pub production_per_tick: u64,
    /// Transfer speed per game tick.
    pub rate_speed_base: u64,
    /// Batteries also accept energy, but never from other batteries.
    #[serde(default)]
    pub battery: bool,
}

impl GeneratorSpec {
    /// Capabilities of the entity this definition spawns.
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::of(&[Capability::EnergySource]);
        if self.battery {
            caps.insert(Capability::EnergyContainer);
            caps.insert(Capability::Battery);
        }
        if self.fluid_cap.is_some() {
            caps.insert(Capability::FluidContainer);
        }
        caps
    }
}

/// A generator that passed its tick gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generator {
    entity: EntityId,
    pos: BlockPos,
    /// Transfer budget for this activation.
    rate: u64,
    /// Production for this activation.
    production: u64,
}

/// What one generator activation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorTick {
    pub generated: u64,
    pub transferred: u64,
}

impl Generator {
    /// The generator at `pos`, if this tick is one it acts on. Rates are
    /// scaled by the tick-speed divisor since gated generators act once
    /// per `tick_speed` ticks.
    pub fn activate<W: EntityAccess + ?Sized>(
        world: &W,
        ctx: &SimContext,
        pos: BlockPos,
        spec: &GeneratorSpec,
        forced: bool,
    ) -> Option<Self> {
        if !ctx.should_act(forced) {
            return None;
        }
        let Some(entity) = world.entity_at(pos) else {
            debug!(pos = %pos, "generator block has no entity, skipping tick");
            return None;
        };
        Some(Self {
            entity,
            pos,
            rate: ctx.scaled_rate(spec.rate_speed_base),
            production: ctx.scaled_rate(spec.production_per_tick),
        })
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn rate(&self) -> u64 {
        self.rate
    }

    pub fn energy(&self) -> Ledger {
        Ledger::energy(self.entity)
    }

    /// Produce into the own ledger (saturating at the cap), then push
    /// the transfer rate out to the network.
    pub fn run<W>(&self, world: &mut W) -> GeneratorTick
    where
        W: ScoreStore + EntityAccess + ?Sized,
    {
        let generated = self.energy().add(world, self.production);
        let transferred = transfer_to_network(world, self.entity, self.rate, None);
        GeneratorTick {
            generated,
            transferred,
        }
    }
}

/// Prepare a freshly spawned generator entity: ledgers and caps from the
/// spec, adjacency tags for touching machines.
pub fn initialize_generator<W>(world: &mut W, entity: EntityId, spec: &GeneratorSpec)
where
    W: ScoreStore + EntityAccess + ?Sized,
{
    let energy = Ledger::energy(entity);
    energy.initialize(world);
    energy.set_cap(world, spec.energy_cap);
    if let Some(cap) = spec.fluid_cap {
        let tank = Ledger::fluid(entity, 0);
        tank.initialize(world);
        tank.set_cap(world, cap);
    }
    add_nearby_machines(world, entity);
}
