//! The event-hook façade.
//!
//! [`Addon`] owns the tick state, the deferred-task queue and the registry
//! of active sources. The host forwards its events (world load and unload,
//! block place and break, script events, game ticks) and [`Addon`] routes
//! them to the scanners and distribution engines.

use std::collections::{BTreeMap, BTreeSet};

use conduit_core::context::SimContext;
use conduit_core::id::EntityId;
use conduit_core::pos::BlockPos;
use conduit_core::schedule::Scheduler;
use conduit_core::tag::EMPTY_FLUID;
use conduit_core::world::{Block, World};
use conduit_data::AddonConfig;
use conduit_fluid::{ItemInteraction, fluid_item, fluid_target, run_extractor, settle_tank};
use conduit_items::run_exporter;
use conduit_power::Generator;
use conduit_topology::pipes::{PipeUpdate, kinds_on_place, on_block_broken, on_block_placed, update_pipes};
use conduit_topology::signal::{RESCAN_EVENT_ID, RescanSignal, SignalError};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::PlaceError;
use crate::machine::{Placed, destroy_machine, ensure_pipe_entity, place_machine};
use crate::task::Task;

/// A block that acts on gated ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// Generator or battery, looked up in the config by block type.
    Generator { block_type: String },
    ItemExporter,
    FluidExtractor,
}

/// What one [`Addon::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Deferred tasks that ran.
    pub tasks: usize,
    /// Sources that acted.
    pub active_sources: usize,
    pub energy_generated: u64,
    pub energy_moved: u64,
    pub items_moved: u64,
    pub fluid_moved: u64,
}

pub struct Addon {
    config: AddonConfig,
    ctx: SimContext,
    scheduler: Scheduler<Task>,
    sources: BTreeMap<BlockPos, SourceKind>,
    /// Generators that have not acted yet. Their first activation ignores
    /// the tick gate.
    fresh: BTreeSet<BlockPos>,
}

impl Addon {
    pub fn new(config: AddonConfig) -> Self {
        let ctx = SimContext::new(config.timing.tick_speed, config.timing.tick_wrap);
        Self {
            config,
            ctx,
            scheduler: Scheduler::new(),
            sources: BTreeMap::new(),
            fresh: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &AddonConfig {
        &self.config
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn sources(&self) -> &BTreeMap<BlockPos, SourceKind> {
        &self.sources
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Track a source the host already knows about, e.g. after reloading a
    /// saved world.
    pub fn register_source(&mut self, pos: BlockPos, kind: SourceKind) {
        if matches!(kind, SourceKind::Generator { .. }) {
            self.fresh.insert(pos);
        }
        self.sources.insert(pos, kind);
    }

    pub fn unregister_source(&mut self, pos: BlockPos) -> Option<SourceKind> {
        self.fresh.remove(&pos);
        self.sources.remove(&pos)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Sources start acting once the load delay has passed. Every known
    /// generator acts on the first tick after that.
    pub fn on_world_load(&mut self) {
        let generators = self
            .sources
            .iter()
            .filter(|(_, kind)| matches!(kind, SourceKind::Generator { .. }))
            .map(|(&pos, _)| pos);
        self.fresh.extend(generators);
        let now = self.ctx.elapsed();
        self.scheduler
            .run_after(now, self.config.timing.world_load_delay, Task::WorldLoaded);
        debug!(delay = self.config.timing.world_load_delay, "world load scheduled");
    }

    /// Drop pending work and stop all sources.
    pub fn on_world_unload(&mut self) {
        self.ctx.unload();
        self.scheduler.clear();
        debug!("world unloaded");
    }

    // -----------------------------------------------------------------------
    // Block hooks
    // -----------------------------------------------------------------------

    fn exporter_kind(&self, block: &Block) -> Option<SourceKind> {
        let rules = &self.config.rules;
        if rules.item.exporters.contains(&block.type_id) {
            Some(SourceKind::ItemExporter)
        } else if rules.fluid.extractors.contains(&block.type_id) {
            Some(SourceKind::FluidExtractor)
        } else {
            None
        }
    }

    /// A block was placed. Exporters and extractors get their entity and
    /// start acting; every network the block joins is rescanned now.
    pub fn on_block_placed<W: World + ?Sized>(&mut self, world: &mut W, pos: BlockPos) -> Vec<PipeUpdate> {
        let exporter = world.block(pos).and_then(|b| self.exporter_kind(b));
        if let Some(kind) = exporter {
            if ensure_pipe_entity(world, pos).is_some() {
                self.sources.insert(pos, kind);
            } else {
                warn!(pos = %pos, "host refused to spawn exporter entity");
            }
        }
        on_block_placed(world, &self.config.rules, pos)
    }

    /// A block was broken. `broken` is the block as it was; the rescan
    /// runs on the next tick.
    pub fn on_block_broken<W: World + ?Sized>(&mut self, world: &mut W, pos: BlockPos, broken: Block) {
        self.fresh.remove(&pos);
        let was_exporter = matches!(
            self.sources.remove(&pos),
            Some(SourceKind::ItemExporter | SourceKind::FluidExtractor)
        );
        if was_exporter && let Some(entity) = world.entity_at(pos) {
            world.remove_entity(entity);
        }
        self.scheduler
            .run_next_tick(self.ctx.elapsed(), Task::BlockBroken { pos, broken });
    }

    /// Handle a script event. Returns `Ok(None)` for events addressed to
    /// someone else.
    pub fn on_script_event<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        id: &str,
        payload: &str,
    ) -> Result<Option<PipeUpdate>, SignalError> {
        if id != RESCAN_EVENT_ID {
            return Ok(None);
        }
        let signal = RescanSignal::parse(payload).inspect_err(|err| {
            warn!(payload, error = %err, "malformed rescan request");
        })?;
        Ok(Some(update_pipes(world, &self.config.rules, signal.pos, signal.kind)))
    }

    // -----------------------------------------------------------------------
    // Machines
    // -----------------------------------------------------------------------

    /// A machine or generator block was placed with `lore` on its item.
    /// The entity is spawned now; its networks are rescanned after the
    /// configured delay. A generator acts on the next tick regardless of
    /// the tick gate.
    pub fn place_machine<W, S>(&mut self, world: &mut W, pos: BlockPos, lore: &[S]) -> Result<EntityId, PlaceError>
    where
        W: World + ?Sized,
        S: AsRef<str>,
    {
        let placed = place_machine(world, &self.config, pos, lore)?;
        let block = world.block(pos).cloned().unwrap_or_default();
        if let Placed::Generator(_) = placed {
            self.fresh.insert(pos);
            self.sources.insert(
                pos,
                SourceKind::Generator {
                    block_type: block.type_id.clone(),
                },
            );
        }
        let now = self.ctx.elapsed();
        for kind in kinds_on_place(&self.config.rules, &block) {
            self.scheduler
                .run_after(now, self.config.timing.rescan_delay, Task::Rescan { kind, pos });
        }
        Ok(placed.entity())
    }

    /// A machine or generator block is being destroyed. Returns the lore
    /// for the dropped item. The host still reports the break through
    /// [`Addon::on_block_broken`].
    pub fn destroy_machine<W: World + ?Sized>(&mut self, world: &mut W, pos: BlockPos) -> Option<Vec<String>> {
        self.sources.remove(&pos);
        self.fresh.remove(&pos);
        destroy_machine(world, pos)
    }

    /// A player used `item` on the fluid block at `pos`.
    pub fn use_item_on_tank<W: World + ?Sized>(
        &self,
        world: &mut W,
        pos: BlockPos,
        item: &str,
    ) -> Option<ItemInteraction> {
        let table = &self.config.fluid_items;
        let substance = table
            .containers
            .get(item)
            .map_or(EMPTY_FLUID, |c| c.substance.as_str());
        let tank = fluid_target(world, &self.config.rules, &self.config.tanks, pos, substance)?;
        let result = fluid_item(world, &tank, table, item);
        settle_tank(world, &self.config.rules, pos);
        result
    }

    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    fn run_task<W: World + ?Sized>(&mut self, world: &mut W, task: Task) {
        match task {
            Task::WorldLoaded => {
                self.ctx.mark_world_loaded();
                debug!("world loaded, sources active");
            }
            Task::Rescan { kind, pos } => {
                update_pipes(world, &self.config.rules, pos, kind);
            }
            Task::BlockBroken { pos, broken } => {
                on_block_broken(world, &self.config.rules, pos, &broken);
            }
        }
    }

    /// Let sources act. Off the gate only fresh generators run.
    fn drive_sources<W: World + ?Sized>(&mut self, world: &mut W, gated: bool, report: &mut TickReport) {
        let item_speed = self.ctx.scaled_rate(self.config.exporters.item);
        let fluid_speed = self.ctx.scaled_rate(self.config.exporters.fluid);

        for (&pos, kind) in &self.sources {
            match kind {
                SourceKind::Generator { block_type } => {
                    let Some(spec) = self.config.generator(block_type) else {
                        warn!(pos = %pos, block = %block_type, "generator has no definition");
                        continue;
                    };
                    let forced = self.fresh.contains(&pos);
                    let Some(generator) = Generator::activate(world, &self.ctx, pos, spec, forced) else {
                        continue;
                    };
                    self.fresh.remove(&pos);
                    let tick = generator.run(world);
                    report.active_sources += 1;
                    report.energy_generated += tick.generated;
                    report.energy_moved += tick.transferred;
                }
                SourceKind::ItemExporter if gated => {
                    let Some(entity) = world.entity_at(pos) else {
                        debug!(pos = %pos, "exporter has no entity, skipping tick");
                        continue;
                    };
                    report.active_sources += 1;
                    if let Some(transfer) = run_exporter(world, entity, item_speed, None) {
                        report.items_moved += u64::from(transfer.moved);
                    }
                }
                SourceKind::FluidExtractor if gated => {
                    let Some(entity) = world.entity_at(pos) else {
                        debug!(pos = %pos, "extractor has no entity, skipping tick");
                        continue;
                    };
                    report.active_sources += 1;
                    report.fluid_moved +=
                        run_extractor(world, &self.config.rules, &self.config.tanks, entity, fluid_speed, None);
                }
                SourceKind::ItemExporter | SourceKind::FluidExtractor => {}
            }
        }
    }

    /// Advance one game tick: run due tasks, then, once the world has
    /// loaded, let sources act. Everything acts on gated ticks; generators
    /// that have not acted yet also run in between.
    pub fn tick<W: World + ?Sized>(&mut self, world: &mut W) -> TickReport {
        self.ctx.advance();
        let mut report = TickReport::default();

        for task in self.scheduler.drain_due(self.ctx.elapsed()) {
            self.run_task(world, task);
            report.tasks += 1;
        }

        if self.ctx.is_world_loaded() {
            let gated = self.ctx.should_act(false);
            if gated || !self.fresh.is_empty() {
                self.drive_sources(world, gated, &mut report);
            }
        }
        trace!(
            tick = self.ctx.tick_count(),
            tasks = report.tasks,
            sources = report.active_sources,
            "tick"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::capability::Capability;
    use conduit_core::ledger::Ledger;
    use conduit_core::pos::Face;
    use conduit_core::sandbox::MemoryWorld;
    use conduit_core::test_utils::*;
    use conduit_core::world::{EntityAccess, Inventories};
    use conduit_power::GeneratorSpec;

    const PANEL: &str = "utilitycraft:solar_panel";

    fn addon() -> Addon {
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
        Addon::new(config)
    }

    fn run_ticks(addon: &mut Addon, world: &mut MemoryWorld, n: usize) -> TickReport {
        let mut total = TickReport::default();
        for _ in 0..n {
            let r = addon.tick(world);
            total.tasks += r.tasks;
            total.active_sources += r.active_sources;
            total.energy_generated += r.energy_generated;
            total.energy_moved += r.energy_moved;
            total.items_moved += r.items_moved;
            total.fluid_moved += r.fluid_moved;
        }
        total
    }

    #[test]
    fn sources_wait_for_the_load_delay() {
        let mut addon = addon();
        let mut world = empty_world();
        addon.on_world_load();
        run_ticks(&mut addon, &mut world, 49);
        assert!(!addon.context().is_world_loaded());
        run_ticks(&mut addon, &mut world, 1);
        assert!(addon.context().is_world_loaded());

        addon.on_world_unload();
        assert!(!addon.context().is_world_loaded());
        assert_eq!(addon.pending_tasks(), 0);
    }

    #[test]
    fn placed_generator_feeds_its_neighbour() {
        let mut addon = addon();
        let mut world = empty_world();
        world.set_block(origin(), conduit_core::world::Block::new(PANEL).with_tag("dorios:energy"));
        let consumer = machine(&mut world, origin().step(Face::East), 0, 10_000);
        let no_lore: [&str; 0] = [];

        addon.place_machine(&mut world, origin(), &no_lore).unwrap();
        assert_eq!(addon.pending_tasks(), 1);
        addon.on_world_load();

        let report = run_ticks(&mut addon, &mut world, 60);
        // Gated activations at ticks 50 and 60, 40 generated each.
        assert_eq!(report.energy_generated, 80);
        assert_eq!(report.energy_moved, 80);
        assert_eq!(Ledger::energy(consumer).get(&world), 80);
    }

    #[test]
    fn generator_placed_between_gated_ticks_acts_at_once() {
        let mut addon = addon();
        let mut world = empty_world();
        addon.on_world_load();
        run_ticks(&mut addon, &mut world, 53);
        assert!(addon.context().is_world_loaded());

        world.set_block(origin(), conduit_core::world::Block::new(PANEL).with_tag("dorios:energy"));
        let consumer = machine(&mut world, origin().step(Face::East), 0, 10_000);
        let no_lore: [&str; 0] = [];
        addon.place_machine(&mut world, origin(), &no_lore).unwrap();

        // Tick 54 is off the gate.
        let first = addon.tick(&mut world);
        assert_eq!(first.active_sources, 1);
        assert_eq!(first.energy_generated, 40);
        assert_eq!(Ledger::energy(consumer).get(&world), 40);

        // Later activations follow the gate again: only tick 60 acts.
        let report = run_ticks(&mut addon, &mut world, 5);
        assert_eq!(report.energy_generated, 0);
        let report = run_ticks(&mut addon, &mut world, 1);
        assert_eq!(report.energy_generated, 40);
        assert_eq!(Ledger::energy(consumer).get(&world), 80);
    }

    #[test]
    fn reloaded_world_runs_known_generators_once() {
        let mut addon = addon();
        let mut world = empty_world();
        world.set_block(origin(), conduit_core::world::Block::new(PANEL).with_tag("dorios:energy"));
        let no_lore: [&str; 0] = [];
        addon.place_machine(&mut world, origin(), &no_lore).unwrap();
        addon.on_world_load();
        run_ticks(&mut addon, &mut world, 50);

        addon.on_world_unload();
        run_ticks(&mut addon, &mut world, 2);
        // The reload completes off the gate.
        addon.on_world_load();
        let report = run_ticks(&mut addon, &mut world, 50);
        assert_eq!(report.energy_generated, 40);
        let report = run_ticks(&mut addon, &mut world, 8);
        assert_eq!(report.energy_generated, 40);
    }

    #[test]
    fn exporter_lifecycle() {
        let mut addon = addon();
        let mut world = empty_world();
        let source = origin().step(Face::Down);
        world.set_block(source, chest());
        world.add_inventory(source, 64);
        world.insert_items(source, "minecraft:iron_ingot", 30);
        let target = origin().offset(1, 1, 0);
        container(&mut world, target, 64);
        world.set_block(origin().offset(1, 0, 0), item_conduit());
        addon.on_block_placed(&mut world, origin().offset(1, 0, 0));

        world.set_block(origin(), item_exporter(Face::Up));
        addon.on_block_placed(&mut world, origin());
        let entity = world.entity_at(origin()).unwrap();
        assert!(world.capabilities(entity).contains(Capability::Exporter));
        assert_eq!(addon.sources().get(&origin()), Some(&SourceKind::ItemExporter));

        addon.on_world_load();
        let report = run_ticks(&mut addon, &mut world, 50);
        assert_eq!(report.items_moved, 10);
        assert_eq!(world.inventory(target).map(|i| i.count_of("minecraft:iron_ingot")), Some(10));

        let broken = world.remove_block(origin()).unwrap();
        addon.on_block_broken(&mut world, origin(), broken);
        assert!(!world.is_valid(entity));
        assert!(addon.sources().is_empty());
        assert_eq!(run_ticks(&mut addon, &mut world, 1).tasks, 1);
    }

    #[test]
    fn script_events() {
        let mut addon = addon();
        let mut world = empty_world();
        lay_line(&mut world, origin(), Face::East, 2, &energy_cable());

        assert_eq!(addon.on_script_event(&mut world, "other:event", "energy|[0,0,0]"), Ok(None));
        assert!(matches!(
            addon.on_script_event(&mut world, RESCAN_EVENT_ID, "energy"),
            Err(SignalError::MissingSeparator(_))
        ));
        let update = addon
            .on_script_event(&mut world, RESCAN_EVENT_ID, "energy|[1,64,0]")
            .unwrap()
            .unwrap();
        assert!(update.rescans() > 0);
    }

    #[test]
    fn buckets_on_bare_tanks() {
        let addon = addon();
        let mut world = empty_world();
        world.set_block(origin(), tank_block("utilitycraft:basic_fluid_tank"));

        assert_eq!(addon.use_item_on_tank(&mut world, origin(), "minecraft:bucket"), None);
        let filled = addon.use_item_on_tank(&mut world, origin(), "minecraft:lava_bucket");
        assert_eq!(filled.as_ref().and_then(|r| r.output()), Some("minecraft:bucket"));
        let tank = world.entity_at(origin()).unwrap();
        assert_eq!(Ledger::fluid(tank, 0).get(&world), 1000);

        let drained = addon.use_item_on_tank(&mut world, origin(), "minecraft:bucket");
        assert_eq!(drained.as_ref().and_then(|r| r.output()), Some("minecraft:lava_bucket"));
        assert!(!world.is_valid(tank));
    }
}
