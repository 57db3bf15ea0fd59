//! A headless session driven through `Addon` the way a host would: config
//! loaded from disk, blocks placed through the hooks, ticks advanced, the
//! world snapshotted and resumed, then a cable broken.

use std::fs;
use std::path::PathBuf;

use conduit_addon::{Addon, SourceKind, TickReport};
use conduit_core::ledger::Ledger;
use conduit_core::pos::{BlockPos, Face};
use conduit_core::sandbox::MemoryWorld;
use conduit_core::test_utils::*;
use conduit_core::world::{Block, EntityAccess};
use conduit_data::load_config_dir;

const PANEL: &str = "utilitycraft:solar_panel";
const CRUSHER: &str = "utilitycraft:crusher";

const CONFIG: &str = r#"
[timing]
world_load_delay = 10

[exporters]
fluid = 50

[generators."utilitycraft:solar_panel"]
energy_cap = 10000
production_per_tick = 4
rate_speed_base = 40

[machines."utilitycraft:crusher"]
energy_cap = 1000
"#;

fn config_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("conduit_session_{suffix}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("conduit.toml"), CONFIG).unwrap();
    dir
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

struct Layout {
    panel: BlockPos,
    crusher: BlockPos,
    source_tank: BlockPos,
    extractor: BlockPos,
    far_tank: BlockPos,
}

/// Panel, three cables and a crusher along x; a lava tank, extractor, two
/// pipes and a bare tank along x ten blocks south.
fn build(addon: &mut Addon, world: &mut MemoryWorld) -> Layout {
    let no_lore: [&str; 0] = [];
    let panel = origin();
    let last_cable = lay_line(world, panel, Face::East, 3, &energy_cable());
    for x in 1..=3 {
        addon.on_block_placed(world, panel.offset(x, 0, 0));
    }
    let crusher = last_cable.step(Face::East);
    world.set_block(crusher, Block::new(CRUSHER).with_tag("dorios:energy"));
    addon.place_machine(world, crusher, &no_lore).unwrap();
    world.set_block(panel, Block::new(PANEL).with_tag("dorios:energy"));
    addon.place_machine(world, panel, &no_lore).unwrap();

    let source_tank = origin().offset(0, 0, 10);
    tank_entity(world, source_tank, "lava", 5000, 8000);
    let extractor = source_tank.step(Face::East);
    let last_pipe = lay_line(world, extractor, Face::East, 2, &fluid_pipe());
    let far_tank = last_pipe.step(Face::East);
    world.set_block(far_tank, tank_block("utilitycraft:basic_fluid_tank"));
    world.set_block(extractor, fluid_extractor(Face::East));
    addon.on_block_placed(world, extractor);

    Layout {
        panel,
        crusher,
        source_tank,
        extractor,
        far_tank,
    }
}

fn energy_at(world: &MemoryWorld, pos: BlockPos) -> u64 {
    world.entity_at(pos).map_or(0, |e| Ledger::energy(e).get(world))
}

fn fluid_at(world: &MemoryWorld, pos: BlockPos) -> u64 {
    world.entity_at(pos).map_or(0, |e| Ledger::fluid(e, 0).get(world))
}

#[test]
fn session_survives_a_snapshot_and_a_broken_cable() {
    let dir = config_dir("snapshot");
    let config = load_config_dir(&dir).unwrap();
    let _ = fs::remove_dir_all(&dir);

    let mut addon = Addon::new(config.clone());
    let mut world = empty_world();
    let layout = build(&mut addon, &mut world);
    assert_eq!(
        addon.sources().get(&layout.panel),
        Some(&SourceKind::Generator {
            block_type: PANEL.into()
        })
    );
    assert_eq!(addon.sources().get(&layout.extractor), Some(&SourceKind::FluidExtractor));

    addon.on_world_load();
    // Activations at ticks 10, 20 and 30.
    let report = run_ticks(&mut addon, &mut world, 30);
    assert_eq!(report.energy_generated, 120);
    assert_eq!(report.energy_moved, 120);
    assert_eq!(report.fluid_moved, 1500);
    assert_eq!(energy_at(&world, layout.crusher), 120);
    assert_eq!(fluid_at(&world, layout.source_tank), 3500);
    assert_eq!(fluid_at(&world, layout.far_tank), 1500);

    let bytes = world.serialize(addon.context().elapsed()).unwrap();
    let (mut restored, tick) = MemoryWorld::deserialize(&bytes).unwrap();
    assert_eq!(tick, 30);
    assert_eq!(energy_at(&restored, layout.crusher), 120);
    assert_eq!(fluid_at(&restored, layout.far_tank), 1500);

    let mut resumed = Addon::new(config);
    for (pos, kind) in addon.sources() {
        resumed.register_source(*pos, kind.clone());
    }
    resumed.on_world_load();
    let report = run_ticks(&mut resumed, &mut restored, 20);
    assert_eq!(report.energy_moved, 80);
    assert_eq!(report.fluid_moved, 1000);
    assert_eq!(energy_at(&restored, layout.crusher), 200);
    assert_eq!(fluid_at(&restored, layout.source_tank), 2500);
    assert_eq!(fluid_at(&restored, layout.far_tank), 2500);

    let cable = layout.panel.offset(2, 0, 0);
    let broken = restored.remove_block(cable).unwrap();
    resumed.on_block_broken(&mut restored, cable, broken);
    let report = run_ticks(&mut resumed, &mut restored, 10);
    assert_eq!(report.tasks, 1);
    assert_eq!(report.energy_generated, 40);
    assert_eq!(report.energy_moved, 0);
    assert_eq!(energy_at(&restored, layout.crusher), 200);
    assert_eq!(energy_at(&restored, layout.panel), 40);
}

#[test]
fn destroyed_machines_carry_their_energy_to_the_next_placement() {
    let dir = config_dir("lore");
    let config = load_config_dir(&dir).unwrap();
    let _ = fs::remove_dir_all(&dir);

    let mut addon = Addon::new(config);
    let mut world = empty_world();
    let layout = build(&mut addon, &mut world);
    addon.on_world_load();
    run_ticks(&mut addon, &mut world, 20);
    assert_eq!(energy_at(&world, layout.crusher), 80);

    let lore = addon.destroy_machine(&mut world, layout.crusher).unwrap();
    let broken = world.remove_block(layout.crusher).unwrap();
    addon.on_block_broken(&mut world, layout.crusher, broken);
    run_ticks(&mut addon, &mut world, 10);
    assert_eq!(energy_at(&world, layout.panel), 40);

    let elsewhere = origin().offset(0, 0, -5);
    world.set_block(elsewhere, Block::new(CRUSHER).with_tag("dorios:energy"));
    addon.place_machine(&mut world, elsewhere, &lore).unwrap();
    assert_eq!(energy_at(&world, elsewhere), 80);
}
