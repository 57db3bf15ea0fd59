//! Energy network scan.
//!
//! The outer search walks cables from the changed block. Each generator
//! or port it meets starts a nested search that collects every reachable
//! energy container and writes them onto the generator as `net:` tags.

use std::collections::{BTreeSet, VecDeque};

use conduit_core::capability::Capability;
use conduit_core::id::EntityId;
use conduit_core::pos::BlockPos;
use conduit_core::tag::{DIRTY_TAG, TagPrefix, position_tag};
use conduit_core::world::{BlockAccess, EntityAccess};
use tracing::{debug, trace};

use crate::ResourceKind;
use crate::rules::{NetworkRules, PORT_TAG};
use crate::scan::{ScanReport, input_positions, port_owner};

enum Node {
    Cable,
    Port,
    Other,
}

fn classify<W: BlockAccess + ?Sized>(world: &W, rules: &NetworkRules, pos: BlockPos) -> Option<Node> {
    let block = world.block(pos)?;
    if !block.has_tag(ResourceKind::Energy.block_tag()) {
        return None;
    }
    Some(if rules.is_cable(&block.type_id) {
        Node::Cable
    } else if block.has_tag(PORT_TAG) {
        Node::Port
    } else {
        Node::Other
    })
}

/// Rescan the energy network touching `origin`.
pub fn rescan<W>(world: &mut W, rules: &NetworkRules, origin: BlockPos) -> ScanReport
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    let mut report = ScanReport::new(ResourceKind::Energy, origin);
    let mut queue = VecDeque::from([origin]);

    while let Some(pos) = queue.pop_front() {
        if !report.visited.insert(pos) {
            continue;
        }
        let Some(node) = classify(world, rules, pos) else {
            continue;
        };
        let (source, starts) = match node {
            Node::Cable => {
                report.carriers += 1;
                queue.extend(pos.neighbors());
                continue;
            }
            Node::Port => {
                let Some(owner) = port_owner(world, pos) else {
                    continue;
                };
                if !world.capabilities(owner).contains(Capability::EnergySource) {
                    continue;
                }
                (owner, input_positions(world, owner))
            }
            Node::Other => {
                let Some(entity) = world.entity_at(pos) else {
                    continue;
                };
                if !world.capabilities(entity).contains(Capability::EnergySource) {
                    continue;
                }
                (entity, vec![pos])
            }
        };
        if report.sources.contains(&source) {
            continue;
        }
        report.endpoints += search_energy_containers(world, rules, source, &starts);
        report.sources.push(source);
    }

    debug!(
        kind = %ResourceKind::Energy,
        origin = %origin,
        visited = report.visited.len(),
        endpoints = report.endpoints,
        sources = report.sources.len(),
        "rescanned network"
    );
    report
}

/// Collect every energy container reachable from `starts` and write them
/// onto `source` as `net:` tags, replacing the old ones and marking the
/// source dirty. Batteries never feed other batteries, and a source never
/// targets itself. Returns the number of targets written.
pub fn search_energy_containers<W>(
    world: &mut W,
    rules: &NetworkRules,
    source: EntityId,
    starts: &[BlockPos],
) -> usize
where
    W: BlockAccess + EntityAccess + ?Sized,
{
    let source_is_battery = world.capabilities(source).contains(Capability::Battery);
    let mut visited: BTreeSet<BlockPos> = starts.iter().copied().collect();
    let mut queue: VecDeque<BlockPos> = starts.iter().flat_map(|p| p.neighbors()).collect();
    let mut targets: Vec<BlockPos> = Vec::new();

    while let Some(pos) = queue.pop_front() {
        if !visited.insert(pos) {
            continue;
        }
        let candidate = match classify(world, rules, pos) {
            None => continue,
            Some(Node::Cable) => {
                queue.extend(pos.neighbors());
                continue;
            }
            Some(Node::Port) => port_owner(world, pos),
            Some(Node::Other) => world.entity_at(pos),
        };
        let Some(entity) = candidate else {
            continue;
        };
        if entity == source {
            continue;
        }
        let caps = world.capabilities(entity);
        if !caps.contains(Capability::EnergyContainer)
            || (source_is_battery && caps.contains(Capability::Battery))
        {
            continue;
        }
        if let Some(target) = world.entity_pos(entity)
            && !targets.contains(&target)
        {
            targets.push(target);
        }
    }

    world.remove_tags_where(source, &|t| TagPrefix::Net.matches(t));
    for target in &targets {
        world.add_tag(source, &position_tag(TagPrefix::Net, *target));
    }
    world.add_tag(source, DIRTY_TAG);
    trace!(targets = targets.len(), "wrote energy targets");
    targets.len()
}
