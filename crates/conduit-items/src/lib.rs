//! Item exporters.
//!
//! An exporter is mounted on an inventory and, on each activation, pushes
//! part of that inventory's first stack into the `van:`/`ent:`/`dra:`
//! endpoints the item scanner wrote onto it. Item movement itself goes
//! through the host's [`Inventories`] capability; only what the targets
//! accepted is removed from the source.

use conduit_core::distribution::{Budget, distribute};
use conduit_core::id::EntityId;
use conduit_core::network::{ITEM_NODES, TransferMode, order_targets};
use conduit_core::pos::BlockPos;
use conduit_core::world::{BlockAccess, EntityAccess, Inventories, ItemStack};
use conduit_topology::rules::AXIS_STATE;
use conduit_topology::scan::attached_source;
use tracing::{trace, warn};

/// What one exporter activation moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTransfer {
    pub item: String,
    pub moved: u32,
}

/// Push up to `speed` items of `stack` from `source` to `targets`,
/// already ordered for `mode`. Returns how many were moved; they have been
/// removed from `source`.
pub fn transfer_stack<W>(
    world: &mut W,
    source: BlockPos,
    stack: &ItemStack,
    speed: u64,
    mode: TransferMode,
    targets: &[BlockPos],
) -> u32
where
    W: Inventories + ?Sized,
{
    let budget = Budget::new(speed, u64::from(stack.count));
    let item = stack.item.as_str();

    let total = distribute(targets, mode, budget, |pos, limit| {
        if pos == source {
            return 0;
        }
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        let room = world.free_room(pos, item);
        if room == 0 {
            return 0;
        }
        u64::from(world.insert_items(pos, item, limit.min(room)))
    });

    let total = u32::try_from(total).unwrap_or(u32::MAX);
    let removed = world.remove_items(source, item, total);
    if removed != total {
        warn!(source = %source, item, inserted = total, removed, "source lost items mid-transfer");
    }
    total
}

/// One exporter activation. `None` when the exporter is not mounted on
/// anything, the source is empty, or it has no endpoints.
pub fn run_exporter<W>(
    world: &mut W,
    exporter: EntityId,
    speed: u64,
    mode: Option<TransferMode>,
) -> Option<ItemTransfer>
where
    W: BlockAccess + EntityAccess + Inventories + ?Sized,
{
    let source = attached_source(world, exporter)?;
    let stack = world.first_stack(source)?;

    let mode = TransferMode::resolve(mode, world, exporter);
    let nodes = ITEM_NODES.load(world, exporter);
    if nodes.is_empty() {
        return None;
    }
    let rotation = match mode {
        TransferMode::Round => ITEM_NODES.next_rotation(world, exporter, nodes.len()),
        TransferMode::Nearest | TransferMode::Farthest => 0,
    };
    let targets = order_targets(nodes, mode, rotation);

    let moved = transfer_stack(world, source, &stack, speed, mode, &targets);
    trace!(mode = %mode, targets = targets.len(), item = %stack.item, moved, "item transfer");
    Some(ItemTransfer {
        item: stack.item,
        moved,
    })
}

/// Push up to `amount` of the first stack held at `pos` into the block on
/// the far side of its `axis` state. Returns how many moved.
pub fn transfer_facing<W>(world: &mut W, pos: BlockPos, amount: u32) -> u32
where
    W: BlockAccess + Inventories + ?Sized,
{
    let Some(facing) = world.block(pos).and_then(|b| b.face_state(AXIS_STATE)) else {
        return 0;
    };
    let Some(stack) = world.first_stack(pos) else {
        return 0;
    };
    let target = pos.output_position(facing);
    let count = amount.min(stack.count).min(world.free_room(target, &stack.item));
    if count == 0 {
        return 0;
    }
    let inserted = world.insert_items(target, &stack.item, count);
    world.remove_items(pos, &stack.item, inserted)
}
