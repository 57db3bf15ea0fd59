//! Connection shape flags.
//!
//! Tubes show an arm toward every neighbour of the same kind (item
//! conduits also toward inventories). Exporter models rotate with their
//! placement face, so their arms go through [`exporter_visual_face`]
//! first.

use conduit_core::pos::{BlockPos, Face};
use conduit_core::world::{BlockAccess, StateValue};
use tracing::warn;

use crate::ResourceKind;
use crate::rules::{FACE_STATE, NetworkRules, shape_state};

/// Whether `pos` shows an arm toward `face`.
fn connects<W: BlockAccess + ?Sized>(
    world: &W,
    rules: &NetworkRules,
    pos: BlockPos,
    face: Face,
    kind_tag: &str,
    item_conduit: bool,
) -> bool {
    match world.block(pos.step(face)) {
        Some(neighbour) => {
            neighbour.has_tag(kind_tag) || (item_conduit && rules.is_inventory_block(&neighbour.type_id))
        }
        None => false,
    }
}

fn write_flags<W: BlockAccess + ?Sized>(world: &mut W, pos: BlockPos, flags: [(Face, bool); 6]) -> bool {
    let mut ok = true;
    for (face, on) in flags {
        if let Err(e) = world.set_block_state(pos, &shape_state(face), StateValue::Bool(on)) {
            warn!(pos = %pos, face = %face, error = %e, "failed to write shape flag");
            ok = false;
        }
    }
    ok
}

/// Refresh the six arm flags of the tube at `pos`. Returns `false` if any
/// write was rejected.
pub fn update_geometry<W: BlockAccess + ?Sized>(
    world: &mut W,
    rules: &NetworkRules,
    pos: BlockPos,
    kind: ResourceKind,
) -> bool {
    let tag = kind.block_tag();
    let Some(block) = world.block(pos) else {
        return false;
    };
    let item_conduit = block.has_tag(ResourceKind::Item.block_tag());
    let flags = Face::ALL.map(|face| (face, connects(world, rules, pos, face, tag, item_conduit)));
    write_flags(world, pos, flags)
}

/// The model face that shows a neighbour lying toward `direction`, for
/// an exporter placed against `facing`.
pub fn exporter_visual_face(facing: Face, direction: Face) -> Face {
    use Face::*;
    match (facing, direction) {
        (South, d) => d,
        (North, North) => South,
        (North, South) => North,
        (North, East) => West,
        (North, West) => East,
        (East, North) => East,
        (East, South) => West,
        (East, East) => South,
        (East, West) => North,
        (West, North) => West,
        (West, South) => East,
        (West, East) => North,
        (West, West) => South,
        (Up, North) => Up,
        (Up, South) => Down,
        (Up, Up) => South,
        (Up, Down) => North,
        (Down, North) => Down,
        (Down, South) => Up,
        (Down, Up) => North,
        (Down, Down) => South,
        (_, d) => d,
    }
}

/// Refresh the arm flags of the exporter at `pos`, remapped through its
/// placement face. A missing face reads as north.
pub fn update_exporter_geometry<W: BlockAccess + ?Sized>(
    world: &mut W,
    rules: &NetworkRules,
    pos: BlockPos,
    kind: ResourceKind,
) -> bool {
    let tag = kind.block_tag();
    let Some(block) = world.block(pos) else {
        return false;
    };
    let facing = block.face_state(FACE_STATE).unwrap_or(Face::North);
    let item_conduit = block.has_tag(ResourceKind::Item.block_tag());
    let flags = Face::ALL.map(|direction| {
        (
            exporter_visual_face(facing, direction),
            connects(world, rules, pos, direction, tag, item_conduit),
        )
    });
    write_flags(world, pos, flags)
}
