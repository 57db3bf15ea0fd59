//! Work deferred through the scheduler.

use conduit_core::pos::BlockPos;
use conduit_core::world::Block;
use conduit_topology::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Sources may start acting.
    WorldLoaded,
    /// Refresh one network rooted at `pos`.
    Rescan { kind: ResourceKind, pos: BlockPos },
    /// Refresh every network `broken` belonged to. Runs a tick after the
    /// break so the world already shows the block gone.
    BlockBroken { pos: BlockPos, broken: Block },
}
