use conduit_core::pos::BlockPos;

/// Why a machine or generator could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    #[error("no block at {0}")]
    NoBlock(BlockPos),
    #[error("block type {0:?} is neither a configured generator nor a machine")]
    UnknownBlock(String),
    #[error("an entity already occupies {0}")]
    Occupied(BlockPos),
    #[error("host refused to spawn an entity at {0}")]
    SpawnFailed(BlockPos),
}
