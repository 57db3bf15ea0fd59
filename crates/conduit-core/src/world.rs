//! The host interface.
//!
//! The game engine owns blocks, entities, scores and scheduling. These
//! traits describe exactly what the network code needs from it:
//!
//! - [`BlockAccess`]: block lookup by coordinate, block tags and states.
//! - [`EntityAccess`]: entity lookup, tag and property storage, spawning.
//! - [`ScoreStore`]: the persistent `i32` score store keyed by entity.
//! - [`Inventories`]: item container operations, consumed as a black box.
//!
//! [`World`] bundles all four. [`crate::sandbox::MemoryWorld`] is the
//! in-memory implementation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::capability::Capabilities;
use crate::id::EntityId;
use crate::pos::{BlockPos, Face};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures raised by host writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("no block at {0}")]
    NoBlock(BlockPos),
    #[error("block at {pos} has no state '{name}'")]
    UnknownState { pos: BlockPos, name: String },
    #[error("entity is no longer valid")]
    InvalidEntity,
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// A block state value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateValue {
    Bool(bool),
    Int(i32),
    Str(String),
}

impl StateValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A block as seen by the network code: type id, tags and states.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Block {
    pub type_id: String,
    pub tags: BTreeSet<String>,
    pub states: BTreeMap<String, StateValue>,
}

impl Block {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_state(mut self, name: impl Into<String>, value: StateValue) -> Self {
        self.states.insert(name.into(), value);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn state(&self, name: &str) -> Option<&StateValue> {
        self.states.get(name)
    }

    /// A string state interpreted as a face (`minecraft:block_face`, axis).
    pub fn face_state(&self, name: &str) -> Option<Face> {
        self.state(name)
            .and_then(StateValue::as_str)
            .and_then(Face::from_name)
    }
}

/// Read and write access to blocks.
pub trait BlockAccess {
    /// The block at `pos`, or `None` for air or unloaded chunks.
    fn block(&self, pos: BlockPos) -> Option<&Block>;

    /// Write a block state. Fails if there is no block or the block does
    /// not declare that state.
    fn set_block_state(
        &mut self,
        pos: BlockPos,
        name: &str,
        value: StateValue,
    ) -> Result<(), WorldError>;

    fn block_type(&self, pos: BlockPos) -> Option<&str> {
        self.block(pos).map(|b| b.type_id.as_str())
    }

    fn block_has_tag(&self, pos: BlockPos, tag: &str) -> bool {
        self.block(pos).is_some_and(|b| b.has_tag(tag))
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Parameters for spawning an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpawn {
    pub type_id: String,
    pub pos: BlockPos,
    pub capabilities: Capabilities,
}

impl EntitySpawn {
    pub fn new(type_id: impl Into<String>, pos: BlockPos, capabilities: Capabilities) -> Self {
        Self {
            type_id: type_id.into(),
            pos,
            capabilities,
        }
    }
}

/// Entity lookup and per-entity metadata.
pub trait EntityAccess {
    /// The entity occupying the block at `pos`, if any.
    fn entity_at(&self, pos: BlockPos) -> Option<EntityId>;

    /// The first entity carrying `tag`.
    fn entity_with_tag(&self, tag: &str) -> Option<EntityId>;

    fn entity_pos(&self, id: EntityId) -> Option<BlockPos>;

    fn entity_type(&self, id: EntityId) -> Option<&str>;

    /// Capability set of the entity's type. Empty for unknown entities.
    fn capabilities(&self, id: EntityId) -> Capabilities;

    /// Tags in insertion order. Empty for unknown entities.
    fn tags(&self, id: EntityId) -> &[String];

    /// Add a tag. Returns `false` if already present or the entity is gone.
    fn add_tag(&mut self, id: EntityId, tag: &str) -> bool;

    /// Remove a tag. Returns `false` if it was not present.
    fn remove_tag(&mut self, id: EntityId, tag: &str) -> bool;

    fn property(&self, id: EntityId, key: &str) -> Option<&str>;

    fn set_property(&mut self, id: EntityId, key: &str, value: String);

    fn clear_property(&mut self, id: EntityId, key: &str);

    fn spawn_entity(&mut self, spawn: EntitySpawn) -> Option<EntityId>;

    fn remove_entity(&mut self, id: EntityId) -> bool;

    fn is_valid(&self, id: EntityId) -> bool {
        self.entity_pos(id).is_some()
    }

    fn has_tag(&self, id: EntityId, tag: &str) -> bool {
        self.tags(id).iter().any(|t| t == tag)
    }

    /// Remove every tag matching `pred`. Returns how many were removed.
    fn remove_tags_where(&mut self, id: EntityId, pred: &dyn Fn(&str) -> bool) -> usize {
        let doomed: Vec<String> = self
            .tags(id)
            .iter()
            .filter(|t| pred(t))
            .cloned()
            .collect();
        for tag in &doomed {
            self.remove_tag(id, tag);
        }
        doomed.len()
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// The host's persistent integer store, keyed by objective and entity.
///
/// Values are 32-bit; larger quantities go through
/// [`crate::quantity::ScaledQuantity`].
pub trait ScoreStore {
    fn score(&self, objective: &str, id: EntityId) -> Option<i32>;

    fn set_score(&mut self, objective: &str, id: EntityId, value: i32);

    fn add_score(&mut self, objective: &str, id: EntityId, delta: i32);
}

// ---------------------------------------------------------------------------
// Inventories
// ---------------------------------------------------------------------------

/// A stack of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub count: u32,
}

impl ItemStack {
    pub fn new(item: impl Into<String>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
        }
    }
}

/// Item container operations at a block position (vanilla block or
/// container entity).
pub trait Inventories {
    /// The first non-empty stack of the container at `pos`.
    fn first_stack(&self, pos: BlockPos) -> Option<ItemStack>;

    /// How many of `item` the container at `pos` can still accept.
    fn free_room(&self, pos: BlockPos, item: &str) -> u32;

    /// Insert up to `count`; returns how many were inserted.
    fn insert_items(&mut self, pos: BlockPos, item: &str, count: u32) -> u32;

    /// Remove up to `count`; returns how many were removed.
    fn remove_items(&mut self, pos: BlockPos, item: &str, count: u32) -> u32;
}

/// Everything the network code needs from the host.
pub trait World: BlockAccess + EntityAccess + ScoreStore + Inventories {}

impl<T: BlockAccess + EntityAccess + ScoreStore + Inventories> World for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_builder() {
        let block = Block::new("utilitycraft:item_exporter")
            .with_tag("dorios:item")
            .with_state("minecraft:block_face", StateValue::Str("up".into()));
        assert!(block.has_tag("dorios:item"));
        assert_eq!(block.face_state("minecraft:block_face"), Some(Face::Up));
        assert_eq!(block.face_state("utilitycraft:axis"), None);
    }

    #[test]
    fn state_value_accessors() {
        assert_eq!(StateValue::Bool(true).as_bool(), Some(true));
        assert_eq!(StateValue::Int(3).as_bool(), None);
        assert_eq!(StateValue::Str("x".into()).as_str(), Some("x"));
    }
}
