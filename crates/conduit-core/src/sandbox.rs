//! In-memory host.
//!
//! [`MemoryWorld`] stores blocks, entities, scores and inventories in plain
//! collections and implements every host trait. It is the reference host
//! for tests and for embedders that drive the network code headlessly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::capability::Capabilities;
use crate::id::EntityId;
use crate::pos::BlockPos;
use crate::world::{
    Block, BlockAccess, EntityAccess, EntitySpawn, Inventories, ItemStack, ScoreStore, StateValue,
    WorldError,
};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A live entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub type_id: String,
    pub pos: BlockPos,
    pub capabilities: Capabilities,
    /// Insertion-ordered, no duplicates.
    pub tags: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

/// A bounded item container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    /// Total item count the container holds across all stacks.
    pub capacity: u32,
    pub stacks: Vec<ItemStack>,
}

impl Inventory {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            stacks: Vec::new(),
        }
    }

    pub fn total(&self) -> u32 {
        self.stacks.iter().map(|s| s.count).sum()
    }

    pub fn count_of(&self, item: &str) -> u32 {
        self.stacks
            .iter()
            .filter(|s| s.item == item)
            .map(|s| s.count)
            .sum()
    }

    fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    fn insert(&mut self, item: &str, count: u32) -> u32 {
        let accepted = count.min(self.free());
        if accepted == 0 {
            return 0;
        }
        match self.stacks.iter_mut().find(|s| s.item == item) {
            Some(stack) => stack.count += accepted,
            None => self.stacks.push(ItemStack::new(item, accepted)),
        }
        accepted
    }

    fn remove(&mut self, item: &str, count: u32) -> u32 {
        let mut remaining = count;
        for stack in self.stacks.iter_mut().filter(|s| s.item == item) {
            let taken = remaining.min(stack.count);
            stack.count -= taken;
            remaining -= taken;
            if remaining == 0 {
                break;
            }
        }
        self.stacks.retain(|s| s.count > 0);
        count - remaining
    }
}

// ---------------------------------------------------------------------------
// MemoryWorld
// ---------------------------------------------------------------------------

/// A complete host kept in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryWorld {
    pub(crate) blocks: BTreeMap<BlockPos, Block>,
    pub(crate) entities: SlotMap<EntityId, EntityRecord>,
    pub(crate) scores: BTreeMap<String, BTreeMap<EntityId, i32>>,
    pub(crate) inventories: BTreeMap<BlockPos, Inventory>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    // -- blocks --

    /// Place or replace a block.
    pub fn set_block(&mut self, pos: BlockPos, block: Block) {
        self.blocks.insert(pos, block);
    }

    pub fn remove_block(&mut self, pos: BlockPos) -> Option<Block> {
        self.blocks.remove(&pos)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    // -- entities --

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(id)
    }

    /// All entities in slot order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- inventories --

    /// Attach an empty inventory with room for `capacity` items.
    pub fn add_inventory(&mut self, pos: BlockPos, capacity: u32) {
        self.inventories.insert(pos, Inventory::new(capacity));
    }

    pub fn inventory(&self, pos: BlockPos) -> Option<&Inventory> {
        self.inventories.get(&pos)
    }

    pub fn inventory_mut(&mut self, pos: BlockPos) -> Option<&mut Inventory> {
        self.inventories.get_mut(&pos)
    }
}

impl BlockAccess for MemoryWorld {
    fn block(&self, pos: BlockPos) -> Option<&Block> {
        self.blocks.get(&pos)
    }

    fn set_block_state(
        &mut self,
        pos: BlockPos,
        name: &str,
        value: StateValue,
    ) -> Result<(), WorldError> {
        let block = self.blocks.get_mut(&pos).ok_or(WorldError::NoBlock(pos))?;
        let slot = block
            .states
            .get_mut(name)
            .ok_or_else(|| WorldError::UnknownState {
                pos,
                name: name.to_string(),
            })?;
        *slot = value;
        Ok(())
    }
}

impl EntityAccess for MemoryWorld {
    fn entity_at(&self, pos: BlockPos) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, e)| e.pos == pos)
            .map(|(id, _)| id)
    }

    fn entity_with_tag(&self, tag: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, e)| e.tags.iter().any(|t| t == tag))
            .map(|(id, _)| id)
    }

    fn entity_pos(&self, id: EntityId) -> Option<BlockPos> {
        self.entities.get(id).map(|e| e.pos)
    }

    fn entity_type(&self, id: EntityId) -> Option<&str> {
        self.entities.get(id).map(|e| e.type_id.as_str())
    }

    fn capabilities(&self, id: EntityId) -> Capabilities {
        self.entities
            .get(id)
            .map(|e| e.capabilities)
            .unwrap_or_default()
    }

    fn tags(&self, id: EntityId) -> &[String] {
        self.entities
            .get(id)
            .map(|e| e.tags.as_slice())
            .unwrap_or(&[])
    }

    fn add_tag(&mut self, id: EntityId, tag: &str) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        if entity.tags.iter().any(|t| t == tag) {
            return false;
        }
        entity.tags.push(tag.to_string());
        true
    }

    fn remove_tag(&mut self, id: EntityId, tag: &str) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        let before = entity.tags.len();
        entity.tags.retain(|t| t != tag);
        entity.tags.len() != before
    }

    fn property(&self, id: EntityId, key: &str) -> Option<&str> {
        self.entities
            .get(id)
            .and_then(|e| e.properties.get(key))
            .map(String::as_str)
    }

    fn set_property(&mut self, id: EntityId, key: &str, value: String) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.properties.insert(key.to_string(), value);
        }
    }

    fn clear_property(&mut self, id: EntityId, key: &str) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.properties.remove(key);
        }
    }

    fn spawn_entity(&mut self, spawn: EntitySpawn) -> Option<EntityId> {
        Some(self.entities.insert(EntityRecord {
            type_id: spawn.type_id,
            pos: spawn.pos,
            capabilities: spawn.capabilities,
            tags: Vec::new(),
            properties: BTreeMap::new(),
        }))
    }

    fn remove_entity(&mut self, id: EntityId) -> bool {
        if self.entities.remove(id).is_none() {
            return false;
        }
        // Scores are orphaned by the host; drop them here to keep memory flat.
        for objective in self.scores.values_mut() {
            objective.remove(&id);
        }
        true
    }
}

impl ScoreStore for MemoryWorld {
    fn score(&self, objective: &str, id: EntityId) -> Option<i32> {
        self.scores.get(objective).and_then(|o| o.get(&id)).copied()
    }

    fn set_score(&mut self, objective: &str, id: EntityId, value: i32) {
        self.scores
            .entry(objective.to_string())
            .or_default()
            .insert(id, value);
    }

    fn add_score(&mut self, objective: &str, id: EntityId, delta: i32) {
        let slot = self
            .scores
            .entry(objective.to_string())
            .or_default()
            .entry(id)
            .or_insert(0);
        *slot = slot.saturating_add(delta);
    }
}

impl Inventories for MemoryWorld {
    fn first_stack(&self, pos: BlockPos) -> Option<ItemStack> {
        self.inventories
            .get(&pos)
            .and_then(|inv| inv.stacks.iter().find(|s| s.count > 0))
            .cloned()
    }

    fn free_room(&self, pos: BlockPos, _item: &str) -> u32 {
        self.inventories.get(&pos).map_or(0, Inventory::free)
    }

    fn insert_items(&mut self, pos: BlockPos, item: &str, count: u32) -> u32 {
        self.inventories
            .get_mut(&pos)
            .map_or(0, |inv| inv.insert(item, count))
    }

    fn remove_items(&mut self, pos: BlockPos, item: &str, count: u32) -> u32 {
        self.inventories
            .get_mut(&pos)
            .map_or(0, |inv| inv.remove(item, count))
    }
}
