//! Items that carry fluid: buckets, fluid balls, experience bottles.

use std::collections::BTreeMap;

use conduit_core::ledger::Ledger;
use conduit_core::world::{EntityAccess, ScoreStore};
use serde::{Deserialize, Serialize};

/// A filled container item and what using it on a tank does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidContainerItem {
    pub substance: String,
    pub amount: u64,
    /// Item handed back after emptying, if any.
    #[serde(default)]
    pub output: Option<String>,
}

impl FluidContainerItem {
    fn new(substance: &str, amount: u64, output: Option<&str>) -> Self {
        Self {
            substance: substance.into(),
            amount,
            output: output.map(String::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidItemTable {
    pub containers: BTreeMap<String, FluidContainerItem>,
    /// The empty bucket item.
    pub bucket: String,
    /// Substances an empty bucket can pick up.
    pub bucketable: Vec<String>,
    pub bucket_amount: u64,
}

impl Default for FluidItemTable {
    fn default() -> Self {
        let containers = [
            ("minecraft:lava_bucket", FluidContainerItem::new("lava", 1000, Some("minecraft:bucket"))),
            ("utilitycraft:lava_ball", FluidContainerItem::new("lava", 1000, None)),
            ("minecraft:water_bucket", FluidContainerItem::new("water", 1000, Some("minecraft:bucket"))),
            ("utilitycraft:water_ball", FluidContainerItem::new("water", 1000, None)),
            (
                "minecraft:experience_bottle",
                FluidContainerItem::new("xp", 8, Some("minecraft:glass_bottle")),
            ),
            ("minecraft:milk_bucket", FluidContainerItem::new("milk", 1000, Some("minecraft:bucket"))),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            containers,
            bucket: "minecraft:bucket".into(),
            bucketable: vec!["lava".into(), "water".into(), "milk".into()],
            bucket_amount: 1000,
        }
    }
}

/// Result of using an item on a tank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemInteraction {
    /// The item's fluid went into the tank.
    Emptied { output: Option<String> },
    /// An empty bucket was filled from the tank.
    Filled { output: String },
}

impl ItemInteraction {
    /// The item the player ends up holding, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            ItemInteraction::Emptied { output } => output.as_deref(),
            ItemInteraction::Filled { output } => Some(output),
        }
    }
}

/// Use `item` on `tank`. `None` when the item is not a fluid container or
/// the tank cannot take or give the fluid.
pub fn fluid_item<W>(world: &mut W, tank: &Ledger, table: &FluidItemTable, item: &str) -> Option<ItemInteraction>
where
    W: ScoreStore + EntityAccess + ?Sized,
{
    if let Some(container) = table.containers.get(item) {
        return tank
            .try_insert(world, &container.substance, container.amount)
            .then(|| ItemInteraction::Emptied {
                output: container.output.clone(),
            });
    }

    if item != table.bucket {
        return None;
    }
    let stored = tank.fluid_type(world).to_string();
    if !table.bucketable.contains(&stored) || !tank.has(world, table.bucket_amount) {
        return None;
    }
    tank.consume(world, table.bucket_amount);
    Some(ItemInteraction::Filled {
        output: format!("minecraft:{stored}_bucket"),
    })
}
