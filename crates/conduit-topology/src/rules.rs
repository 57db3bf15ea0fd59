//! Block classification rules.
//!
//! Which block ids expand a scan, which count as inventories, and the
//! well-known tags and states the scanners read. Defaults match the
//! shipped add-on; `conduit-data` can override them from a config file.

use serde::{Deserialize, Serialize};

/// Block tag carried by port blocks.
pub const PORT_TAG: &str = "dorios:port";
/// Block tag carried by exporter and extractor blocks.
pub const EXPORTER_TAG: &str = "dorios:isExporter";
/// Block tag carried by plain tube blocks (cables, conduits, pipes).
pub const TUBE_TAG: &str = "dorios:isTube";
/// Block state naming the face an exporter was placed against.
pub const FACE_STATE: &str = "minecraft:block_face";
/// Block state naming a tank's output direction.
pub const AXIS_STATE: &str = "utilitycraft:axis";

/// Shape flag state for one face of a tube or exporter.
pub fn shape_state(face: conduit_core::pos::Face) -> String {
    format!("utilitycraft:{}", face.name())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyRules {
    /// Blocks that carry energy onward.
    pub cables: Vec<String>,
}

impl Default for EnergyRules {
    fn default() -> Self {
        Self {
            cables: vec!["utilitycraft:energy_cable".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRules {
    pub conduits: Vec<String>,
    pub exporters: Vec<String>,
    /// Host blocks with a built-in inventory.
    pub vanilla_containers: Vec<String>,
    /// Substring identifying third-party drawer blocks.
    pub storage_marker: String,
}

impl Default for ItemRules {
    fn default() -> Self {
        Self {
            conduits: vec!["utilitycraft:item_conduit".into()],
            exporters: vec!["utilitycraft:item_exporter".into()],
            vanilla_containers: [
                "minecraft:chest",
                "minecraft:trapped_chest",
                "minecraft:barrel",
                "minecraft:furnace",
                "minecraft:blast_furnace",
                "minecraft:hopper",
                "minecraft:smoker",
                "minecraft:shulker",
                "minecraft:dropper",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            storage_marker: "dustveyn:storage_drawers".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidRules {
    pub pipes: Vec<String>,
    pub extractors: Vec<String>,
    /// Substring identifying tank blocks.
    pub tank_marker: String,
}

impl Default for FluidRules {
    fn default() -> Self {
        Self {
            pipes: vec!["utilitycraft:fluid_pipe".into()],
            extractors: vec!["utilitycraft:fluid_extractor".into()],
            tank_marker: "fluid_tank".into(),
        }
    }
}

/// All classification rules, one section per network kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkRules {
    pub energy: EnergyRules,
    pub item: ItemRules,
    pub fluid: FluidRules,
}

impl NetworkRules {
    pub fn is_cable(&self, type_id: &str) -> bool {
        self.energy.cables.iter().any(|c| c == type_id)
    }

    /// Item conduit or item exporter.
    pub fn is_item_carrier(&self, type_id: &str) -> bool {
        self.item.conduits.iter().any(|c| c == type_id)
            || self.item.exporters.iter().any(|c| c == type_id)
    }

    /// Fluid pipe or fluid extractor.
    pub fn is_fluid_carrier(&self, type_id: &str) -> bool {
        self.fluid.pipes.iter().any(|c| c == type_id)
            || self.fluid.extractors.iter().any(|c| c == type_id)
    }

    pub fn is_vanilla_container(&self, type_id: &str) -> bool {
        self.item.vanilla_containers.iter().any(|c| c == type_id)
    }

    pub fn is_storage(&self, type_id: &str) -> bool {
        !self.item.storage_marker.is_empty() && type_id.contains(&self.item.storage_marker)
    }

    /// A block an item conduit visually connects to without sharing its tag.
    pub fn is_inventory_block(&self, type_id: &str) -> bool {
        self.is_vanilla_container(type_id) || self.is_storage(type_id)
    }

    pub fn is_tank(&self, type_id: &str) -> bool {
        !self.fluid.tank_marker.is_empty() && type_id.contains(&self.fluid.tank_marker)
    }
}
