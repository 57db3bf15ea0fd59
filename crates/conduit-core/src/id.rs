use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a world entity (machine, generator, tank, exporter).
    ///
    /// Doubles as the score-store identity: every ledger objective is keyed
    /// by the owning entity's id.
    pub struct EntityId;
}

/// The three resource kinds that form networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Energy,
    Item,
    Fluid,
}

impl ResourceKind {
    /// All kinds, in the order hooks evaluate them.
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Energy, ResourceKind::Item, ResourceKind::Fluid];

    /// Short name used in signals (`energy|[x,y,z]`).
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Energy => "energy",
            ResourceKind::Item => "item",
            ResourceKind::Fluid => "fluid",
        }
    }

    /// Block tag that marks membership in this kind's network.
    pub fn block_tag(self) -> &'static str {
        match self {
            ResourceKind::Energy => "dorios:energy",
            ResourceKind::Item => "dorios:item",
            ResourceKind::Fluid => "dorios:fluid",
        }
    }

    /// Parse a signal name. Returns `None` for anything unknown.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "energy" => Some(ResourceKind::Energy),
            "item" => Some(ResourceKind::Item),
            "fluid" => Some(ResourceKind::Fluid),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
