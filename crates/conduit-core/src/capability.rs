//! Capability sets attached to entity types.
//!
//! Each entity type declares which network roles it plays. Scanners and
//! distribution check roles by set membership.

use serde::{Deserialize, Serialize};

/// A single network role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Produces energy and pushes it into a network (generators).
    EnergySource,
    /// Stores or consumes energy; a valid energy target.
    EnergyContainer,
    /// A battery. Batteries never push into other batteries.
    Battery,
    /// Holds items; a valid item endpoint.
    Container,
    /// Holds fluid; a valid fluid endpoint.
    FluidContainer,
    /// An exporter/extractor entity that actively pushes items or fluid.
    Exporter,
}

impl Capability {
    const fn bit(self) -> u16 {
        match self {
            Capability::EnergySource => 1 << 0,
            Capability::EnergyContainer => 1 << 1,
            Capability::Battery => 1 << 2,
            Capability::Container => 1 << 3,
            Capability::FluidContainer => 1 << 4,
            Capability::Exporter => 1 << 5,
        }
    }

    /// Host type-family name, for embedders mapping from the engine.
    pub fn family(self) -> &'static str {
        match self {
            Capability::EnergySource => "dorios:energy_source",
            Capability::EnergyContainer => "dorios:energy_container",
            Capability::Battery => "dorios:battery",
            Capability::Container => "dorios:container",
            Capability::FluidContainer => "dorios:fluid_container",
            Capability::Exporter => "dorios:exporter",
        }
    }
}

/// A set of [`Capability`] values packed into a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities(u16);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);

    pub fn new() -> Self {
        Self::NONE
    }

    pub fn of(caps: &[Capability]) -> Self {
        caps.iter().fold(Self::NONE, |acc, c| acc.with(*c))
    }

    pub const fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub fn remove(&mut self, cap: Capability) {
        self.0 &= !cap.bit();
    }

    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Build from host type-family names, ignoring unknown families.
    pub fn from_families<'a>(families: impl IntoIterator<Item = &'a str>) -> Self {
        const KNOWN: [Capability; 6] = [
            Capability::EnergySource,
            Capability::EnergyContainer,
            Capability::Battery,
            Capability::Container,
            Capability::FluidContainer,
            Capability::Exporter,
        ];
        let mut caps = Self::NONE;
        for family in families {
            if let Some(cap) = KNOWN.iter().find(|c| c.family() == family) {
                caps.insert(*cap);
            }
        }
        caps
    }
}
