//! On-disk configuration structs.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! values it changes. Defaults reproduce the stock add-on.

use std::collections::BTreeMap;

use conduit_fluid::{FluidItemTable, TankCatalog};
use conduit_power::GeneratorSpec;
use conduit_topology::NetworkRules;
use serde::{Deserialize, Serialize};

use crate::loader::ConfigError;

// ===========================================================================
// Timing
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Gated sources act once every `tick_speed` ticks.
    pub tick_speed: u64,
    /// The tick counter wraps to zero at this value.
    pub tick_wrap: u64,
    /// Ticks after world load before sources start acting.
    pub world_load_delay: u64,
    /// Ticks between a machine being placed and its network rescan.
    pub rescan_delay: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_speed: 10,
            tick_wrap: 1000,
            world_load_delay: 50,
            rescan_delay: 2,
        }
    }
}

// ===========================================================================
// Sources and machines
// ===========================================================================

/// Per-tick transfer speeds for exporters and extractors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterSpeeds {
    /// Items per game tick.
    pub item: u64,
    /// mB per game tick.
    pub fluid: u64,
}

impl Default for ExporterSpeeds {
    fn default() -> Self {
        Self { item: 1, fluid: 100 }
    }
}

/// Storage of a machine block that consumes energy or fluid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub energy_cap: u64,
    #[serde(default)]
    pub fluid_cap: Option<u64>,
}

// ===========================================================================
// Top level
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonConfig {
    pub timing: TimingConfig,
    pub rules: NetworkRules,
    pub tanks: TankCatalog,
    pub fluid_items: FluidItemTable,
    pub exporters: ExporterSpeeds,
    /// Generator and battery definitions keyed by block type.
    pub generators: BTreeMap<String, GeneratorSpec>,
    /// Machine definitions keyed by block type.
    pub machines: BTreeMap<String, MachineSpec>,
}

impl AddonConfig {
    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timing = &self.timing;
        if timing.tick_speed == 0 {
            return Err(ConfigError::Invalid("timing.tick_speed must be positive".into()));
        }
        if timing.tick_wrap < timing.tick_speed {
            return Err(ConfigError::Invalid(format!(
                "timing.tick_wrap ({}) is smaller than tick_speed ({})",
                timing.tick_wrap, timing.tick_speed
            )));
        }
        if let Some((block, _)) = self.generators.iter().find(|(_, g)| g.energy_cap == 0) {
            return Err(ConfigError::Invalid(format!("generator {block} has no energy capacity")));
        }
        if self.tanks.default_capacity == 0 {
            return Err(ConfigError::Invalid("tanks.default_capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn generator(&self, block_type: &str) -> Option<&GeneratorSpec> {
        self.generators.get(block_type)
    }

    pub fn machine(&self, block_type: &str) -> Option<&MachineSpec> {
        self.machines.get(block_type)
    }
}
