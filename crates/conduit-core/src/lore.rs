//! Ledger state carried in item lore.
//!
//! When a machine is broken its stored energy and fluid are written into
//! the dropped item's lore; placing the item back parses them out again.
//! Lines look like:
//!
//! ```text
//! §r§7  Energy: 15.3 kDE/64 kDE
//! §r§7  Lava: 500.0 mB/8000.0 mB
//! ```
//!
//! Parsing strips `§x` formatting escapes first, so recolored lines still
//! read back.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::ledger::Ledger;
use crate::quantity::{energy_unit_multiplier, fluid_unit_multiplier, format_energy, format_fluid};
use crate::tag::EMPTY_FLUID;
use crate::world::{EntityAccess, ScoreStore};

/// Prefix written before every lore line.
pub const LORE_PREFIX: &str = "§r§7  ";

/// Errors from reading lore text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoreError {
    #[error("no energy value at index {index} in '{line}'")]
    MissingEnergy { index: usize, line: String },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("bad lore pattern: {0}")]
    Pattern(String),
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

fn compiled(
    cell: &'static OnceLock<Result<Regex, regex::Error>>,
    pattern: &str,
) -> Result<&'static Regex, LoreError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| LoreError::Pattern(e.to_string()))
}

fn escape_pattern() -> Result<&'static Regex, LoreError> {
    static CELL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    compiled(&CELL, r"§.")
}

fn energy_pattern() -> Result<&'static Regex, LoreError> {
    static CELL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    compiled(&CELL, r"([\d.]+)\s*(kDE|MDE|GDE|TDE|DE)")
}

fn fluid_pattern() -> Result<&'static Regex, LoreError> {
    static CELL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    compiled(&CELL, r"(\w+):\s*([\d.]+)\s*(mB|kB|MB|B)")
}

/// Remove `§x` formatting escapes.
pub fn strip_formatting(line: &str) -> Result<String, LoreError> {
    Ok(escape_pattern()?.replace_all(line, "").into_owned())
}

fn scaled(value: &str, multiplier: f64) -> Result<u64, LoreError> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| LoreError::InvalidNumber(value.to_string()))?;
    Ok((parsed * multiplier).round() as u64)
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// `§r§7  Energy: {amount}/{cap}`.
pub fn energy_line(amount: u64, cap: u64) -> String {
    format!(
        "{LORE_PREFIX}Energy: {}/{}",
        format_energy(amount),
        format_energy(cap)
    )
}

/// `§r§7  {Substance}: {amount}/{cap}`.
pub fn fluid_line(substance: &str, amount: u64, cap: u64) -> String {
    format!(
        "{LORE_PREFIX}{}: {}/{}",
        capitalize(substance),
        format_fluid(amount),
        format_fluid(cap)
    )
}

/// The `index`-th energy value on a line (0 = stored, 1 = capacity).
pub fn parse_energy(line: &str, index: usize) -> Result<u64, LoreError> {
    let cleaned = strip_formatting(line)?;
    let caps = energy_pattern()?
        .captures_iter(&cleaned)
        .nth(index)
        .ok_or_else(|| LoreError::MissingEnergy {
            index,
            line: cleaned.clone(),
        })?;
    let multiplier = energy_unit_multiplier(&caps[2]).unwrap_or(1.0);
    scaled(&caps[1], multiplier)
}

/// Substance and stored amount from a fluid line. A line with no fluid
/// value reads as an empty tank.
pub fn parse_fluid(line: &str) -> Result<(String, u64), LoreError> {
    let cleaned = strip_formatting(line)?;
    let Some(caps) = fluid_pattern()?.captures(cleaned.trim()) else {
        return Ok((EMPTY_FLUID.to_string(), 0));
    };
    let multiplier = fluid_unit_multiplier(&caps[3]).unwrap_or(1.0);
    Ok((caps[1].to_lowercase(), scaled(&caps[2], multiplier)?))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Stored resources
// ---------------------------------------------------------------------------

/// A stored amount with its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAmount {
    pub amount: u64,
    pub cap: u64,
}

/// A stored fluid with its substance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFluid {
    pub substance: String,
    pub amount: u64,
    pub cap: u64,
}

/// Everything a machine carries through an inventory round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredResources {
    pub energy: Option<StoredAmount>,
    pub fluid: Option<StoredFluid>,
}

impl StoredResources {
    /// Read the entity's energy and first tank. Empty ledgers are left out.
    pub fn capture<W>(world: &W, entity: EntityId) -> Self
    where
        W: ScoreStore + EntityAccess + ?Sized,
    {
        let energy = Ledger::energy(entity);
        let tank = Ledger::fluid(entity, 0);
        let stored_energy = energy.get(world);
        let substance = tank.fluid_type(world);
        Self {
            energy: (stored_energy > 0).then(|| StoredAmount {
                amount: stored_energy,
                cap: energy.cap(world),
            }),
            fluid: (substance != EMPTY_FLUID).then(|| StoredFluid {
                substance: substance.to_string(),
                amount: tank.get(world),
                cap: tank.cap(world),
            }),
        }
    }

    /// Lore lines, energy first.
    pub fn to_lore(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(e) = &self.energy {
            lines.push(energy_line(e.amount, e.cap));
        }
        if let Some(f) = &self.fluid {
            lines.push(fluid_line(&f.substance, f.amount, f.cap));
        }
        lines
    }

    /// Parse lore lines written by [`StoredResources::to_lore`]. The first
    /// line mentioning `Energy` supplies energy; the first other line
    /// supplies fluid.
    pub fn from_lore<S: AsRef<str>>(lines: &[S]) -> Result<Self, LoreError> {
        let mut out = Self::default();
        for line in lines {
            let line: &str = line.as_ref();
            if out.energy.is_none() && line.contains("Energy") {
                let amount = parse_energy(line, 0)?;
                let cap = parse_energy(line, 1).unwrap_or(0);
                out.energy = Some(StoredAmount { amount, cap });
            } else if out.fluid.is_none() {
                let (substance, amount) = parse_fluid(line)?;
                if substance != EMPTY_FLUID {
                    out.fluid = Some(StoredFluid {
                        substance,
                        amount,
                        cap: 0,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Write stored amounts back onto an entity. Capacities are not
    /// touched; they come from the machine definition, and restored
    /// amounts are clamped to them. Lore figures are rounded for display,
    /// so a full machine can read back slightly above its capacity.
    pub fn restore<W>(&self, world: &mut W, entity: EntityId)
    where
        W: ScoreStore + EntityAccess + ?Sized,
    {
        let energy = Ledger::energy(entity);
        let amount = self.energy.map_or(0, |e| e.amount);
        energy.set(world, amount.min(energy.cap(world)));
        if let Some(f) = &self.fluid {
            let tank = Ledger::fluid(entity, 0);
            tank.set_fluid_type(world, &f.substance);
            tank.set(world, f.amount.min(tank.cap(world)));
        }
    }
}
