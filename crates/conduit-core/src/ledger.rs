//! Resource ledgers.
//!
//! A [`Ledger`] is a handle naming one stored quantity on one entity: its
//! energy, or one of its fluid tanks. The numbers themselves live in the
//! host score store as mantissa/exponent pairs (see [`crate::quantity`]);
//! fluid tanks additionally carry a substance tag on the entity.
//!
//! Every operation saturates. Nothing here fails: callers read the return
//! value to learn how much was actually applied.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, bar_frame, ratio};
use crate::id::EntityId;
use crate::quantity::{MANTISSA_LIMIT, ScaledQuantity, exact_transfer, normalize, quantize, quantize_up};
use crate::tag::{EMPTY_FLUID, fluid_type_prefix, fluid_type_tag, parse_fluid_type_tag};
use crate::world::{EntityAccess, ScoreStore};

// ---------------------------------------------------------------------------
// Resource and score keys
// ---------------------------------------------------------------------------

/// Which stored quantity a ledger addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Energy,
    Fluid { tank: u8 },
}

/// The four score objectives backing one ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objectives {
    pub value: String,
    pub value_exp: String,
    pub cap: String,
    pub cap_exp: String,
}

impl Resource {
    pub fn objectives(self) -> Objectives {
        match self {
            Resource::Energy => Objectives {
                value: "energy".into(),
                value_exp: "energyExp".into(),
                cap: "energyCap".into(),
                cap_exp: "energyCapExp".into(),
            },
            Resource::Fluid { tank } => Objectives {
                value: format!("fluid_{tank}"),
                value_exp: format!("fluidExp_{tank}"),
                cap: format!("fluidCap_{tank}"),
                cap_exp: format!("fluidCapExp_{tank}"),
            },
        }
    }

    pub fn is_fluid(self) -> bool {
        matches!(self, Resource::Fluid { .. })
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Handle to one stored quantity on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ledger {
    entity: EntityId,
    resource: Resource,
}

impl Ledger {
    pub fn new(entity: EntityId, resource: Resource) -> Self {
        Self { entity, resource }
    }

    pub fn energy(entity: EntityId) -> Self {
        Self::new(entity, Resource::Energy)
    }

    pub fn fluid(entity: EntityId, tank: u8) -> Self {
        Self::new(entity, Resource::Fluid { tank })
    }

    /// Ledgers for tanks `0..count` of a multi-tank machine, each
    /// initialized.
    pub fn initialize_multiple<W>(world: &mut W, entity: EntityId, count: u8) -> Vec<Ledger>
    where
        W: ScoreStore + ?Sized,
    {
        (0..count)
            .map(|tank| {
                let ledger = Ledger::fluid(entity, tank);
                ledger.initialize(world);
                ledger
            })
            .collect()
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Create the stored value if it does not exist yet.
    pub fn initialize<W: ScoreStore + ?Sized>(&self, world: &mut W) {
        let keys = self.resource.objectives();
        if world.score(&keys.value, self.entity).is_none() {
            world.set_score(&keys.value, self.entity, 0);
        }
    }

    // -- reads --

    pub fn normalized<W: ScoreStore + ?Sized>(&self, world: &W) -> ScaledQuantity {
        let keys = self.resource.objectives();
        ScaledQuantity::new(
            world.score(&keys.value, self.entity).unwrap_or(0),
            world.score(&keys.value_exp, self.entity).unwrap_or(0),
        )
    }

    pub fn get<W: ScoreStore + ?Sized>(&self, world: &W) -> u64 {
        self.normalized(world).value()
    }

    pub fn cap_normalized<W: ScoreStore + ?Sized>(&self, world: &W) -> ScaledQuantity {
        let keys = self.resource.objectives();
        ScaledQuantity::new(
            world.score(&keys.cap, self.entity).unwrap_or(0),
            world.score(&keys.cap_exp, self.entity).unwrap_or(0),
        )
    }

    pub fn cap<W: ScoreStore + ?Sized>(&self, world: &W) -> u64 {
        self.cap_normalized(world).value()
    }

    pub fn free_space<W: ScoreStore + ?Sized>(&self, world: &W) -> u64 {
        self.cap(world).saturating_sub(self.get(world))
    }

    pub fn has<W: ScoreStore + ?Sized>(&self, world: &W, amount: u64) -> bool {
        self.get(world) >= amount
    }

    pub fn is_full<W: ScoreStore + ?Sized>(&self, world: &W) -> bool {
        self.free_space(world) == 0
    }

    /// Fill fraction in `[0, 1]`.
    pub fn fill_ratio<W: ScoreStore + ?Sized>(&self, world: &W) -> Fixed64 {
        ratio(self.get(world), self.cap(world))
    }

    /// Fill percentage in `[0, 100]`.
    pub fn percent<W: ScoreStore + ?Sized>(&self, world: &W) -> Fixed64 {
        self.fill_ratio(world) * Fixed64::from_num(100)
    }

    /// Frame of the 48-step fill bar.
    pub fn display_frame<W: ScoreStore + ?Sized>(&self, world: &W) -> u32 {
        bar_frame(self.fill_ratio(world))
    }

    // -- writes --

    /// Store `amount` as-is. Not clamped to the capacity.
    pub fn set<W: ScoreStore + ?Sized>(&self, world: &mut W, amount: u64) {
        let keys = self.resource.objectives();
        let q = normalize(amount);
        world.set_score(&keys.value, self.entity, q.mantissa);
        world.set_score(&keys.value_exp, self.entity, q.exponent);
    }

    pub fn set_cap<W: ScoreStore + ?Sized>(&self, world: &mut W, amount: u64) {
        let keys = self.resource.objectives();
        let q = normalize(amount);
        world.set_score(&keys.cap, self.entity, q.mantissa);
        world.set_score(&keys.cap_exp, self.entity, q.exponent);
    }

    /// Re-normalize the stored pair, e.g. after large consumes leave a
    /// small mantissa behind a high exponent.
    pub fn rebalance<W: ScoreStore + ?Sized>(&self, world: &mut W) {
        let current = self.get(world);
        self.set(world, current);
    }

    /// Add up to `amount`, clamped to free space. Above the mantissa limit
    /// the stored value rounds down to a storable one, so the return value
    /// is the change actually stored and may be less than asked.
    pub fn add<W: ScoreStore + ?Sized>(&self, world: &mut W, amount: u64) -> u64 {
        let amount = amount.min(self.free_space(world));
        if amount == 0 {
            return 0;
        }
        let before = self.get(world);
        self.write(world, quantize(before.saturating_add(amount)));
        self.get(world).saturating_sub(before)
    }

    /// Remove `amount`, or nothing if less is stored. Above the mantissa
    /// limit the removal rounds down to a storable value; the return value
    /// is the change actually stored and never exceeds `amount`.
    pub fn consume<W: ScoreStore + ?Sized>(&self, world: &mut W, amount: u64) -> u64 {
        let before = self.get(world);
        if amount == 0 || before < amount {
            return 0;
        }
        self.write(world, quantize_up(before - amount));
        before.saturating_sub(self.get(world))
    }

    /// Store `next`. Small values on an unscaled pair are applied as an
    /// incremental score update; everything else is re-normalized. Both
    /// paths store the same pair.
    fn write<W: ScoreStore + ?Sized>(&self, world: &mut W, next: u64) {
        let current = self.normalized(world);
        if current.exponent == 0 && next <= MANTISSA_LIMIT {
            // Both sides are at most 1e9, so the difference fits the score type.
            let delta = next as i64 - i64::from(current.mantissa);
            let keys = self.resource.objectives();
            world.add_score(&keys.value, self.entity, delta as i32);
            return;
        }
        self.set(world, next);
    }

    // -- fluid substance --

    /// Stored substance. Reads as `"empty"` when the tank holds nothing or
    /// the ledger is not a fluid tank.
    pub fn fluid_type<'w, W>(&self, world: &'w W) -> &'w str
    where
        W: ScoreStore + EntityAccess + ?Sized,
    {
        let Resource::Fluid { tank } = self.resource else {
            return EMPTY_FLUID;
        };
        if self.get(world) == 0 {
            return EMPTY_FLUID;
        }
        world
            .tags(self.entity)
            .iter()
            .find_map(|t| parse_fluid_type_tag(tank, t))
            .unwrap_or(EMPTY_FLUID)
    }

    /// Replace the substance tag. No-op for energy ledgers.
    pub fn set_fluid_type<W>(&self, world: &mut W, substance: &str)
    where
        W: EntityAccess + ?Sized,
    {
        let Resource::Fluid { tank } = self.resource else {
            return;
        };
        let prefix = fluid_type_prefix(tank);
        world.remove_tags_where(self.entity, &|t| t.starts_with(prefix.as_str()));
        world.add_tag(self.entity, &fluid_type_tag(tank, substance));
    }

    /// Insert exactly `amount` of `substance`, or nothing. Fails on a
    /// different substance or insufficient room.
    pub fn try_insert<W>(&self, world: &mut W, substance: &str, amount: u64) -> bool
    where
        W: ScoreStore + EntityAccess + ?Sized,
    {
        if amount == 0 || !self.resource.is_fluid() {
            return false;
        }
        let current = self.fluid_type(world).to_string();
        if current != EMPTY_FLUID && current != substance {
            return false;
        }
        if amount > self.free_space(world) {
            return false;
        }
        if current == EMPTY_FLUID {
            self.set_fluid_type(world, substance);
        }
        self.add(world, amount);
        true
    }

    // -- transfers --

    /// Move up to `amount` into `other`. Bounded by what this ledger holds
    /// and what `other` has room for, and rounded down so that what leaves
    /// this ledger is exactly what `other` gains. Fluid moves require matching
    /// substances unless `other` is empty, which then inherits ours.
    pub fn transfer_to<W>(&self, world: &mut W, other: &Ledger, amount: u64) -> u64
    where
        W: ScoreStore + EntityAccess + ?Sized,
    {
        if self.resource.is_fluid() != other.resource.is_fluid() {
            return 0;
        }
        let substance = if self.resource.is_fluid() {
            let ours = self.fluid_type(world).to_string();
            let theirs = other.fluid_type(world);
            if theirs != EMPTY_FLUID && theirs != ours {
                return 0;
            }
            Some(ours)
        } else {
            None
        };

        let bound = amount.min(other.free_space(world));
        let moved = exact_transfer(self.get(world), other.get(world), bound);
        if moved == 0 {
            return 0;
        }

        if let Some(ours) = substance
            && ours != EMPTY_FLUID
            && other.fluid_type(world) == EMPTY_FLUID
        {
            other.set_fluid_type(world, &ours);
        }
        // `moved` lands exactly on storable values on both sides.
        let taken = self.consume(world, moved);
        other.add(world, taken)
    }

    /// Mirror of [`Ledger::transfer_to`].
    pub fn receive_from<W>(&self, world: &mut W, other: &Ledger, amount: u64) -> u64
    where
        W: ScoreStore + EntityAccess + ?Sized,
    {
        other.transfer_to(world, self, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn objectives_match_store_layout() {
        let e = Resource::Energy.objectives();
        assert_eq!(e.value, "energy");
        assert_eq!(e.cap_exp, "energyCapExp");
        let f = Resource::Fluid { tank: 2 }.objectives();
        assert_eq!(f.value, "fluid_2");
        assert_eq!(f.value_exp, "fluidExp_2");
        assert_eq!(f.cap, "fluidCap_2");
        assert_eq!(f.cap_exp, "fluidCapExp_2");
    }

    #[test]
    fn add_clamps_to_free_space() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 0, 1000);
        let ledger = Ledger::energy(id);
        assert_eq!(ledger.add(&mut world, 700), 700);
        assert_eq!(ledger.add(&mut world, 700), 300);
        assert_eq!(ledger.add(&mut world, 1), 0);
        assert_eq!(ledger.get(&world), 1000);
        assert!(ledger.is_full(&world));
    }

    #[test]
    fn consume_is_all_or_nothing() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 500, 1000);
        let ledger = Ledger::energy(id);
        assert_eq!(ledger.consume(&mut world, 600), 0);
        assert_eq!(ledger.get(&world), 500);
        assert_eq!(ledger.consume(&mut world, 500), 500);
        assert_eq!(ledger.get(&world), 0);
        assert_eq!(ledger.consume(&mut world, 0), 0);
    }

    #[test]
    fn large_values_use_exponent() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 0, 10_000_000_000);
        let ledger = Ledger::energy(id);
        ledger.set(&mut world, 2_500_000_000);
        assert_eq!(ledger.normalized(&world), ScaledQuantity::new(2_500_000, 3));
        assert_eq!(ledger.get(&world), 2_500_000_000);
        assert_eq!(ledger.cap_normalized(&world), ScaledQuantity::new(10_000_000, 3));
    }

    #[test]
    fn incremental_and_recomputed_paths_agree() {
        let mut world = empty_world();
        let a = battery(&mut world, origin(), 999_999_000, 5_000_000_000);
        let b = battery(&mut world, origin().offset(1, 0, 0), 0, 5_000_000_000);
        let (la, lb) = (Ledger::energy(a), Ledger::energy(b));

        // crosses the mantissa limit: recomputed from scratch
        la.add(&mut world, 2_000);
        // same logical value built in one step
        lb.set(&mut world, 999_999_000 + 2_000);
        assert_eq!(la.normalized(&world), lb.normalized(&world));
    }

    #[test]
    fn precision_loss_above_limit() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 2_000_000_000, 5_000_000_000);
        let ledger = Ledger::energy(id);
        assert_eq!(ledger.add(&mut world, 999), 0);
        assert_eq!(ledger.get(&world), 2_000_000_000);
        assert_eq!(ledger.add(&mut world, 1_999), 1_000);
        assert_eq!(ledger.get(&world), 2_000_001_000);
    }

    #[test]
    fn consume_above_limit_never_takes_more_than_asked() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 2_000_000_000, 5_000_000_000);
        let ledger = Ledger::energy(id);
        assert_eq!(ledger.consume(&mut world, 999), 0);
        assert_eq!(ledger.get(&world), 2_000_000_000);
        assert_eq!(ledger.consume(&mut world, 2_500), 2_000);
        assert_eq!(ledger.get(&world), 1_999_998_000);
    }

    #[test]
    fn transfer_above_limit_conserves() {
        let mut world = empty_world();
        let a = battery(&mut world, origin(), 2_000_000_000, 10_000_000_000);
        let b = battery(&mut world, origin().offset(1, 0, 0), 0, 10_000_000_000);
        let (la, lb) = (Ledger::energy(a), Ledger::energy(b));

        assert_eq!(la.transfer_to(&mut world, &lb, 999), 0);
        assert_eq!(la.get(&world), 2_000_000_000);
        assert_eq!(lb.get(&world), 0);

        assert_eq!(la.transfer_to(&mut world, &lb, 1_500), 1_000);
        assert_eq!(la.get(&world), 1_999_999_000);
        assert_eq!(lb.get(&world), 1_000);
    }

    #[test]
    fn fill_ratio_and_frame() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 500, 1000);
        let ledger = Ledger::energy(id);
        assert_eq!(ledger.fill_ratio(&world), Fixed64::from_num(0.5));
        assert_eq!(ledger.percent(&world), Fixed64::from_num(50));
        assert_eq!(ledger.display_frame(&world), 24);
    }

    #[test]
    fn rebalance_recovers_mantissa() {
        let mut world = empty_world();
        let id = battery(&mut world, origin(), 0, 10_000_000_000);
        let ledger = Ledger::energy(id);
        ledger.set(&mut world, 3_000_000_000);
        ledger.consume(&mut world, 2_999_000_000);
        ledger.rebalance(&mut world);
        assert_eq!(ledger.normalized(&world), ScaledQuantity::new(1_000_000, 0));
    }

    #[test]
    fn energy_transfer_conserves() {
        let mut world = empty_world();
        let a = battery(&mut world, origin(), 500, 1000);
        let b = battery(&mut world, origin().offset(1, 0, 0), 900, 1000);
        let (la, lb) = (Ledger::energy(a), Ledger::energy(b));
        assert_eq!(la.transfer_to(&mut world, &lb, 300), 100);
        assert_eq!(la.get(&world), 400);
        assert_eq!(lb.get(&world), 1000);
    }

    #[test]
    fn receive_from_mirrors_transfer() {
        let mut world = empty_world();
        let a = battery(&mut world, origin(), 500, 1000);
        let b = battery(&mut world, origin().offset(1, 0, 0), 0, 1000);
        let (la, lb) = (Ledger::energy(a), Ledger::energy(b));
        assert_eq!(lb.receive_from(&mut world, &la, 200), 200);
        assert_eq!(la.get(&world), 300);
        assert_eq!(lb.get(&world), 200);
    }

    #[test]
    fn fluid_type_reads_empty_when_drained() {
        let mut world = empty_world();
        let id = tank_entity(&mut world, origin(), "lava", 0, 1000);
        let ledger = Ledger::fluid(id, 0);
        assert_eq!(ledger.fluid_type(&world), EMPTY_FLUID);
        ledger.add(&mut world, 10);
        assert_eq!(ledger.fluid_type(&world), "lava");
    }

    #[test]
    fn fluid_mismatch_refuses() {
        let mut world = empty_world();
        let a = tank_entity(&mut world, origin(), "lava", 500, 1000);
        let b = tank_entity(&mut world, origin().offset(1, 0, 0), "water", 200, 1000);
        let (la, lb) = (Ledger::fluid(a, 0), Ledger::fluid(b, 0));
        assert_eq!(la.transfer_to(&mut world, &lb, 300), 0);
        assert_eq!(la.get(&world), 500);
        assert_eq!(lb.get(&world), 200);
    }

    #[test]
    fn empty_target_inherits_substance() {
        let mut world = empty_world();
        let a = tank_entity(&mut world, origin(), "lava", 500, 1000);
        let b = tank_entity(&mut world, origin().offset(1, 0, 0), "water", 0, 1000);
        let (la, lb) = (Ledger::fluid(a, 0), Ledger::fluid(b, 0));
        assert_eq!(la.transfer_to(&mut world, &lb, 300), 300);
        assert_eq!(lb.fluid_type(&world), "lava");
        assert!(world.has_tag(b, "fluid0Type:lava"));
        assert!(!world.has_tag(b, "fluid0Type:water"));
    }

    #[test]
    fn energy_and_fluid_never_mix() {
        let mut world = empty_world();
        let a = battery(&mut world, origin(), 500, 1000);
        let b = tank_entity(&mut world, origin().offset(1, 0, 0), "lava", 0, 1000);
        assert_eq!(
            Ledger::energy(a).transfer_to(&mut world, &Ledger::fluid(b, 0), 100),
            0
        );
    }

    #[test]
    fn try_insert_requires_room_and_match() {
        let mut world = empty_world();
        let id = tank_entity(&mut world, origin(), "water", 0, 1000);
        let ledger = Ledger::fluid(id, 0);
        assert!(ledger.try_insert(&mut world, "lava", 800));
        assert!(!ledger.try_insert(&mut world, "lava", 300));
        assert!(!ledger.try_insert(&mut world, "water", 100));
        assert!(ledger.try_insert(&mut world, "lava", 200));
        assert!(ledger.is_full(&world));
        assert!(!ledger.try_insert(&mut world, "lava", 0));
    }

    #[test]
    fn initialize_multiple_creates_each_tank() {
        let mut world = empty_world();
        let id = tank_entity(&mut world, origin(), "lava", 0, 1000);
        let tanks = Ledger::initialize_multiple(&mut world, id, 3);
        assert_eq!(tanks.len(), 3);
        assert_eq!(world.score("fluid_2", id), Some(0));
        assert_eq!(tanks[1].resource(), Resource::Fluid { tank: 1 });
    }
}
