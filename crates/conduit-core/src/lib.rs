//! Conduit Core -- shared foundation for block-based resource networks.
//!
//! Cables, conduits and pipes link generators, machines and tanks into
//! implicit graphs. This crate holds everything the per-kind crates share:
//!
//! - [`world`] -- the host interface (blocks, entities, scores, inventories)
//!   and [`sandbox::MemoryWorld`], an in-memory host.
//! - [`quantity`] -- mantissa/exponent encoding that keeps large amounts
//!   inside a 32-bit score store.
//! - [`ledger::Ledger`] -- saturating per-entity energy and fluid storage.
//! - [`lore`] -- ledger state written to and read from item lore.
//! - [`tag`] -- the bit-exact `prefix:[x,y,z]` tag encoding.
//! - [`network`] -- cached, distance-sorted endpoint lists and transfer
//!   modes.
//! - [`distribution`] -- the policy loop that splits a budget across
//!   endpoints.
//! - [`context::SimContext`] and [`schedule::Scheduler`] -- tick state and
//!   deferred tasks.
//! - [`serialize`] -- versioned `bitcode` snapshots of a `MemoryWorld`.
//!
//! # Tick flow
//!
//! 1. A place/break event triggers a localized rescan, which rewrites
//!    position tags on the affected source entities and marks them dirty.
//! 2. On a gated tick each source loads its node list (rebuilding it when
//!    dirty), orders it by mode and offers its budget through
//!    [`distribution::distribute`].
//! 3. The total accepted is consumed from the source ledger in one step.

pub mod capability;
pub mod context;
pub mod distribution;
pub mod fixed;
pub mod id;
pub mod ledger;
pub mod lore;
pub mod network;
pub mod pos;
pub mod quantity;
pub mod sandbox;
pub mod schedule;
pub mod serialize;
pub mod tag;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
