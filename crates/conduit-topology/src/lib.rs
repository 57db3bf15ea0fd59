//! Topology scanning for cable, conduit and pipe networks.
//!
//! There is no persistent graph. A place or break event triggers a
//! breadth-first rescan anchored at the changed block; the results are
//! written as position tags onto the source entities the scan reaches
//! (generators, exporters, extractors), which then rebuild their cached
//! node lists lazily on their next distribution tick.
//!
//! - [`energy`] -- cable expansion plus the nested container search that
//!   writes `net:` tags onto generators.
//! - [`item`] / [`fluid`] -- conduit and pipe expansion that writes
//!   `van:`/`ent:`/`dra:` tags onto exporters, minus each exporter's own
//!   source block.
//! - [`geometry`] -- connection shape flags for tube and exporter blocks.
//! - [`pipes`] -- the `update_pipes` orchestration used by the event hooks.
//! - [`signal`] -- the `"<kind>|[x,y,z]"` rescan request payload.

pub mod energy;
pub mod fluid;
pub mod geometry;
pub mod item;
pub mod pipes;
pub mod rules;
pub mod scan;
pub mod signal;

pub use conduit_core::id::ResourceKind;
pub use rules::NetworkRules;
pub use scan::ScanReport;
