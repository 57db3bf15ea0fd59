//! Host-facing entry points for the conduit add-on.
//!
//! The host owns the world and forwards its events to an [`Addon`]:
//!
//! | Host event | Call |
//! |---|---|
//! | world loaded / unloaded | [`Addon::on_world_load`] / [`Addon::on_world_unload`] |
//! | block placed | [`Addon::on_block_placed`] |
//! | block broken | [`Addon::on_block_broken`] |
//! | machine placed with an item | [`Addon::place_machine`] |
//! | machine destroyed | [`Addon::destroy_machine`] |
//! | item used on a tank | [`Addon::use_item_on_tank`] |
//! | script event | [`Addon::on_script_event`] |
//! | game tick | [`Addon::tick`] |

pub mod addon;
pub mod error;
pub mod machine;
pub mod task;

pub use addon::{Addon, SourceKind, TickReport};
pub use error::PlaceError;
pub use machine::{MACHINE_ENTITY, PIPE_ENTITY, Placed};
pub use task::Task;
