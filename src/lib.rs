//! Workspace facade crate.
//!
//! Re-exports the individual workspace crates so host applications can depend
//! on `player-workspace` alone: the host bridge contracts (`bridge-traits`),
//! the runtime plumbing (`core-runtime`) and the playback controller
//! (`core-playback`).

pub use bridge_traits;
pub use core_playback;
pub use core_runtime;
