//! Platform abstraction layer.
//!
//! All `#[cfg]` blocks for OS-specific Steam locations live here rather than
//! being scattered through the client code.

pub mod paths;

pub use paths::{default_steam_root, steam_executable};

