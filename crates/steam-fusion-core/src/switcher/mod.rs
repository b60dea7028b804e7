//! Steam account switching through the TcNo Account Switcher.

mod account;
mod tool;

pub use account::{AccountSwitch, AccountSwitcher, SwitchGate};
pub use tool::{is_newer_version, switch_arguments, SwitcherTool};
