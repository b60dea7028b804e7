//! Data models shared across the crate.

mod event;
mod game;

pub use event::{ChannelSink, EventSink, GameEvent, RecordingSink};
pub use game::{AccountId, GameEntry, GameId, InstalledGame, TitleId};
