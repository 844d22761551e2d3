pub mod action;
pub mod backend;
pub mod conversation;
pub mod error;
pub mod event;
pub mod message;
pub mod notice;

pub use backend::*;
pub use conversation::Conversation;
pub use error::{ChatError, SlotError, StorageError};
pub use message::{Message, Role};
pub use notice::*;

pub use action::*;
pub use event::{ArcEventTx, Event, EventTx};
