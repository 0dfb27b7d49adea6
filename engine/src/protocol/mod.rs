//! Protocol types shared by the queue engine and the HTTP API.

mod message;
mod types;

pub use message::{IdentityMode, Message, MessageKey, MessageView, DEFAULT_PRIORITY};
pub use types::{QueueInfo, QueueOptions, QueueStats, QueueType};
