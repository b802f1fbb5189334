//! Command handling module.
//!
//! Turns inbound chat events (commands, uploads, button presses) into
//! registry updates and replies.

mod handler;
mod types;

pub use handler::{HandlerError, RadioHandler};
pub use types::{
    Attachment, BotCommand, ChatContext, EventKind, Inbound, Outcome, PlaybackControl, Rejection,
};
