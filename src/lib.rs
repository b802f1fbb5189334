//! Squonk Radio Library
//!
//! A Telegram bot that plays owner-uploaded MP3 playlists in registered
//! groups.
//!
//! This crate provides the core functionality for:
//! - Keeping one in-memory playlist per registered group
//! - Reading title/artist tags from uploaded files
//! - Handling commands, uploads and playback buttons
//! - Connecting to Telegram via `MTProto` as a bot account

pub mod commands;
pub mod config;
pub mod library;
pub mod metadata;
pub mod telegram;
