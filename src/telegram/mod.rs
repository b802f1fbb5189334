//! Telegram client wrapper module.
//!
//! Provides the [`ChatTransport`] seam used by the command handler and its
//! grammers-backed implementation, including send rate limiting.

mod client;
mod rate_limiter;
mod transport;

pub use client::{Origin, TelegramBot, TelegramError};
pub use grammers_client::update::Update;
pub use rate_limiter::RateLimiter;
pub use transport::ChatTransport;
