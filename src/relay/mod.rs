//! Relay module: menu-driven message relay over Telegram.

pub mod auth;
pub mod broadcast;
pub mod engine;
pub mod menu;
pub mod state;
pub mod telegram;
pub mod transport;


pub use auth::Caller;
pub use engine::RelayEngine;
pub use telegram::TelegramClient;
