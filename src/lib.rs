//! Thin client for the StoryMate conversation API.

pub mod api;
pub mod app;
pub mod chat;
pub mod ui;
pub mod utils;

pub use app::AppConfig;
pub use chat::{ChatEvent, ChatState, ChatViewModel};
