pub mod client;
pub mod error;
pub mod models;

pub use client::{ApiClient, ChatApi};
pub use error::{ApiError, ApiErrorKind};
pub use models::{Conversation, CreateConversationRequest, CreateMessageRequest, Message};
