pub mod client;
pub mod transcript;

pub use client::CompletionClient;
pub use transcript::{ChatMessage, Role, Transcript};
