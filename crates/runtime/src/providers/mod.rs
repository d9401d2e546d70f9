//! Decision provider implementations.

pub mod mock;
pub mod openai;
pub mod scripted;

pub use mock::MockProvider;
pub use openai::{OpenAiProvider, OpenAiSettings};
pub use scripted::{ScriptedProvider, ScriptedResponse};
