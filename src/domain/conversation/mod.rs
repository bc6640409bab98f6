//! Conversation module - the turn vocabulary of a chat with the model.

mod turn;

pub use turn::{Role, Turn};
