//! Cross-cutting concerns: error taxonomy and time handling

pub mod error;
pub mod time;
