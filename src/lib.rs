// Public API for the renderer host and integration tests

pub mod bias;
pub mod content;
pub mod debate;
pub mod llm;
pub mod protocol;
pub mod session;
pub mod timer;
pub mod types;
