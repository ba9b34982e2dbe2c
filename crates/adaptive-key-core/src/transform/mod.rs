// Adaptive Key Transform Module
// Adaptive key instances and the engine that dispatches events to them

pub mod adaptive_key;
pub mod engine;

pub use adaptive_key::{AdaptiveKey, AdaptiveKeyConfig, AdaptiveKeyError};
pub use engine::{AdaptiveKeyEngine, EngineConfig};
