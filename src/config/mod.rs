//! Configuration management for Sounder.
//!
//! Provides XDG-compliant settings storage for the engine.

mod settings;

pub use settings::{EngineConfig, Paths};
