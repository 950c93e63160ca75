//! Tourism map drawing and location-matching engine.

pub mod engine;
pub mod error;
pub mod model;
pub mod settings;
pub mod store;

pub use error::{EngineError, EngineResult, Severity, StoreError, StoreResult};
