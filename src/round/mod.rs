pub mod engine;
pub mod error;
pub mod model;

pub use engine::{EngineStatus, RoundEngine, Tick};
pub use error::RoundError;
