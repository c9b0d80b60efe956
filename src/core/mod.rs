//! Core engine types: ids, players, configuration, errors, RNG and log sinks.
//!
//! Everything here is independent of the object model; the other modules
//! build on these.

pub mod entity;
pub mod player;
pub mod config;
pub mod error;
pub mod rng;
pub mod log;

pub use entity::{ManagerId, ObjectId, ObjectRef};
pub use player::{PlayerId, PlayerMap};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use rng::{GameRng, GameRngState};
pub use log::{LogSink, MemoryLogSink, NullLogSink, TracingLogSink};
