//! Symbol Forecast core library.
//!
//! Statistics engine, snapshot persistence, batch entry parsing and the
//! transport-neutral session coordinator. The `sf-core` binary wires these
//! to a line-oriented stdin/stdout transport.

pub mod coordinator;
pub mod engine;
pub mod entry;
pub mod exit_codes;
pub mod logging;
pub mod stats;
pub mod store;

pub use coordinator::{Action, Button, Command, Inbound, Reply, SessionCoordinator};
pub use engine::{EngineSettings, SharedEngine, StatisticsEngine, StatsView};
pub use exit_codes::ExitCode;
pub use stats::{BatchOutcome, Distribution, StatisticsSnapshot, TransitionMatrix};
pub use store::{JsonFileStore, MemoryStore, SnapshotStore};
