pub mod core;

// Re-export commonly used types
pub use crate::core::cell::{BufferCell, CellStatus, SlotRef};
pub use crate::core::command::{Command, CommandOutcome};
pub use crate::core::config::CellConfig;
pub use crate::core::errors::{CellError, ConfigError, Crash, Direction};
pub use crate::core::scheduler::{CyclePhase, CycleScheduler, Tick};
pub use crate::core::simulation::{Simulation, SimulationObserver};
pub use crate::core::stats::CellStats;
pub use crate::core::strategy::{Strategy, VerticalMoves};
