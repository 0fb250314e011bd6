use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cell::SlotRef;

/// Direction of a carriage travel request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A simulated physical collision.
///
/// Every variant names the slot where the collision would have happened.
/// A crash is never auto-corrected: the operation that detected it leaves
/// the cell untouched and the operator has to re-trigger, acknowledge or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Crash {
    #[error("part placed into already occupied slot {slot}")]
    DoubleOccupancy { slot: usize },

    #[error("part on outlet conveyor floor slot {slot} blocks the index down")]
    OutletFloorOccupied { slot: usize },

    #[error("part on outlet conveyor crashed into horizontal conveyor at slot {slot} during index")]
    OutletTapOccupied { slot: usize },

    #[error("part crashed into another part during transfer push at slot {slot}")]
    PushCollision { slot: usize },

    #[error("part on inlet conveyor at slot {slot} crashed into or sits above the transfer carriage")]
    InletCeilingOccupied { slot: usize },
}

/// Errors surfaced by cell operations and commands
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CellError {
    /// Invariant violation, the cell state is unchanged and must not be cycled further
    #[error("crash: {0}")]
    Crash(#[from] Crash),

    /// Carriage already at a bound, the request was a no-op
    #[error("transfer carriage already at end of travel ({direction}, position {position})")]
    TravelLimit { direction: Direction, position: usize },

    #[error("unknown strategy id {0}, expected 0..=3")]
    UnknownStrategy(u8),

    #[error("speed multiplier {0} is not a positive power of two")]
    InvalidSpeed(f64),

    #[error("no such slot {0:?}")]
    InvalidSlot(SlotRef),

    #[error("time window of {elapsed_ms}ms from {now_ms}ms runs past the end of the clock")]
    ClockOverflow { now_ms: u64, elapsed_ms: u64 },
}

impl CellError {
    pub fn is_crash(&self) -> bool {
        matches!(self, CellError::Crash(_))
    }

    pub fn is_travel_limit(&self) -> bool {
        matches!(self, CellError::TravelLimit { .. })
    }

    /// The collision behind this error, if it is one
    pub fn crash(&self) -> Option<Crash> {
        match self {
            CellError::Crash(crash) => Some(*crash),
            _ => None,
        }
    }
}

/// Errors raised while validating a [`CellConfig`](super::config::CellConfig)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("vertical capacity must be even and at least 6, got {0}")]
    InvalidCapacity(usize),

    #[error("conveyor length must be even and at least 4, got {0}")]
    InvalidConveyorLength(usize),

    #[error("inflow probability must lie in [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("cycle time bounds invalid: min={min}ms max={max}ms base={base}ms")]
    InvalidCycleTime { min: u64, max: u64, base: u64 },
}
