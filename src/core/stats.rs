use serde::{Deserialize, Serialize};

/// Running counters for one cell build
///
/// Cleared whenever the cell is rebuilt, so the numbers always describe the
/// current run of the current strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStats {
    /// Parts that entered the conveyor from upstream
    pub parts_entered: u64,
    /// Parts lifted off the conveyor by the inlet elevator
    pub parts_lifted: u64,
    /// Parts pushed from the inlet to the outlet elevator
    pub parts_transferred: u64,
    /// Parts lowered back onto the conveyor by the outlet elevator
    pub parts_lowered: u64,
    /// Parts that left the far end of the conveyor
    pub parts_passed: u64,
    pub crashes: u64,
    pub travel_limits: u64,
}

impl CellStats {
    /// Parts currently held in the tower according to the counters
    pub fn parts_buffered(&self) -> u64 {
        self.parts_lifted.saturating_sub(self.parts_lowered)
    }
}
