/// Configuration for a buffer cell
///
/// This module provides the configuration type controlling the cell geometry,
/// inflow randomness and the speed-derived cycle timing.
use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::strategy::Strategy;

/// Configuration for one buffer cell
///
/// Geometry is fixed for the lifetime of the cell. Everything else that the
/// operator changes at runtime (strategy, run-mode flags, speed) lives on the
/// cell itself and only starts from the values given here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    /// Total vertical capacity, split evenly between inlet and outlet elevators
    pub capacity: usize,
    /// Number of slots on the horizontal indexing conveyor
    pub conveyor_length: usize,
    /// Cycle time at speed multiplier 1
    pub base_cycle_time_ms: u64,
    /// Fastest cycle time the speed control may reach
    pub min_cycle_time_ms: u64,
    /// Slowest cycle time the speed control may reach
    pub max_cycle_time_ms: u64,
    /// Chance that an uninhibited conveyor index brings in a new part
    pub inflow_probability: f64,
    /// Seed for the inflow draw, entropy when absent
    pub seed: Option<u64>,
    /// Strategy active after construction
    pub strategy: Strategy,
}

impl CellConfig {
    /// Create a new cell configuration with default values
    ///
    /// Defaults model the production line: a 150 part tower over a 16 slot
    /// conveyor, cycling every 3 seconds at speed 1.
    pub fn new() -> Self {
        Self {
            capacity: 150,
            conveyor_length: 16,
            base_cycle_time_ms: 3000,
            min_cycle_time_ms: 10,
            max_cycle_time_ms: 6000,
            inflow_probability: 2.0 / 3.0,
            seed: None,
            strategy: Strategy::default(),
        }
    }

    /// Set the total vertical capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the horizontal conveyor length
    pub fn with_conveyor_length(mut self, length: usize) -> Self {
        self.conveyor_length = length;
        self
    }

    /// Set the base cycle time and the bounds the speed control must respect
    ///
    /// # Arguments
    /// * `base` - Cycle time at speed 1
    /// * `min` - Lower bound of the derived cycle time
    /// * `max` - Upper bound of the derived cycle time
    pub fn with_cycle_times(mut self, base: u64, min: u64, max: u64) -> Self {
        self.base_cycle_time_ms = base;
        self.min_cycle_time_ms = min;
        self.max_cycle_time_ms = max;
        self
    }

    pub fn with_inflow_probability(mut self, probability: f64) -> Self {
        self.inflow_probability = probability;
        self
    }

    /// Seed the inflow draw so runs are reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Number of slots in each elevator
    pub fn elevator_length(&self) -> usize {
        self.capacity / 2
    }

    /// Conveyor slot mechanically aligned under the inlet elevator
    pub fn inlet_tap(&self) -> usize {
        self.conveyor_length / 2 - 1
    }

    /// Conveyor slot mechanically aligned under the outlet elevator
    pub fn outlet_tap(&self) -> usize {
        self.conveyor_length / 2
    }

    /// Check that the configuration describes a buildable cell
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity < 6 || self.capacity % 2 != 0 {
            return Err(ConfigError::InvalidCapacity(self.capacity));
        }
        if self.conveyor_length < 4 || self.conveyor_length % 2 != 0 {
            return Err(ConfigError::InvalidConveyorLength(self.conveyor_length));
        }
        if !(0.0..=1.0).contains(&self.inflow_probability) {
            return Err(ConfigError::InvalidProbability(self.inflow_probability));
        }
        let (min, max, base) = (
            self.min_cycle_time_ms,
            self.max_cycle_time_ms,
            self.base_cycle_time_ms,
        );
        if min == 0 || min > max || base < min || base > max {
            return Err(ConfigError::InvalidCycleTime { min, max, base });
        }
        Ok(())
    }
}

impl Default for CellConfig {
    fn default() -> Self {
        Self::new()
    }
}
