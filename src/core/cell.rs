use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::components::{ElevatorSide, ElevatorTrack, PartTrack, TransferCarriage};
use super::config::CellConfig;
use super::errors::{CellError, ConfigError, Crash, Direction};
use super::stats::CellStats;
use super::strategy::{Strategy, StrategyInputs, VerticalMoves};

/// Lowest position the carriage can physically reach
const CARRIAGE_MIN: usize = 1;

/// Addresses one slot anywhere in the cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotRef {
    Conveyor(usize),
    Inlet(usize),
    Outlet(usize),
}

/// The physical tracks of a cell, cloned whole for rollback
#[derive(Clone, Debug, PartialEq, Eq)]
struct Tracks {
    conveyor: PartTrack,
    inlet: ElevatorTrack,
    outlet: ElevatorTrack,
    carriage: TransferCarriage,
}

impl Tracks {
    fn build(config: &CellConfig) -> Self {
        let elevator = config.elevator_length();
        Self {
            conveyor: PartTrack::new(config.conveyor_length),
            inlet: ElevatorTrack::new(ElevatorSide::Inlet, elevator),
            outlet: ElevatorTrack::new(ElevatorSide::Outlet, elevator),
            carriage: TransferCarriage::new(elevator - 1),
        }
    }
}

/// Point-in-time view of everything a renderer or operator panel shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStatus {
    pub part_at_inlet_top: bool,
    pub part_at_inlet_bottom: bool,
    pub part_at_outlet_top: bool,
    pub part_at_outlet_bottom: bool,
    pub carriage_position: usize,
    pub buffer_full: bool,
    pub upstream_inhibit: bool,
    pub cycle_time_ms: u64,
    pub speed: f64,
    pub strategy: u8,
    pub autorun: bool,
    pub downstream_stoppage: bool,
    pub part_inflow: bool,
    pub fault: Option<Crash>,
    /// Parts held in the tower according to the counters
    pub parts_buffered: u64,
    pub stats: CellStats,
}

/// One buffer storage cell
///
/// Owns the horizontal conveyor, both elevators and the transfer carriage.
/// Every public operation either succeeds or leaves the tracks exactly as it
/// found them; a crash additionally latches on the cell until acknowledged
/// or cleared by a rebuild.
pub struct BufferCell {
    config: CellConfig,
    tracks: Tracks,
    strategy: Strategy,
    autorun: bool,
    downstream_stoppage: bool,
    part_inflow: bool,
    /// Speed multiplier is 2^speed_exp
    speed_exp: i32,
    fault: Option<Crash>,
    stats: CellStats,
    rng: StdRng,
}

impl BufferCell {
    /// Create a cell from a validated configuration
    pub fn new(config: CellConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            tracks: Tracks::build(&config),
            strategy: config.strategy,
            autorun: false,
            downstream_stoppage: false,
            part_inflow: false,
            speed_exp: 0,
            fault: None,
            stats: CellStats::default(),
            rng,
            config,
        })
    }

    /// Recreate every track, park the carriage at the top and clear faults
    pub fn build(&mut self) {
        self.tracks = Tracks::build(&self.config);
        self.stats = CellStats::default();
        self.fault = None;
    }

    pub fn reset(&mut self) {
        info!("Resetting buffer cell");
        self.build();
    }

    /// Switch the active strategy; run-mode flags are cleared and the cell rebuilt
    pub fn set_strategy(&mut self, strategy: Strategy) {
        info!("Switching to strategy {}", strategy);
        self.strategy = strategy;
        self.part_inflow = false;
        self.downstream_stoppage = false;
        self.build();
    }

    pub fn set_strategy_id(&mut self, id: u8) -> Result<(), CellError> {
        self.set_strategy(Strategy::from_id(id)?);
        Ok(())
    }

    // ----- cycle operations -----

    /// Lift the inlet elevator one slot, taking the part waiting on the inlet tap
    pub fn index_inlet(&mut self) -> Result<(), CellError> {
        self.atomically(Self::try_index_inlet)
    }

    /// Lower the outlet elevator one slot, dropping its floor part onto the outlet tap
    pub fn index_outlet(&mut self) -> Result<(), CellError> {
        self.atomically(Self::try_index_outlet)
    }

    /// Push the aligned inlet part across to the outlet elevator
    pub fn transfer_push(&mut self) -> Result<(), CellError> {
        self.atomically(Self::try_transfer_push)
    }

    pub fn move_carriage_up(&mut self) -> Result<(), CellError> {
        self.atomically(Self::try_move_carriage_up)
    }

    pub fn move_carriage_down(&mut self) -> Result<(), CellError> {
        self.atomically(Self::try_move_carriage_down)
    }

    /// Index the horizontal conveyor, maybe bringing in a new part
    ///
    /// Returns whether a new part entered at slot 0.
    pub fn cycle_conveyor(&mut self) -> bool {
        let new_part = self.part_inflow
            && !self.upstream_inhibit()
            && self.rng.gen_bool(self.config.inflow_probability);

        let exited = self.tracks.conveyor.index(new_part);
        if new_part {
            self.stats.parts_entered += 1;
        }
        if exited {
            self.stats.parts_passed += 1;
        }
        debug!("Conveyor indexed (new part: {}, part out: {})", new_part, exited);
        new_part
    }

    /// Fire whichever vertical motions the active strategy asks for
    pub fn cycle_verticals(&mut self) -> Result<VerticalMoves, CellError> {
        self.atomically(|cell| {
            let moves = cell.strategy.decide(&cell.strategy_inputs());
            if moves.inlet {
                cell.try_index_inlet()?;
            }
            if moves.outlet {
                cell.try_index_outlet()?;
            }
            Ok(moves)
        })
    }

    /// Lower the carriage while nothing is aligned, then push if a part waits
    pub fn cycle_transfer(&mut self) -> Result<(), CellError> {
        self.atomically(|cell| {
            if cell.carriage_position() > cell.strategy.park_floor()
                && !(cell.part_at_inlet_top() || cell.part_at_outlet_top())
            {
                if let Err(limit) = cell.try_move_carriage_down() {
                    cell.report(&limit);
                }
            }
            if cell.part_at_inlet_top() && !cell.part_at_outlet_top() {
                cell.try_transfer_push()?;
            }
            Ok(())
        })
    }

    // ----- operator surface -----

    pub fn toggle_autorun(&mut self) -> bool {
        self.autorun = !self.autorun;
        info!("Autorun {}", if self.autorun { "on" } else { "off" });
        self.autorun
    }

    pub fn toggle_downstream_stoppage(&mut self) -> bool {
        self.downstream_stoppage = !self.downstream_stoppage;
        info!("Downstream stoppage {}", self.downstream_stoppage);
        self.downstream_stoppage
    }

    pub fn toggle_part_inflow(&mut self) -> bool {
        self.part_inflow = !self.part_inflow;
        info!("Part inflow {}", self.part_inflow);
        self.part_inflow
    }

    /// Clear a latched crash without touching the tracks
    pub fn acknowledge_fault(&mut self) -> Option<Crash> {
        let fault = self.fault.take();
        if let Some(crash) = fault {
            info!("Fault acknowledged: {}", crash);
        }
        fault
    }

    /// Put a part into an empty slot
    pub fn inject_part(&mut self, at: SlotRef) -> Result<(), CellError> {
        self.atomically(|cell| {
            if !cell.has_slot(at) {
                return Err(CellError::InvalidSlot(at));
            }
            match at {
                SlotRef::Conveyor(slot) => {
                    if cell.tracks.conveyor.is_occupied(slot) {
                        return Err(Crash::DoubleOccupancy { slot }.into());
                    }
                    cell.tracks.conveyor.set(slot, true);
                }
                SlotRef::Inlet(slot) => cell.tracks.inlet.place(slot)?,
                SlotRef::Outlet(slot) => cell.tracks.outlet.place(slot)?,
            }
            Ok(())
        })
    }

    /// Take a part out of a slot, returning whether one was there
    pub fn remove_part(&mut self, at: SlotRef) -> bool {
        match at {
            SlotRef::Conveyor(slot) => {
                let present = self.tracks.conveyor.is_occupied(slot);
                self.tracks.conveyor.set(slot, false);
                present
            }
            SlotRef::Inlet(slot) => self.tracks.inlet.take(slot),
            SlotRef::Outlet(slot) => self.tracks.outlet.take(slot),
        }
    }

    /// Double the speed if the cycle time stays within bounds
    pub fn speed_up(&mut self) -> bool {
        if self.cycle_time_at(self.speed_exp + 1) < self.config.min_cycle_time_ms {
            warn!("Speed already at maximum ({})", self.speed());
            return false;
        }
        self.speed_exp += 1;
        info!("Speed {} (cycle time {}ms)", self.speed(), self.cycle_time_ms());
        true
    }

    /// Halve the speed if the cycle time stays within bounds
    pub fn speed_down(&mut self) -> bool {
        if self.cycle_time_at(self.speed_exp - 1) > self.config.max_cycle_time_ms {
            warn!("Speed already at minimum ({})", self.speed());
            return false;
        }
        self.speed_exp -= 1;
        info!("Speed {} (cycle time {}ms)", self.speed(), self.cycle_time_ms());
        true
    }

    /// Set a power-of-two speed multiplier, clamped to the cycle time bounds
    ///
    /// Returns the multiplier actually in effect.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<f64, CellError> {
        let mut exp =
            power_of_two_exponent(multiplier).ok_or(CellError::InvalidSpeed(multiplier))?;
        while exp > 0 && self.cycle_time_at(exp) < self.config.min_cycle_time_ms {
            exp -= 1;
        }
        while exp < 0 && self.cycle_time_at(exp) > self.config.max_cycle_time_ms {
            exp += 1;
        }
        self.speed_exp = exp;
        info!("Speed {} (cycle time {}ms)", self.speed(), self.cycle_time_ms());
        Ok(self.speed())
    }

    // ----- queries -----

    pub fn part_at_inlet_bottom(&self) -> bool {
        self.tracks.conveyor.is_occupied(self.config.inlet_tap())
    }

    pub fn part_at_outlet_bottom(&self) -> bool {
        self.tracks.conveyor.is_occupied(self.config.outlet_tap())
    }

    pub fn part_at_inlet_top(&self) -> bool {
        self.tracks.inlet.is_occupied(self.carriage_position())
    }

    pub fn part_at_outlet_top(&self) -> bool {
        self.tracks.outlet.is_occupied(self.carriage_position())
    }

    pub fn carriage_position(&self) -> usize {
        self.tracks.carriage.position()
    }

    /// Physical travel range of the carriage, inclusive
    pub fn carriage_bounds(&self) -> (usize, usize) {
        (CARRIAGE_MIN, self.carriage_max())
    }

    fn carriage_max(&self) -> usize {
        self.config.elevator_length() - 1
    }

    /// Parts on the conveyor upstream of the outlet tap
    pub fn infeed_part_count(&self) -> usize {
        self.tracks.conveyor.occupied_in(0..self.config.outlet_tap())
    }

    /// Whether upstream inflow must stop to keep room in the tower
    pub fn upstream_inhibit(&self) -> bool {
        2 * self.carriage_position() + self.infeed_part_count() >= self.config.capacity - 2
    }

    /// Carriage at the top with a part aligned on the inlet side
    pub fn is_full(&self) -> bool {
        self.part_at_inlet_top() && self.carriage_position() >= self.carriage_max()
    }

    pub fn cycle_time_ms(&self) -> u64 {
        self.cycle_time_at(self.speed_exp)
    }

    pub fn speed(&self) -> f64 {
        2f64.powi(self.speed_exp)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn autorun(&self) -> bool {
        self.autorun
    }

    pub fn downstream_stoppage(&self) -> bool {
        self.downstream_stoppage
    }

    pub fn part_inflow(&self) -> bool {
        self.part_inflow
    }

    pub fn fault(&self) -> Option<Crash> {
        self.fault
    }

    pub fn stats(&self) -> &CellStats {
        &self.stats
    }

    pub fn config(&self) -> &CellConfig {
        &self.config
    }

    pub fn conveyor(&self) -> &PartTrack {
        &self.tracks.conveyor
    }

    pub fn inlet(&self) -> &ElevatorTrack {
        &self.tracks.inlet
    }

    pub fn outlet(&self) -> &ElevatorTrack {
        &self.tracks.outlet
    }

    /// Whether `at` addresses a slot that exists in this cell
    pub fn has_slot(&self, at: SlotRef) -> bool {
        match at {
            SlotRef::Conveyor(slot) => slot < self.tracks.conveyor.len(),
            SlotRef::Inlet(slot) => slot < self.tracks.inlet.len(),
            SlotRef::Outlet(slot) => slot < self.tracks.outlet.len(),
        }
    }

    /// Total parts anywhere in the cell
    pub fn part_count(&self) -> usize {
        self.tracks.conveyor.occupied_count()
            + self.tracks.inlet.occupied_count()
            + self.tracks.outlet.occupied_count()
    }

    pub fn status(&self) -> CellStatus {
        CellStatus {
            part_at_inlet_top: self.part_at_inlet_top(),
            part_at_inlet_bottom: self.part_at_inlet_bottom(),
            part_at_outlet_top: self.part_at_outlet_top(),
            part_at_outlet_bottom: self.part_at_outlet_bottom(),
            carriage_position: self.carriage_position(),
            buffer_full: self.is_full(),
            upstream_inhibit: self.upstream_inhibit(),
            cycle_time_ms: self.cycle_time_ms(),
            speed: self.speed(),
            strategy: self.strategy.id(),
            autorun: self.autorun,
            downstream_stoppage: self.downstream_stoppage,
            part_inflow: self.part_inflow,
            fault: self.fault,
            parts_buffered: self.stats.parts_buffered(),
            stats: self.stats,
        }
    }

    // ----- internals -----

    fn strategy_inputs(&self) -> StrategyInputs {
        StrategyInputs {
            inlet_bottom: self.part_at_inlet_bottom(),
            inlet_top: self.part_at_inlet_top(),
            outlet_bottom: self.part_at_outlet_bottom(),
            outlet_top: self.part_at_outlet_top(),
            outlet_floor: self.tracks.outlet.floor(),
            carriage_position: self.carriage_position(),
            carriage_max: self.carriage_max(),
            downstream_stoppage: self.downstream_stoppage,
        }
    }

    fn cycle_time_at(&self, exp: i32) -> u64 {
        let base = self.config.base_cycle_time_ms;
        let shift = exp.unsigned_abs();
        if exp >= 0 {
            base.checked_shr(shift).unwrap_or(0)
        } else if shift >= 64 {
            u64::MAX
        } else {
            base.saturating_mul(1u64 << shift)
        }
    }

    /// Run `op` against the cell, restoring tracks and counters if it fails
    fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, CellError>,
    ) -> Result<T, CellError> {
        let tracks = self.tracks.clone();
        let stats = self.stats;
        let result = op(self);
        if let Err(err) = &result {
            self.tracks = tracks;
            self.stats = stats;
            self.report(err);
        }
        result
    }

    fn report(&mut self, err: &CellError) {
        match err {
            CellError::Crash(crash) => {
                error!("Crash: {}", crash);
                self.stats.crashes += 1;
                self.fault = Some(*crash);
            }
            CellError::TravelLimit { .. } => {
                warn!("{}", err);
                self.stats.travel_limits += 1;
            }
            other => warn!("{}", other),
        }
    }

    fn try_move_carriage_up(&mut self) -> Result<(), CellError> {
        let position = self.carriage_position();
        if position >= self.carriage_max() {
            return Err(CellError::TravelLimit {
                direction: Direction::Up,
                position,
            });
        }
        self.tracks.carriage.move_up();
        debug!("Carriage up to {}", position + 1);
        Ok(())
    }

    fn try_move_carriage_down(&mut self) -> Result<(), CellError> {
        let position = self.carriage_position();
        if position <= CARRIAGE_MIN {
            return Err(CellError::TravelLimit {
                direction: Direction::Down,
                position,
            });
        }
        self.tracks.carriage.move_down();
        debug!("Carriage down to {}", position - 1);
        Ok(())
    }

    fn try_index_inlet(&mut self) -> Result<(), CellError> {
        if self.part_at_inlet_top() {
            if let Err(limit) = self.try_move_carriage_up() {
                self.report(&limit);
            }
        }

        if let Some(slot) = self.tracks.inlet.first_occupied_from(self.carriage_position()) {
            return Err(Crash::InletCeilingOccupied { slot }.into());
        }

        let tap = self.config.inlet_tap();
        let part = self.tracks.conveyor.is_occupied(tap);
        self.tracks.inlet.index_up();
        if part {
            self.tracks.inlet.place(0)?;
            self.tracks.conveyor.set(tap, false);
            self.stats.parts_lifted += 1;
        }
        debug!("Inlet indexed up (part lifted: {})", part);
        Ok(())
    }

    fn try_index_outlet(&mut self) -> Result<(), CellError> {
        if self.tracks.outlet.floor() {
            return Err(Crash::OutletFloorOccupied { slot: 0 }.into());
        }
        let tap = self.config.outlet_tap();
        if self.tracks.conveyor.is_occupied(tap) {
            return Err(Crash::OutletTapOccupied { slot: tap }.into());
        }

        self.tracks.outlet.index_down()?;
        let part = self.tracks.outlet.take(0);
        self.tracks.conveyor.set(tap, part);
        if part {
            self.stats.parts_lowered += 1;
        }
        debug!("Outlet indexed down (part lowered: {})", part);
        Ok(())
    }

    fn try_transfer_push(&mut self) -> Result<(), CellError> {
        let slot = self.carriage_position();
        if self.part_at_inlet_top() && self.part_at_outlet_top() {
            return Err(Crash::PushCollision { slot }.into());
        }
        if self.part_at_inlet_top() {
            self.tracks.outlet.place(slot)?;
            self.tracks.inlet.take(slot);
            self.stats.parts_transferred += 1;
            debug!("Transfer push at slot {}", slot);
        }
        Ok(())
    }
}

/// Exponent `k` when `value` is exactly `2^k`
///
/// Only normal floats qualify: the mantissa bits must all be zero.
fn power_of_two_exponent(value: f64) -> Option<i32> {
    const MANTISSA_MASK: u64 = (1 << 52) - 1;
    if !value.is_normal() || value.is_sign_negative() {
        return None;
    }
    let bits = value.to_bits();
    if bits & MANTISSA_MASK != 0 {
        return None;
    }
    Some(((bits >> 52) & 0x7ff) as i32 - 1023)
}
