use super::cell::BufferCell;
use super::command::{Command, CommandOutcome};
use super::config::CellConfig;
use super::errors::{CellError, ConfigError};
use super::scheduler::{CycleScheduler, CyclePhase, Tick};
use log::{debug, warn};

/// Observer trait for rendering and UI collaborators
///
/// All methods default to doing nothing so observers only implement what
/// they display.
pub trait SimulationObserver {
    /// Called after a timer tick has been applied to the cell
    fn on_tick(&mut self, _tick: &Tick, _cell: &BufferCell) {}

    /// Called after an operator command has been handled
    fn on_command(
        &mut self,
        _command: &Command,
        _result: &Result<CommandOutcome, CellError>,
        _cell: &BufferCell,
    ) {
    }

    /// Called when an operation crashed and the fault latched
    fn on_fault(&mut self, _error: &CellError, _cell: &BufferCell) {}
}

/// Owns one cell and the timers that drive it
///
/// The simulation is the single mutation path: operator commands and timer
/// ticks both go through it, so a front end only needs a `&mut Simulation`.
pub struct Simulation {
    cell: BufferCell,
    scheduler: CycleScheduler,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl Simulation {
    pub fn new(config: CellConfig) -> Result<Self, ConfigError> {
        let cell = BufferCell::new(config)?;
        let scheduler = CycleScheduler::new(cell.cycle_time_ms());
        Ok(Self {
            cell,
            scheduler,
            observers: Vec::new(),
        })
    }

    /// Add an observer to the simulation
    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    pub fn cell(&self) -> &BufferCell {
        &self.cell
    }

    /// Direct access for harnesses that stage occupancy before running
    pub fn cell_mut(&mut self) -> &mut BufferCell {
        &mut self.cell
    }

    pub fn scheduler(&self) -> &CycleScheduler {
        &self.scheduler
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Handle one operator command
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, CellError> {
        let result = if command.is_manual_motion() && self.cell.autorun() {
            warn!("Manual command {:?} ignored while autorun is active", command);
            Ok(CommandOutcome::Suppressed)
        } else {
            self.execute(command)
        };

        for observer in &mut self.observers {
            observer.on_command(&command, &result, &self.cell);
        }
        if let Err(err) = &result {
            self.notify_fault(err);
        }
        result
    }

    fn execute(&mut self, command: Command) -> Result<CommandOutcome, CellError> {
        let cell = &mut self.cell;
        match command {
            Command::IndexConveyor => {
                cell.cycle_conveyor();
            }
            Command::IndexInlet => cell.index_inlet()?,
            Command::IndexOutlet => cell.index_outlet()?,
            Command::TransferPush => cell.transfer_push()?,
            Command::MoveCarriageUp => cell.move_carriage_up()?,
            Command::MoveCarriageDown => cell.move_carriage_down()?,
            Command::CycleVerticals => {
                cell.cycle_verticals()?;
            }
            Command::CycleTransfer => cell.cycle_transfer()?,
            Command::ToggleAutorun => {
                cell.toggle_autorun();
            }
            Command::ToggleDownstreamStoppage => {
                cell.toggle_downstream_stoppage();
            }
            Command::TogglePartInflow => {
                cell.toggle_part_inflow();
            }
            Command::SetStrategy(strategy) => {
                cell.set_strategy(strategy);
                self.reset_timers();
            }
            Command::ResetCell => cell.reset(),
            Command::SpeedUp => {
                if !cell.speed_up() {
                    return Ok(CommandOutcome::Unchanged);
                }
                self.reset_timers();
            }
            Command::SpeedDown => {
                if !cell.speed_down() {
                    return Ok(CommandOutcome::Unchanged);
                }
                self.reset_timers();
            }
            Command::SetSpeed(multiplier) => {
                cell.set_speed(multiplier)?;
                self.reset_timers();
            }
            Command::AcknowledgeFault => {
                if cell.acknowledge_fault().is_none() {
                    return Ok(CommandOutcome::Unchanged);
                }
            }
        }
        Ok(CommandOutcome::Applied)
    }

    fn reset_timers(&mut self) {
        self.scheduler.reconfigure(self.cell.cycle_time_ms());
    }

    /// Let `elapsed_ms` of wall time pass, applying every timer tick that falls due
    ///
    /// Ticks only act on the cell while autorun is on and no fault is latched.
    /// A crash latches the fault, stops the remaining ticks from acting and is
    /// returned after the clock has been moved to the end of the window.
    ///
    /// Returns the number of ticks that acted on the cell. A window that would
    /// run past `u64::MAX` is refused before anything fires.
    pub fn advance(&mut self, elapsed_ms: u64) -> Result<usize, CellError> {
        let now_ms = self.scheduler.now_ms();
        let until = now_ms
            .checked_add(elapsed_ms)
            .ok_or(CellError::ClockOverflow { now_ms, elapsed_ms })?;
        let mut applied = 0;
        let mut failure = None;

        while let Some(tick) = self.scheduler.next_due(until) {
            if !self.cell.autorun() || self.cell.fault().is_some() {
                continue;
            }
            debug!("=== {:?} tick at {}ms ===", tick.phase, tick.at_ms);

            let result = match tick.phase {
                CyclePhase::Conveyor => {
                    self.cell.cycle_conveyor();
                    Ok(())
                }
                CyclePhase::Verticals => self.cell.cycle_verticals().map(|_| ()),
                CyclePhase::Transfer => self.cell.cycle_transfer(),
            };
            applied += 1;

            for observer in &mut self.observers {
                observer.on_tick(&tick, &self.cell);
            }
            if let Err(err) = result {
                self.notify_fault(&err);
                failure.get_or_insert(err);
            }
        }
        self.scheduler.advance_to(until);

        match failure {
            Some(err) => Err(err),
            None => Ok(applied),
        }
    }

    /// Advance by one full cycle at the current speed
    pub fn step(&mut self) -> Result<usize, CellError> {
        self.advance(self.cell.cycle_time_ms())
    }

    fn notify_fault(&mut self, err: &CellError) {
        if !err.is_crash() {
            return;
        }
        for observer in &mut self.observers {
            observer.on_fault(err, &self.cell);
        }
    }
}
