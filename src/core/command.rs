use super::strategy::Strategy;

/// Every mutation an operator, front end or test harness can request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    IndexConveyor,
    IndexInlet,
    IndexOutlet,
    TransferPush,
    MoveCarriageUp,
    MoveCarriageDown,
    CycleVerticals,
    CycleTransfer,
    ToggleAutorun,
    ToggleDownstreamStoppage,
    TogglePartInflow,
    SetStrategy(Strategy),
    ResetCell,
    SpeedUp,
    SpeedDown,
    SetSpeed(f64),
    AcknowledgeFault,
}

impl Command {
    /// Single-step motions that share the mutation surface with the timers
    ///
    /// These are suppressed while autorun is active.
    pub fn is_manual_motion(&self) -> bool {
        matches!(
            self,
            Command::IndexConveyor
                | Command::IndexInlet
                | Command::IndexOutlet
                | Command::TransferPush
                | Command::MoveCarriageUp
                | Command::MoveCarriageDown
                | Command::CycleVerticals
                | Command::CycleTransfer
        )
    }
}

/// What happened to a command that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Manual motion dropped because autorun owns the cell
    Suppressed,
    /// Accepted but already at a limit, nothing changed
    Unchanged,
}
