use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// The three repeating cycle timers, in intra-cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CyclePhase {
    Conveyor,
    Verticals,
    Transfer,
}

impl CyclePhase {
    pub const ALL: [CyclePhase; 3] = [
        CyclePhase::Conveyor,
        CyclePhase::Verticals,
        CyclePhase::Transfer,
    ];

    /// Phase offset as thirds of a period
    fn offset_thirds(self) -> u64 {
        match self {
            CyclePhase::Conveyor => 0,
            CyclePhase::Verticals => 1,
            CyclePhase::Transfer => 2,
        }
    }
}

/// A timer expiry handed to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub at_ms: u64,
    pub phase: CyclePhase,
}

#[derive(Debug)]
struct ScheduledTick {
    due_ms: u64,
    sequence_num: u64,
    phase: CyclePhase,
}

impl PartialEq for ScheduledTick {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledTick {}

impl PartialOrd for ScheduledTick {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTick {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.phase.cmp(&self.phase))
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Periodic driver for the conveyor, vertical and transfer cycles
///
/// All three timers share one period and are offset by thirds of it, so
/// within every cycle the conveyor indexes before the verticals move and
/// the verticals move before the transfer runs.
pub struct CycleScheduler {
    queue: BinaryHeap<ScheduledTick>,
    sequence_counter: u64,
    now_ms: u64,
    period_ms: u64,
}

impl CycleScheduler {
    /// Create a scheduler whose first conveyor tick is one period away
    pub fn new(period_ms: u64) -> Self {
        let mut scheduler = Self {
            queue: BinaryHeap::new(),
            sequence_counter: 0,
            now_ms: 0,
            period_ms: period_ms.max(1),
        };
        scheduler.reconfigure(period_ms);
        scheduler
    }

    /// Replace all three timers with a new period, restarting their phases together
    pub fn reconfigure(&mut self, period_ms: u64) {
        self.period_ms = period_ms.max(1);
        self.queue.clear();
        for phase in CyclePhase::ALL {
            let offset = self.period_ms.saturating_mul(phase.offset_thirds()) / 3;
            let due = self
                .now_ms
                .saturating_add(self.period_ms)
                .saturating_add(offset);
            self.schedule(phase, due);
        }
    }

    fn schedule(&mut self, phase: CyclePhase, due_ms: u64) {
        self.queue.push(ScheduledTick {
            due_ms,
            sequence_num: self.sequence_counter,
            phase,
        });
        self.sequence_counter += 1;
    }

    /// Pop the next tick due at or before `until_ms`, rescheduling its timer
    ///
    /// A timer whose next expiry would pass the end of the clock is retired.
    pub fn next_due(&mut self, until_ms: u64) -> Option<Tick> {
        if self.queue.peek()?.due_ms > until_ms {
            return None;
        }
        let scheduled = self.queue.pop()?;
        self.now_ms = self.now_ms.max(scheduled.due_ms);
        if let Some(next) = scheduled.due_ms.checked_add(self.period_ms) {
            self.schedule(scheduled.phase, next);
        }
        Some(Tick {
            at_ms: scheduled.due_ms,
            phase: scheduled.phase,
        })
    }

    /// Move the clock forward without firing anything
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Due time of the next pending tick
    pub fn peek_next_due(&self) -> Option<u64> {
        self.queue.peek().map(|tick| tick.due_ms)
    }
}
