/// Transfer carriage
///
/// Aligns the pusher with the same slot index on both elevators. Moves are
/// unconditional here; travel bounds are enforced by the cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferCarriage {
    position: usize,
}

impl TransferCarriage {
    pub fn new(initial_position: usize) -> Self {
        Self {
            position: initial_position,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn move_up(&mut self) {
        self.position += 1;
    }

    pub fn move_down(&mut self) {
        self.position = self.position.saturating_sub(1);
    }
}
