use crate::core::errors::Crash;

/// Which side of the cell an elevator serves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElevatorSide {
    /// Lifts parts off the conveyor
    Inlet,
    /// Lowers parts back onto the conveyor
    Outlet,
}

impl std::fmt::Display for ElevatorSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElevatorSide::Inlet => f.pad("in"),
            ElevatorSide::Outlet => f.pad("out"),
        }
    }
}

/// Vertical indexing conveyor
///
/// Slot 0 is the floor facing the horizontal conveyor, the last slot is the
/// ceiling. The track only knows its own contents; checks that depend on the
/// carriage position are made by the owning cell before a shift.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElevatorTrack {
    side: ElevatorSide,
    contents: Vec<bool>,
}

impl ElevatorTrack {
    pub fn new(side: ElevatorSide, length: usize) -> Self {
        Self {
            side,
            contents: vec![false; length],
        }
    }

    pub fn side(&self) -> ElevatorSide {
        self.side
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Insert an empty slot at the floor, discarding the ceiling slot
    pub fn index_up(&mut self) {
        self.contents.pop();
        self.contents.insert(0, false);
    }

    /// Shift every slot down by one, leaving the ceiling empty
    ///
    /// Fails without touching the track when the floor is occupied.
    pub fn index_down(&mut self) -> Result<(), Crash> {
        if self.floor() {
            return Err(Crash::OutletFloorOccupied { slot: 0 });
        }
        if !self.contents.is_empty() {
            self.contents.remove(0);
            self.contents.push(false);
        }
        Ok(())
    }

    pub fn is_occupied(&self, slot: usize) -> bool {
        self.contents.get(slot).copied().unwrap_or(false)
    }

    /// Put a part into an empty slot
    ///
    /// Slots past the ceiling are not checked here; the cell rejects them first.
    pub fn place(&mut self, slot: usize) -> Result<(), Crash> {
        match self.contents.get_mut(slot) {
            Some(s) if *s => Err(Crash::DoubleOccupancy { slot }),
            Some(s) => {
                *s = true;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Take the part out of `slot`, returning whether there was one
    pub fn take(&mut self, slot: usize) -> bool {
        match self.contents.get_mut(slot) {
            Some(s) => std::mem::replace(s, false),
            None => false,
        }
    }

    pub(crate) fn set(&mut self, slot: usize, occupied: bool) {
        if let Some(s) = self.contents.get_mut(slot) {
            *s = occupied;
        }
    }

    /// Floor slot, the one coupled with the conveyor tap
    pub fn floor(&self) -> bool {
        self.is_occupied(0)
    }

    /// Lowest occupied slot at or above `slot`
    pub fn first_occupied_from(&self, slot: usize) -> Option<usize> {
        self.contents
            .iter()
            .enumerate()
            .skip(slot)
            .find(|(_, p)| **p)
            .map(|(i, _)| i)
    }

    pub fn occupied_count(&self) -> usize {
        self.contents.iter().filter(|p| **p).count()
    }

    pub fn slots(&self) -> &[bool] {
        &self.contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_labels_pad_for_columns() {
        let track = ElevatorTrack::new(ElevatorSide::Inlet, 2);
        assert_eq!(track.side(), ElevatorSide::Inlet);
        assert_eq!(format!("[{:<4}]", track.side()), "[in  ]");
        assert_eq!(ElevatorSide::Outlet.to_string(), "out");
    }

    #[test]
    fn index_up_opens_floor_and_drops_ceiling() {
        let mut track = ElevatorTrack::new(ElevatorSide::Inlet, 4);
        track.set(0, true);
        track.set(3, true);
        track.index_up();
        assert_eq!(track.slots(), &[false, true, false, false]);
    }

    #[test]
    fn index_down_refuses_occupied_floor() {
        let mut track = ElevatorTrack::new(ElevatorSide::Outlet, 4);
        track.set(0, true);
        track.set(2, true);
        let before = track.clone();

        assert_eq!(track.index_down(), Err(Crash::OutletFloorOccupied { slot: 0 }));
        assert_eq!(track, before);
    }

    #[test]
    fn index_down_lowers_everything() {
        let mut track = ElevatorTrack::new(ElevatorSide::Outlet, 4);
        track.set(1, true);
        track.set(3, true);
        track.index_down().unwrap();
        assert_eq!(track.slots(), &[true, false, true, false]);
    }

    #[test]
    fn place_into_occupied_slot_is_a_crash() {
        let mut track = ElevatorTrack::new(ElevatorSide::Outlet, 3);
        track.place(1).unwrap();
        assert_eq!(track.place(1), Err(Crash::DoubleOccupancy { slot: 1 }));
        assert_eq!(track.occupied_count(), 1);
    }

    #[test]
    fn take_clears_slot() {
        let mut track = ElevatorTrack::new(ElevatorSide::Inlet, 3);
        track.set(2, true);
        assert!(track.take(2));
        assert!(!track.take(2));
    }

    #[test]
    fn first_occupied_from_scans_upward() {
        let mut track = ElevatorTrack::new(ElevatorSide::Inlet, 6);
        track.set(1, true);
        track.set(4, true);
        assert_eq!(track.first_occupied_from(0), Some(1));
        assert_eq!(track.first_occupied_from(2), Some(4));
        assert_eq!(track.first_occupied_from(5), None);
    }
}
