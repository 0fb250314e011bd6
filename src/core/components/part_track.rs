/// Horizontal indexing conveyor
///
/// A fixed-length shift register of part presence. Slot 0 is the entry
/// nearest the upstream line; the far end feeds the downstream cell, which
/// lies outside the modeled boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartTrack {
    contents: Vec<bool>,
}

impl PartTrack {
    /// Create an empty conveyor with `length` slots
    pub fn new(length: usize) -> Self {
        Self {
            contents: vec![false; length],
        }
    }

    /// Shift every slot one step toward the exit and load `new_part` at slot 0
    ///
    /// Returns whether a part dropped off the far end.
    pub fn index(&mut self, new_part: bool) -> bool {
        let exited = self.contents.pop().unwrap_or(false);
        self.contents.insert(0, new_part);
        exited
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Whether `slot` holds a part; out-of-range slots read as empty
    pub fn is_occupied(&self, slot: usize) -> bool {
        self.contents.get(slot).copied().unwrap_or(false)
    }

    pub(crate) fn set(&mut self, slot: usize, occupied: bool) {
        if let Some(s) = self.contents.get_mut(slot) {
            *s = occupied;
        }
    }

    /// Count occupied slots in `range`, clipped to the track length
    pub fn occupied_in(&self, range: std::ops::Range<usize>) -> usize {
        let end = range.end.min(self.contents.len());
        let start = range.start.min(end);
        self.contents[start..end].iter().filter(|p| **p).count()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied_in(0..self.contents.len())
    }

    pub fn slots(&self) -> &[bool] {
        &self.contents
    }
}
