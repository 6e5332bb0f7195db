/// Fixed set of slots selected round-robin by a monotonically increasing
/// frame counter.
///
/// The CPU only writes into the slot of the current frame, so with at least
/// two slots it never touches the slot the GPU may still be reading from the
/// previous frame.
#[derive(Debug, Clone)]
pub struct BufferRing<T> {
    slots: Vec<T>,
    frame: u64,
}

impl<T> BufferRing<T> {
    /// # Panics
    ///
    /// Panics when fewer than two slots are supplied.
    pub fn new(slots: Vec<T>) -> Self {
        assert!(
            slots.len() >= 2,
            "a buffer ring needs at least two slots, got {}",
            slots.len()
        );
        Self { slots, frame: 0 }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of frames started so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn current_index(&self) -> usize {
        (self.frame % self.slots.len() as u64) as usize
    }

    /// Starts the next frame and returns its slot index.
    pub fn advance(&mut self) -> usize {
        self.frame = self.frame.wrapping_add(1);
        self.current_index()
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current_index()]
    }

    pub fn current_mut(&mut self) -> &mut T {
        let index = self.current_index();
        &mut self.slots[index]
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }
}
