pub fn _assert_send<T: Send>() {}
pub fn _assert_sync<T: Sync>() {}

/// Fixed-capacity byte window with a read cursor trailing a write cursor.
#[derive(Debug)]
pub(crate) struct Window {
    buffer: Box<[u8]>,
    read: usize,
    write: usize,
}

impl Window {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity].into_boxed_slice(),
            read: 0,
            write: 0,
        }
    }

    /// Bytes written but not yet read.
    pub(crate) fn readable(&self) -> &[u8] {
        &self.buffer[self.read..self.write]
    }

    /// Space after the write cursor.
    pub(crate) fn writable_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[self.write..]
    }

    pub(crate) fn consume(&mut self, amount: usize) {
        debug_assert!(self.read + amount <= self.write);
        self.read += amount;
    }

    pub(crate) fn fill(&mut self, amount: usize) {
        debug_assert!(self.write + amount <= self.buffer.len());
        self.write += amount;
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.read == self.write
    }

    pub(crate) fn is_full(&self) -> bool {
        self.write == self.buffer.len()
    }

    /// Move both cursors back to the start. Only valid once drained.
    pub(crate) fn rewind(&mut self) {
        debug_assert!(self.is_drained());
        self.clear();
    }

    pub(crate) fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
    }
}
