//! Bounded image buffer
//!
//! One buffer is allocated statically by the firmware and lent to each
//! fetch in turn; the `&mut` borrow guarantees a single writer. The
//! cursor never exceeds capacity regardless of how body chunks arrive,
//! and a fetch only counts as a full image when the cursor lands on
//! capacity exactly.

/// Image buffer with a write cursor
pub struct ImageBuffer<'a> {
    data: &'a mut [u8],
    cursor: usize,
}

impl<'a> ImageBuffer<'a> {
    /// Wrap a backing slice sized to the exact expected image
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// Reset the cursor; called at the start of every fetch attempt
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes written since the last reset
    pub fn written(&self) -> usize {
        self.cursor
    }

    pub fn is_full(&self) -> bool {
        self.cursor == self.data.len()
    }

    /// Copy as much of `chunk` as fits, advancing the cursor
    ///
    /// Returns the number of bytes actually copied; zero means the
    /// buffer is already full.
    pub fn absorb(&mut self, chunk: &[u8]) -> usize {
        let space = self.data.len() - self.cursor;
        let n = chunk.len().min(space);
        self.data[self.cursor..self.cursor + n].copy_from_slice(&chunk[..n]);
        self.cursor += n;
        n
    }

    /// The complete image, only when the buffer is exactly full
    pub fn filled(&self) -> Option<&[u8]> {
        self.is_full().then_some(&self.data[..])
    }
}
