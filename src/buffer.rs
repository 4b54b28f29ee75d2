/// Buffer holds the unconsumed remainder of a stream processor's input.
///
/// New data is appended with [Buffer::extend] and released from the front
/// with [Buffer::consume]. Element order is preserved, and [Buffer::offset]
/// reports how many elements have been consumed in total, which is the stream
/// position of the first buffered element.
#[derive(Debug, Clone)]
pub(crate) struct Buffer<T> {
    data: Vec<T>,
    head: usize,
    num_read: usize,
    // Elements at the front already known to share the first element's value.
    run_scanned: usize,
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Buffer {
            data: Vec::new(),
            head: 0,
            num_read: 0,
            run_scanned: 0,
        }
    }
}

impl<T: Copy + PartialEq> Buffer<T> {
    pub fn extend(&mut self, dat: &[T]) {
        if self.head > 0 && self.head >= self.data.len() / 2 {
            self.data.drain(..self.head);
            self.head = 0;
        }
        self.data.extend_from_slice(dat);
        self.num_read += dat.len();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[self.head..]
    }

    pub fn len(&self) -> usize {
        self.data.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop up to `n` elements from the front.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.len());
        self.head += n;
        self.run_scanned = 0;
        if self.head == self.data.len() {
            self.data.clear();
            self.head = 0;
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.head = 0;
        self.run_scanned = 0;
    }

    /// Stream position of the first buffered element.
    pub fn offset(&self) -> usize {
        self.num_read - self.len()
    }

    /// Value and length of the run of identical elements at the front of the buffer.
    ///
    /// Returns `None` if the run reaches the end of the buffered data, since it may
    /// still be growing. Elements already scanned are remembered until the next
    /// [Buffer::consume], so repeated calls while data trickles in stay linear.
    pub fn leading_run(&mut self) -> Option<(T, usize)> {
        let dat = self.as_slice();
        let first = *dat.first()?;
        let mut idx = self.run_scanned.max(1);
        while idx < dat.len() && dat[idx] == first {
            idx += 1;
        }
        if idx == dat.len() {
            self.run_scanned = idx;
            return None;
        }
        self.run_scanned = 0;
        Some((first, idx))
    }
}
