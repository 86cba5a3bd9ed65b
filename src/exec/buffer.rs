//! Growable capture buffer for child output.

/// Capacity a fresh buffer starts with.
pub const INITIAL_CAPACITY: usize = 16 * 1024;

/// Byte buffer that doubles its capacity when full.
///
/// An optional limit caps how much is kept; bytes past the limit are
/// dropped and the buffer is marked truncated.
#[derive(Debug)]
pub struct OutputBuffer {
    data: Vec<u8>,
    limit: Option<usize>,
    truncated: bool,
}

impl OutputBuffer {
    /// Create a buffer. `limit == 0` means unbounded.
    pub fn new(limit: usize) -> Self {
        let limit = (limit > 0).then_some(limit);
        let initial = limit.map_or(INITIAL_CAPACITY, |l| l.min(INITIAL_CAPACITY));
        Self {
            data: Vec::with_capacity(initial),
            limit,
            truncated: false,
        }
    }

    /// Append a chunk, growing as needed.
    pub fn push(&mut self, chunk: &[u8]) {
        let room = match self.limit {
            Some(limit) => limit.saturating_sub(self.data.len()),
            None => chunk.len(),
        };
        let take = chunk.len().min(room);
        if take < chunk.len() {
            self.truncated = true;
        }
        if take == 0 {
            return;
        }

        let needed = self.data.len() + take;
        if needed > self.data.capacity() {
            let mut capacity = self.data.capacity().max(1);
            while capacity < needed {
                capacity *= 2;
            }
            self.data.reserve_exact(capacity - self.data.len());
        }
        self.data.extend_from_slice(&chunk[..take]);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_doubles_past_initial() {
        let mut buffer = OutputBuffer::new(0);
        assert!(buffer.capacity() >= INITIAL_CAPACITY);

        let chunk = vec![b'x'; 4096];
        for _ in 0..5 {
            buffer.push(&chunk);
        }
        assert_eq!(buffer.len(), 5 * 4096);
        assert!(buffer.capacity() >= 2 * INITIAL_CAPACITY);
        assert!(buffer.as_bytes().iter().all(|b| *b == b'x'));
        assert!(!buffer.is_truncated());
    }

    #[test]
    fn preserves_order_across_growth() {
        let mut buffer = OutputBuffer::new(0);
        let mut expected = Vec::new();
        for i in 0..10_000u32 {
            let line = format!("{}\n", i);
            buffer.push(line.as_bytes());
            expected.extend_from_slice(line.as_bytes());
        }
        assert_eq!(buffer.into_bytes(), expected);
    }

    #[test]
    fn limit_truncates() {
        let mut buffer = OutputBuffer::new(10);
        buffer.push(b"hello");
        buffer.push(b"world!!");
        buffer.push(b"more");
        assert_eq!(buffer.as_bytes(), b"helloworld");
        assert!(buffer.is_truncated());
    }

    #[test]
    fn empty_push_is_noop() {
        let mut buffer = OutputBuffer::new(0);
        buffer.push(b"");
        assert!(buffer.is_empty());
        assert!(!buffer.is_truncated());
    }
}
