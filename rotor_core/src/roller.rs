//! Fixed-capacity ring buffer with chronological indexing.

/// Ring of `capacity` slots, overwritten oldest-first.
///
/// Index 0 is the oldest slot and `capacity - 1` the newest. Until the ring has
/// wrapped once, the oldest slots still hold the fill value.
#[derive(Debug, Clone)]
pub struct Roller<T> {
    buf: Box<[T]>,
    // Next slot to overwrite; also the oldest slot.
    head: usize,
}

impl<T: Copy + PartialEq> Roller<T> {
    pub fn new(capacity: usize, fill: T) -> Self {
        Self {
            buf: vec![fill; capacity.max(1)].into_boxed_slice(),
            head: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn append(&mut self, value: T) {
        self.buf[self.head] = value;
        self.head = (self.head + 1) % self.buf.len();
    }

    /// Most recently appended value.
    #[inline]
    pub fn last(&self) -> T {
        let n = self.buf.len();
        self.buf[(self.head + n - 1) % n]
    }

    /// Chronological access; `None` when `i >= capacity`.
    #[inline]
    pub fn get(&self, i: usize) -> Option<T> {
        let n = self.buf.len();
        (i < n).then(|| self.buf[(self.head + i) % n])
    }

    pub fn fill(&mut self, value: T) {
        self.buf.fill(value);
        self.head = 0;
    }

    pub fn count_occurrences(&self, value: &T) -> usize {
        self.buf.iter().filter(|v| *v == value).count()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let (newer, older) = self.buf.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::Roller;

    #[test]
    fn wraps_oldest_first() {
        let mut r = Roller::new(3, -1);
        for v in 1..=4 {
            r.append(v);
        }
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(r.get(0), Some(2));
        assert_eq!(r.get(2), Some(4));
        assert_eq!(r.get(3), None);
        assert_eq!(r.last(), 4);
    }

    #[test]
    fn unfilled_slots_come_first() {
        let mut r = Roller::new(4, -1);
        r.append(7);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![-1, -1, -1, 7]);
        assert_eq!(r.count_occurrences(&-1), 3);
    }

    #[test]
    fn fill_resets_every_slot() {
        let mut r = Roller::new(2, 0);
        r.append(5);
        r.append(6);
        r.fill(0);
        assert_eq!(r.count_occurrences(&0), 2);
        r.append(9);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![0, 9]);
    }
}
