//! Fixed-capacity sliding window with a running sum of squares

/// Circular buffer of the most recent `N` filtered samples.
///
/// Storage is an inline array, zero-initialized, never resized. The running
/// sum of squares is maintained incrementally on every push.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBuffer<const N: usize> {
    samples: [f64; N],
    cursor: usize,
    sum_sq: f64,
}

impl<const N: usize> WindowBuffer<N> {
    const NON_EMPTY: () = assert!(N > 0, "window length must be non-zero");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            samples: [0.0; N],
            cursor: 0,
            sum_sq: 0.0,
        }
    }

    /// Overwrite the oldest sample, returning the evicted value
    pub fn push(&mut self, sample: f64) -> f64 {
        debug_assert!(self.cursor < N);

        let evicted = self.samples[self.cursor];
        self.sum_sq -= evicted * evicted;
        self.samples[self.cursor] = sample;
        self.sum_sq += sample * sample;
        self.cursor = (self.cursor + 1) % N;

        evicted
    }

    /// Window length in samples
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Slot the next push will overwrite (also the oldest sample)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Incrementally maintained sum of squares
    pub fn sum_of_squares(&self) -> f64 {
        self.sum_sq
    }

    /// Root mean square over the full window
    pub fn rms(&self) -> f64 {
        (self.sum_sq.max(0.0) / N as f64).sqrt()
    }

    /// Samples oldest to newest
    pub fn iter_chronological(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples[self.cursor..]
            .iter()
            .chain(self.samples[..self.cursor].iter())
            .copied()
    }

    /// Raw storage in slot order
    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    /// Most recently pushed sample
    pub fn newest(&self) -> f64 {
        self.samples[(self.cursor + N - 1) % N]
    }

    /// Sum of squares by full rescan
    pub fn recomputed_sum_of_squares(&self) -> f64 {
        self.iter_chronological().map(|x| x * x).sum()
    }

    /// Replace the running sum with a full rescan; returns the drift removed
    pub fn resync(&mut self) -> f64 {
        let exact = self.recomputed_sum_of_squares();
        let drift = self.sum_sq - exact;
        self.sum_sq = exact;
        drift
    }

    /// Zero every slot and the running sum
    pub fn clear(&mut self) {
        self.samples = [0.0; N];
        self.cursor = 0;
        self.sum_sq = 0.0;
    }
}

impl<const N: usize> Default for WindowBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
