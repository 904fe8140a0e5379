/// The sensor timestamp is a microsecond counter that wraps at 24 bits.
const TIMESTAMP_WRAP: i64 = 1 << 24;

/// Expected spacing between consecutive sub-frames, in seconds. Used when a
/// sample has no predecessor to difference against.
pub const DEFAULT_SAMPLE_INTERVAL: f64 = 500e-6;

/// Reconstructs monotonic elapsed time from the wrapping hardware counter.
///
/// Owned by the read loop and threaded through every reconciliation; each
/// packet yields two chained deltas (sub-frame 1 against the previous
/// packet's sub-frame 2, then sub-frame 2 against sub-frame 1).
#[derive(Debug, Default)]
pub struct SampleClock {
    prev: Option<u32>,
}

impl SampleClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed seconds between the previous timestamp and `raw`.
    ///
    /// A raw value numerically below its predecessor means the counter
    /// wrapped; the result is never negative. The first call after
    /// construction or `reset` returns [`DEFAULT_SAMPLE_INTERVAL`].
    pub fn delta_seconds(&mut self, raw: u32) -> f64 {
        let dt = match self.prev {
            None => DEFAULT_SAMPLE_INTERVAL,
            Some(prev) => {
                let mut ticks = i64::from(raw) - i64::from(prev);
                if ticks < 0 {
                    ticks += TIMESTAMP_WRAP;
                }
                ticks as f64 / 1e6
            }
        };
        self.prev = Some(raw);
        dt
    }

    /// Forget the previous timestamp, returning to the no-predecessor state.
    pub fn reset(&mut self) {
        self.prev = None;
    }
}
