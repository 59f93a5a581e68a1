/// Time source for the engines. Used for break/mab timing, frame pacing and link supervision.
pub trait DmxTimer {
    /// Monotonic time in microseconds. The origin is arbitrary.
    fn now_micros(&self) -> u64;

    /// Block for at least the given amount of microseconds.
    fn delay_micros(&mut self, micros: u32);

    /// Microseconds that passed since `timestamp`.
    fn micros_since(&self, timestamp: u64) -> u64 {
        self.now_micros().saturating_sub(timestamp)
    }
}

/// [DmxTimer] backed by [std::time::Instant] and [std::thread::sleep].
///
/// <div class="warning">Sleeping for a handful of microseconds is at the mercy of the os
/// scheduler. The delays will never be shorter than requested, but they may be a lot longer.</div>
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
#[derive(Debug, Clone, Copy)]
pub struct StdTimer {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTimer {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl DmxTimer for StdTimer {
    fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn delay_micros(&mut self, micros: u32) {
        std::thread::sleep(std::time::Duration::from_micros(micros as u64));
    }
}
