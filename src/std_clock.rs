//! [`Clock`] for hosted targets, backed by the operating system's monotonic clock.

use fugit::MicrosDurationU32;

use crate::transport::{Clock, Instant};

/// Measures time from when it was created. Waits by sleeping the current thread.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    epoch: std::time::Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

impl Clock for StdClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.epoch.elapsed().as_micros() as u64)
    }

    fn delay(&mut self, duration: MicrosDurationU32) {
        std::thread::sleep(std::time::Duration::from_micros(u64::from(duration.ticks())));
    }
}
