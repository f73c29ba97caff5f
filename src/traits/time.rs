use std::cell::Cell;
use std::time::Instant;

/// Source of microsecond timestamps for [`SongClock`].
pub trait TimeProvider {
    /// Microseconds since an arbitrary, fixed epoch.
    fn now_us(&self) -> i64;
}

/// Wall-clock provider measuring from its own creation.
pub struct SystemTimeProvider {
    epoch: Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_us(&self) -> i64 {
        i64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(i64::MAX)
    }
}

/// Hand-driven provider for deterministic timing tests.
#[derive(Default)]
pub struct MockTimeProvider {
    now_us: Cell<i64>,
}

impl MockTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, us: i64) {
        self.now_us.set(us);
    }

    pub fn advance(&self, delta_us: i64) {
        self.now_us.set(self.now_us.get().saturating_add(delta_us));
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_us(&self) -> i64 {
        self.now_us.get()
    }
}

/// Song clock for real-time callers: elapsed milliseconds since `start`,
/// never negative and never decreasing. Feeds [`crate::game::Session::tick`].
pub struct SongClock<T: TimeProvider> {
    provider: T,
    start_us: Option<i64>,
    last_ms: i64,
}

impl<T: TimeProvider> SongClock<T> {
    pub fn new(provider: T) -> Self {
        Self {
            provider,
            start_us: None,
            last_ms: 0,
        }
    }

    /// Mark song start at the provider's current time.
    pub fn start(&mut self) {
        self.start_us = Some(self.provider.now_us());
        self.last_ms = 0;
    }

    pub fn is_started(&self) -> bool {
        self.start_us.is_some()
    }

    /// Elapsed song time in ms. Zero before `start`.
    pub fn song_time_ms(&mut self) -> i64 {
        let Some(start_us) = self.start_us else {
            return 0;
        };
        let elapsed_ms = self.provider.now_us().saturating_sub(start_us).max(0) / 1000;
        self.last_ms = self.last_ms.max(elapsed_ms);
        self.last_ms
    }

    pub fn provider(&self) -> &T {
        &self.provider
    }
}
