use embassy_time::{Duration, Instant};

use super::SwitchState;

/// Contact-bounce filter over a whole switch bank.
///
/// A raw reading becomes the published state once it has been held unchanged
/// for at least the debounce window. Flicker shorter than the window never
/// reaches the published state.
#[derive(Debug, Clone)]
pub struct Debouncer<const N: usize> {
    window: Duration,
    published: SwitchState<N>,
    last_raw: SwitchState<N>,
    last_change: Instant,
}

impl<const N: usize> Debouncer<N> {
    /// Seeds the published state from the first raw read, so no default
    /// state is ever reported before the inputs are known.
    pub fn new(initial: SwitchState<N>, window: Duration, now: Instant) -> Self {
        Self {
            window,
            published: initial,
            last_raw: initial,
            last_change: now,
        }
    }

    pub fn update(&mut self, raw: SwitchState<N>, now: Instant) -> SwitchState<N> {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change = now;
        }

        if now.saturating_duration_since(self.last_change) >= self.window {
            self.published = raw;
        }

        self.published
    }

    pub fn state(&self) -> SwitchState<N> {
        self.published
    }
}
