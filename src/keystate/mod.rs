//! Debounces raw key press/release signals into `KeyDown` / `KeyPressed`
//! (with auto-repeat) / `KeyUp`, matching `ysw_keystate.c`: a `KeyPressed`
//! fires every time the press persists past `100ms * (repeat_count + 1)`,
//! and releasing a key that never auto-repeated synthesizes one `KeyPressed`
//! first, so every logical tap produces exactly one press event.

use std::time::Duration;

use crate::bus::{Bus, Event, Origin};

const REPEAT_INTERVAL_MS: u32 = 100;

#[derive(Debug, Clone, Copy, Default)]
struct KeyState {
    down_time_ms: u32,
    repeat_count: u32,
}

impl KeyState {
    fn is_down(&self) -> bool {
        self.down_time_ms != 0
    }
}

/// A monotonic millisecond clock, injected so tests can control time without
/// sleeping. Production code uses [`MonotonicClock`].
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Wall-clock implementation backed by `std::time::Instant`.
pub struct MonotonicClock {
    origin: std::time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }
}

/// Fixed-size table indexed by scan code, tracking debounce state.
pub struct KeyStateTracker<C: Clock = MonotonicClock> {
    state: Vec<KeyState>,
    clock: C,
}

impl KeyStateTracker<MonotonicClock> {
    pub fn new(scan_code_count: usize) -> Self {
        Self::with_clock(scan_code_count, MonotonicClock::new())
    }
}

impl<C: Clock> KeyStateTracker<C> {
    pub fn with_clock(scan_code_count: usize, clock: C) -> Self {
        Self {
            state: vec![KeyState::default(); scan_code_count],
            clock,
        }
    }

    /// Raw key-press signal. Publishes `KeyDown` on the first press of a
    /// key, or `KeyPressed` once the hold time crosses the next repeat
    /// threshold.
    pub fn press(&mut self, bus: &Bus, scan_code: u8) {
        let Some(state) = self.state.get_mut(scan_code as usize) else {
            return;
        };
        let now = self.clock.now_ms();
        if !state.is_down() {
            state.repeat_count = 0;
            state.down_time_ms = now.max(1);
            bus.publish(
                Origin::Keyboard,
                Event::KeyDown {
                    scan_code,
                    down_time_ms: state.down_time_ms,
                },
            );
        } else if state.down_time_ms + (state.repeat_count + 1) * REPEAT_INTERVAL_MS < now {
            state.repeat_count += 1;
            bus.publish(
                Origin::Keyboard,
                Event::KeyPressed {
                    scan_code,
                    down_time_ms: state.down_time_ms,
                    duration_ms: now - state.down_time_ms,
                    repeat_count: state.repeat_count,
                },
            );
        }
    }

    /// Raw key-release signal. Publishes a synthetic `KeyPressed` first if
    /// the key never auto-repeated, then always publishes `KeyUp`.
    pub fn release(&mut self, bus: &Bus, scan_code: u8) {
        let Some(state) = self.state.get_mut(scan_code as usize) else {
            return;
        };
        if !state.is_down() {
            return;
        }
        let now = self.clock.now_ms();
        let duration_ms = now - state.down_time_ms;

        if state.repeat_count == 0 {
            bus.publish(
                Origin::Keyboard,
                Event::KeyPressed {
                    scan_code,
                    down_time_ms: state.down_time_ms,
                    duration_ms,
                    repeat_count: 0,
                },
            );
        }
        bus.publish(
            Origin::Keyboard,
            Event::KeyUp {
                scan_code,
                down_time_ms: state.down_time_ms,
                duration_ms,
                repeat_count: state.repeat_count,
            },
        );
        state.down_time_ms = 0;
        state.repeat_count = 0;
    }

    /// Time remaining until the next `KeyPressed` would fire for a held key,
    /// for a caller that wants to schedule its own wake-up (e.g. a task
    /// harness worker polling this tracker).
    pub fn next_repeat_in(&self, scan_code: u8) -> Option<Duration> {
        let state = self.state.get(scan_code as usize)?;
        if !state.is_down() {
            return None;
        }
        let now = self.clock.now_ms();
        let next_threshold = state.down_time_ms + (state.repeat_count + 1) * REPEAT_INTERVAL_MS;
        Some(Duration::from_millis(next_threshold.saturating_sub(now) as u64))
    }
}
