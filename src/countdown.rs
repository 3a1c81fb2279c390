//! Countdown for timed mode: polled from the event loop, ticks roughly once
//! a second, subtracts real elapsed time so slow frames don't stretch the
//! clock.

use std::time::{Duration, Instant};

const TICK_DELAY: Duration = Duration::from_millis(1000);

pub struct Countdown {
    remaining_ms: u64,
    playing: bool,
    last_tick: Instant,
    next_tick_due: Instant,
    /// Set while temporarily paused by the Extra power-up.
    resume_at: Option<Instant>,
}

impl Countdown {
    pub fn new(length_ms: u64, now: Instant) -> Self {
        Self {
            remaining_ms: length_ms,
            playing: false,
            last_tick: now,
            next_tick_due: now,
            resume_at: None,
        }
    }

    /// Start or resume the countdown.
    pub fn play(&mut self, now: Instant) {
        if !self.playing && self.remaining_ms > 0 {
            self.playing = true;
            self.last_tick = now;
            self.next_tick_due = now;
            self.resume_at = None;
        }
    }

    /// Pause until `play` is called again.
    pub fn pause(&mut self) {
        self.playing = false;
        self.resume_at = None;
    }

    /// Pause for a fixed duration, then resume automatically.
    pub fn pause_for(&mut self, duration: Duration, now: Instant) {
        if self.playing {
            self.playing = false;
            self.resume_at = Some(now + duration);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advance the countdown. Returns `Some(remaining_ms)` when a tick
    /// fired; the clock stops by itself on reaching zero.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        if let Some(at) = self.resume_at {
            if now >= at {
                self.resume_at = None;
                self.playing = true;
                self.last_tick = now;
                self.next_tick_due = now;
            }
        }
        if !self.playing || now < self.next_tick_due {
            return None;
        }

        let elapsed = now.duration_since(self.last_tick).as_millis() as u64;
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
        self.last_tick = now;
        self.next_tick_due = now + TICK_DELAY;
        if self.remaining_ms == 0 {
            self.playing = false;
        }
        Some(self.remaining_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_subtract_elapsed_time() {
        let t0 = Instant::now();
        let mut c = Countdown::new(5000, t0);
        c.play(t0);
        // Immediate poll fires the first tick with zero elapsed.
        assert_eq!(c.poll(t0), Some(5000));
        assert_eq!(c.poll(t0 + Duration::from_millis(500)), None);
        assert_eq!(c.poll(t0 + Duration::from_millis(1200)), Some(3800));
    }

    #[test]
    fn stops_at_zero() {
        let t0 = Instant::now();
        let mut c = Countdown::new(1500, t0);
        c.play(t0);
        c.poll(t0);
        assert_eq!(c.poll(t0 + Duration::from_secs(2)), Some(0));
        assert!(!c.is_playing());
        assert_eq!(c.poll(t0 + Duration::from_secs(4)), None);
    }

    #[test]
    fn pause_for_resumes_after_deadline() {
        let t0 = Instant::now();
        let mut c = Countdown::new(30_000, t0);
        c.play(t0);
        c.poll(t0);
        c.pause_for(Duration::from_secs(10), t0);
        assert!(!c.is_playing());
        // Nothing elapses while paused.
        assert_eq!(c.poll(t0 + Duration::from_secs(5)), None);
        // Past the deadline the clock restarts from the resume instant.
        assert_eq!(c.poll(t0 + Duration::from_secs(11)), Some(30_000));
        assert!(c.is_playing());
        assert_eq!(c.poll(t0 + Duration::from_secs(12)), Some(29_000));
    }

    #[test]
    fn plain_pause_needs_explicit_play() {
        let t0 = Instant::now();
        let mut c = Countdown::new(10_000, t0);
        c.play(t0);
        c.poll(t0);
        c.pause();
        assert_eq!(c.poll(t0 + Duration::from_secs(3)), None);
        c.play(t0 + Duration::from_secs(3));
        assert_eq!(c.poll(t0 + Duration::from_secs(3)), Some(10_000));
    }
}
