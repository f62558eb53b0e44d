//! Wall-clock pull-clock for pacing the audio front-end when there is
//! nowhere to put samples (no region yet, consumer disabled, or ring full).
//!
//! Grounded on the teacher's `NullShmStream`, which paces a silent audio
//! stream by comparing elapsed wall time against `buffer_size`/`frame_rate`
//! rather than by consuming real buffer contents, and on the original
//! `audio_rate_get_bytes` pull-clock it mirrors.

use std::time::Instant;

pub struct RateClock {
    bytes_per_sec: f64,
    start: Instant,
    consumed: u64,
}

impl RateClock {
    pub fn new(bytes_per_sec: u32) -> RateClock {
        RateClock {
            bytes_per_sec: bytes_per_sec as f64,
            start: Instant::now(),
            consumed: 0,
        }
    }

    pub fn set_rate(&mut self, bytes_per_sec: u32) {
        self.bytes_per_sec = bytes_per_sec as f64;
    }

    /// Reset the clock to "caught up", discarding any owed backlog. Called
    /// when the channel transitions into a state where real consumption
    /// resumes (spec §4.3 "`enable_out(true)` only restarts the local
    /// rate-control clock").
    pub fn restart(&mut self) {
        self.start = Instant::now();
        self.consumed = 0;
    }

    /// Pretend to consume up to `len` bytes at the configured rate, without
    /// touching any ring. Returns how many of those bytes the wall clock
    /// has "caught up" to since the clock started or was last restarted,
    /// rounded down to a whole number of `frame_bytes`-sized frames — spec
    /// §8 requires every returned byte count to be frame-aligned, mirroring
    /// the original's `audio_rate_get_bytes`, which rounds the same way
    /// (`bytes -= bytes % info->bytes_per_frame`).
    pub fn throttle(&mut self, len: usize, frame_bytes: usize) -> usize {
        let elapsed = self.start.elapsed().as_secs_f64();
        let owed_total = (elapsed * self.bytes_per_sec) as u64;
        let available = owed_total.saturating_sub(self.consumed);
        let accepted = (available as usize).min(len);
        let aligned = accepted - accepted % frame_bytes;
        self.consumed += aligned as u64;
        aligned
    }
}
