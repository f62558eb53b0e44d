//! Audio region header (spec §3.2): a fixed 64-byte struct followed by the
//! PCM ring. `write_idx` is producer-owned, `read_idx` consumer-owned;
//! `enabled` is consumer-owned, `muted`/`volume_*` producer-owned. All are
//! plain `u32` width so a consumer process can read them without knowing
//! about Rust atomics, but the producer side always touches them through
//! `std::sync::atomic` to get well-defined cross-process ordering (spec §5).

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

pub const MAGIC: u32 = 0x4455_414A; // "JAUD"
pub const VERSION: u32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    S16LE,
    F32LE,
}

impl SampleFormat {
    pub fn sample_bytes(self) -> usize {
        match self {
            SampleFormat::S16LE => 2,
            SampleFormat::F32LE => 4,
        }
    }

    fn wire_code(self) -> u32 {
        match self {
            SampleFormat::S16LE => 1,
            SampleFormat::F32LE => 2,
        }
    }

    fn from_wire_code(code: u32) -> Option<SampleFormat> {
        match code {
            1 => Some(SampleFormat::S16LE),
            2 => Some(SampleFormat::F32LE),
            _ => None,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SampleFormat::S16LE => write!(f, "Signed 16 bit Little Endian"),
            SampleFormat::F32LE => write!(f, "32 bit Float Little Endian"),
        }
    }
}

/// Settings supplied to `AudioChannel::init_out`.
#[derive(Copy, Clone, Debug)]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub channels: u32,
    pub format: SampleFormat,
}

impl AudioSettings {
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.format.sample_bytes()
    }
}

/// 64-byte region header, `#[repr(C)]` so its layout matches the consumer's
/// expectation byte-for-byte.
#[repr(C)]
pub struct AudioHeader {
    magic: AtomicU32,
    version: AtomicU32,
    sample_rate: AtomicU32,
    channels: AtomicU32,
    format: AtomicU32,
    ring_frames: AtomicU32,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    enabled: AtomicU32,
    muted: AtomicU32,
    volume_left: AtomicU32,
    volume_right: AtomicU32,
    _padding: [u32; 4],
}

impl AudioHeader {
    pub const BYTE_SIZE: usize = std::mem::size_of::<AudioHeader>();

    /// Initialize every field for a freshly allocated region (spec §4.3
    /// `init_out`): `enabled=0`, `muted=0`, full volume, indices at zero.
    pub fn init(&self, settings: &AudioSettings, ring_frames: u32) {
        self.magic.store(MAGIC, Ordering::Relaxed);
        self.version.store(VERSION, Ordering::Relaxed);
        self.sample_rate.store(settings.sample_rate, Ordering::Relaxed);
        self.channels.store(settings.channels, Ordering::Relaxed);
        self.format.store(settings.format.wire_code(), Ordering::Relaxed);
        self.write_idx.store(0, Ordering::Relaxed);
        self.read_idx.store(0, Ordering::Relaxed);
        self.enabled.store(0, Ordering::Relaxed);
        self.muted.store(0, Ordering::Relaxed);
        self.volume_left.store(255, Ordering::Relaxed);
        self.volume_right.store(255, Ordering::Relaxed);
        // Everything above is plain-ordered; the region isn't handed to the
        // consumer (send_fd) until after init() returns, and the fd-send
        // syscall itself is the cross-process fence, so no release store is
        // required here. ring_frames is written last only by convention.
        self.ring_frames.store(ring_frames, Ordering::Relaxed);
    }

    pub fn ring_frames(&self) -> u32 {
        self.ring_frames.load(Ordering::Relaxed)
    }

    pub fn sample_format(&self) -> Option<SampleFormat> {
        SampleFormat::from_wire_code(self.format.load(Ordering::Relaxed))
    }

    pub fn channels(&self) -> u32 {
        self.channels.load(Ordering::Relaxed)
    }

    /// Consumer-owned: producer only ever reads this, with acquire ordering
    /// (spec §4.3 step 3).
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire) != 0
    }

    pub fn write_idx(&self) -> u32 {
        self.write_idx.load(Ordering::Relaxed)
    }

    pub fn read_idx_acquire(&self) -> u32 {
        self.read_idx.load(Ordering::Acquire)
    }

    pub fn publish_write_idx(&self, idx: u32) {
        self.write_idx.store(idx, Ordering::Release);
    }

    /// Simulates the consumer flipping `enabled`; the producer itself never
    /// calls this. Exists so producer-side tests can exercise the enabled
    /// path without a second process.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled as u32, Ordering::Release);
    }

    /// Producer-owned volume/mute trio (spec §4.3 `set_volume`). All three
    /// fields are release-stored: the consumer may read any one of them
    /// independently, so none can ride along on another's fence.
    pub fn set_volume(&self, left: u8, right: u8, muted: bool) {
        self.volume_left.store(left as u32, Ordering::Release);
        self.volume_right.store(right as u32, Ordering::Release);
        self.muted.store(muted as u32, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_header() -> Box<AudioHeader> {
        unsafe {
            let layout = std::alloc::Layout::new::<AudioHeader>();
            let ptr = std::alloc::alloc_zeroed(layout) as *mut AudioHeader;
            Box::from_raw(ptr)
        }
    }

    #[test]
    fn header_is_exactly_64_bytes() {
        assert_eq!(AudioHeader::BYTE_SIZE, 64);
    }

    #[test]
    fn init_sets_disabled_full_volume_zeroed_indices() {
        let header = new_header();
        let settings = AudioSettings {
            sample_rate: 48_000,
            channels: 2,
            format: SampleFormat::S16LE,
        };
        header.init(&settings, 8192);

        assert!(!header.enabled());
        assert_eq!(header.write_idx(), 0);
        assert_eq!(header.read_idx_acquire(), 0);
        assert_eq!(header.ring_frames(), 8192);
        assert_eq!(header.sample_format(), Some(SampleFormat::S16LE));
    }

    #[test]
    fn set_volume_is_readable_back() {
        let header = new_header();
        header.set_volume(128, 64, true);
        assert_eq!(header.volume_left.load(Ordering::Relaxed), 128);
        assert_eq!(header.volume_right.load(Ordering::Relaxed), 64);
        assert_eq!(header.muted.load(Ordering::Relaxed), 1);
    }
}
