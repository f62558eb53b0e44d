//! Audio channel (spec §3.2, §4.3): a PCM ring written by the producer and
//! drained by the consumer at real-time cadence. `enabled` is consumer-
//! owned; everything else at the header level is producer-owned.

pub mod header;
pub mod rate;

use std::path::PathBuf;

use header::{AudioHeader, AudioSettings};
use rate::RateClock;

use crate::ring::{self, SplitCopy};
use crate::system::{self, Mapping};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ring_frames must be a power of two, got {0}")]
    RingFramesNotPowerOfTwo(u32),
}

/// Builder-style configuration (spec §3.6), populated by the embedding
/// VMM's own config/CLI layer — this crate never parses argv/env itself.
#[derive(Debug, Clone)]
pub struct AudioChannelConfig {
    socket_path: Option<PathBuf>,
    ring_frames: u32,
}

impl Default for AudioChannelConfig {
    fn default() -> AudioChannelConfig {
        AudioChannelConfig {
            socket_path: None,
            ring_frames: 8192,
        }
    }
}

impl AudioChannelConfig {
    pub fn new() -> AudioChannelConfig {
        AudioChannelConfig::default()
    }

    pub fn with_socket_path(mut self, path: PathBuf) -> AudioChannelConfig {
        self.socket_path = Some(path);
        self
    }

    pub fn with_ring_frames(mut self, ring_frames: u32) -> Result<AudioChannelConfig, Error> {
        if !ring_frames.is_power_of_two() {
            return Err(Error::RingFramesNotPowerOfTwo(ring_frames));
        }
        self.ring_frames = ring_frames;
        Ok(self)
    }
}

struct Region {
    mapping: Mapping,
    settings: AudioSettings,
}

impl Region {
    fn header(&self) -> &AudioHeader {
        // SAFETY: the mapping is at least `AudioHeader::BYTE_SIZE` bytes
        // (enforced at allocation time) and was zero-initialized by the
        // kernel, a valid bit pattern for an all-atomic repr(C) struct.
        unsafe { &*(self.mapping.as_ptr() as *const AudioHeader) }
    }

    fn ring_bytes(&self) -> &[u8] {
        &self.mapping.as_slice()[AudioHeader::BYTE_SIZE..]
    }

    fn ring_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.mapping.as_mut_slice()[AudioHeader::BYTE_SIZE..]
    }
}

/// Producer-side audio channel.
pub struct AudioChannel {
    config: AudioChannelConfig,
    rendezvous: crate::rendezvous::Rendezvous,
    region: Option<Region>,
    rate: RateClock,
    /// Frame size the rate clock aligns its throttled byte counts to.
    /// Updated to the real value in `init_out`; the default here matches
    /// `RateClock::new`'s own default rate (48kHz stereo S16LE) so a
    /// pre-`init_out` `write` still returns frame-aligned zero.
    frame_bytes: usize,
}

impl AudioChannel {
    pub fn new(config: AudioChannelConfig) -> AudioChannel {
        let socket_path = config.socket_path.clone();
        AudioChannel {
            config,
            rendezvous: crate::rendezvous::Rendezvous::new(socket_path),
            region: None,
            rate: RateClock::new(48_000 * 4),
            frame_bytes: 4,
        }
    }

    /// Allocate the region and initialize the header (spec §4.3
    /// `init_out`). Idempotent: a second call with the channel already
    /// allocated is a no-op, matching "only allocates on first voice".
    pub fn init_out(&mut self, settings: AudioSettings) {
        if self.region.is_some() {
            return;
        }

        let frame_bytes = settings.frame_bytes();
        let ring_bytes = self.config.ring_frames as usize * frame_bytes;
        let size = AudioHeader::BYTE_SIZE + ring_bytes;

        let file = match system::create_sealed_memfd("juke-audio", size as u64) {
            Ok(file) => file,
            Err(e) => {
                error!("failed to allocate audio region: {}", e);
                return;
            }
        };

        let mapping = match Mapping::new(file) {
            Ok(mapping) => mapping,
            Err(e) => {
                error!("failed to map audio region: {}", e);
                return;
            }
        };

        let region = Region { mapping, settings };
        region.header().init(&settings, self.config.ring_frames);
        self.rate.set_rate((settings.sample_rate as usize * frame_bytes) as u32);
        self.rate.restart();
        self.frame_bytes = frame_bytes;
        self.region = Some(region);
        self.rendezvous.reset_fd_sent();
    }

    /// Opportunistically (re)connect and hand the region's fd to the
    /// consumer (spec §4.3 step 2, §4.4 `on_refresh` step 1). Exposed
    /// separately so the driver facade's per-tick `refresh` can retry this
    /// without needing a buffer to write.
    pub fn poll_rendezvous(&mut self) {
        self.rendezvous.connect();
        if let Some(region) = &self.region {
            if !self.rendezvous.fd_sent() {
                self.rendezvous.send_fd(region.mapping.raw_fd());
            }
        }
    }

    /// Write up to `len` bytes from `buffer` into the ring, returning the
    /// number of bytes actually accepted (spec §4.3 `write`).
    pub fn write(&mut self, buffer: &[u8], len: usize) -> usize {
        let len = len.min(buffer.len());

        self.poll_rendezvous();

        let region = match &mut self.region {
            Some(region) => region,
            None => return self.rate.throttle(len, self.frame_bytes),
        };

        if !region.header().enabled() {
            return self.rate.throttle(len, self.frame_bytes);
        }

        let frame_bytes = region.settings.frame_bytes();
        let ring_frames = region.header().ring_frames();
        let write_idx = region.header().write_idx();
        let read_idx = region.header().read_idx_acquire();

        let free_frames = ring::free_slots(write_idx, read_idx, ring_frames);
        let requested_frames = (len / frame_bytes) as u32;
        let frames_to_write = requested_frames.min(free_frames);

        if frames_to_write == 0 {
            return self.rate.throttle(len, frame_bytes);
        }

        let slot_bytes = frame_bytes;
        let start = ring::offset_bytes(write_idx, ring_frames, slot_bytes);
        let ring_bytes_total = ring_frames as usize * slot_bytes;
        let copy_len = frames_to_write as usize * slot_bytes;
        let plan = SplitCopy::plan(start, copy_len, ring_bytes_total);
        plan.copy_into(region.ring_bytes_mut(), &buffer[..copy_len]);

        region
            .header()
            .publish_write_idx(write_idx.wrapping_add(frames_to_write));

        frames_to_write as usize * frame_bytes
    }

    /// Producer-owned volume/mute (spec §4.3 `set_volume`).
    pub fn set_volume(&mut self, left: u8, right: u8, muted: bool) {
        if let Some(region) = &self.region {
            region.header().set_volume(left, right, muted);
        }
    }

    /// `enabled` is consumer-owned; the producer only restarts its local
    /// pacing clock here (spec §4.3 "Enable semantics").
    pub fn enable_out(&mut self, _enabled: bool) {
        self.rate.restart();
    }

    pub fn is_allocated(&self) -> bool {
        self.region.is_some()
    }

    #[cfg(test)]
    fn header_for_test(&self) -> &AudioHeader {
        self.region.as_ref().expect("region allocated").header()
    }

    #[cfg(test)]
    fn ring_bytes_for_test(&self) -> &[u8] {
        self.region.as_ref().expect("region allocated").ring_bytes()
    }
}
