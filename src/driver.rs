//! Driver facade (spec §4.7): ties the framebuffer and audio channels
//! together behind a single per-tick entry point for the embedding VMM.

use crate::audio::header::AudioSettings;
use crate::audio::{AudioChannel, AudioChannelConfig};
use crate::input::InputSink;
use crate::refresh::{RefreshDriver, RefreshProbe};
use crate::video::cursor::CursorSource;
use crate::video::header::Surface;
use crate::video::{FbChannel, FbChannelConfig, GfxSource};

use std::time::Duration;

pub struct JukeDriver {
    fb: FbChannel,
    audio: AudioChannel,
    refresh: RefreshDriver,
}

impl JukeDriver {
    pub fn new(
        fb_config: FbChannelConfig,
        audio_config: AudioChannelConfig,
        probe: &dyn RefreshProbe,
    ) -> JukeDriver {
        JukeDriver {
            fb: FbChannel::new(fb_config),
            audio: AudioChannel::new(audio_config),
            refresh: RefreshDriver::new(probe),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh.interval()
    }

    pub fn on_gfx_switch(&mut self, surface: Surface, pixels: &[u8]) {
        self.fb.on_gfx_switch(surface, pixels);
    }

    pub fn on_gfx_update(&mut self, x: u32, y: u32, w: u32, h: u32, pixels: &[u8]) {
        self.fb.on_gfx_update(x, y, w, h, pixels);
    }

    pub fn on_cursor_define(&mut self, source: &dyn CursorSource) {
        self.fb.on_cursor_define(source);
    }

    pub fn on_mouse_set(&mut self, x: i32, y: i32, visible: bool) {
        self.fb.on_mouse_set(x, y, visible);
    }

    pub fn audio_write(&mut self, buffer: &[u8], len: usize) -> usize {
        self.audio.write(buffer, len)
    }

    pub fn audio_init_out(&mut self, settings: AudioSettings) {
        self.audio.init_out(settings);
    }

    pub fn audio_set_volume(&mut self, left: u8, right: u8, muted: bool) {
        self.audio.set_volume(left, right, muted);
    }

    pub fn audio_enable_out(&mut self, enabled: bool) {
        self.audio.enable_out(enabled);
    }

    /// The single per-tick entry point the embedding VMM's timer calls at
    /// `refresh_interval()` cadence: retry rendezvous for both channels,
    /// drain input, then hand control to the graphics pipeline.
    pub fn refresh(&mut self, sink: &mut dyn InputSink, gfx: &mut dyn GfxSource) {
        self.audio.poll_rendezvous();
        self.fb.on_refresh(sink, gfx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::header::SampleFormat;
    use crate::refresh::NoRefreshProbe;

    struct NullGfxSource;
    impl GfxSource for NullGfxSource {
        fn update(&mut self, _channel: &mut FbChannel) {}
    }

    struct NullSink;
    impl InputSink for NullSink {
        fn mouse_rel(&mut self, _dx: i32, _dy: i32) {}
        fn mouse_abs(&mut self, _x: i32, _y: i32, _w: u32, _h: u32) {}
        fn mouse_button(&mut self, _button: u8, _pressed: bool) {}
        fn key(&mut self, _scancode: i32, _pressed: bool) {}
        fn sync(&mut self) {}
    }

    #[test]
    fn driver_falls_back_to_eight_millisecond_interval_with_no_probe() {
        let driver = JukeDriver::new(
            FbChannelConfig::new(),
            AudioChannelConfig::new(),
            &NoRefreshProbe,
        );
        assert_eq!(driver.refresh_interval(), Duration::from_millis(8));
    }

    #[test]
    fn refresh_drives_both_channels_without_panicking_before_any_allocation() {
        let mut driver = JukeDriver::new(
            FbChannelConfig::new(),
            AudioChannelConfig::new(),
            &NoRefreshProbe,
        );
        let mut sink = NullSink;
        let mut gfx = NullGfxSource;
        driver.refresh(&mut sink, &mut gfx);
    }

    #[test]
    fn audio_write_before_init_out_is_silently_rate_throttled() {
        let mut driver = JukeDriver::new(
            FbChannelConfig::new(),
            AudioChannelConfig::new(),
            &NoRefreshProbe,
        );
        assert_eq!(driver.audio_write(&[0u8; 64], 64), 0);

        driver.audio_init_out(AudioSettings {
            sample_rate: 48_000,
            channels: 2,
            format: SampleFormat::S16LE,
        });
        assert_eq!(driver.audio_write(&[0u8; 64], 64), 0);
    }
}
