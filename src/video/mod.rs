//! Framebuffer channel (spec §3.1, §4.4): a single contiguous region holding
//! the header, the hardware cursor pixel slab, the reverse-direction input
//! ring, and the pixel buffer itself.

pub mod cursor;
pub mod header;

use std::path::PathBuf;

use cursor::{CursorShape, CursorSource, SLAB_BYTES};
use header::{FbHeader, Surface, CURSOR_BYTES};

use crate::input::{InputRing, InputSink};
use crate::system::{self, Mapping};

/// Builder-style configuration (spec §3.6).
#[derive(Debug, Clone, Default)]
pub struct FbChannelConfig {
    socket_path: Option<PathBuf>,
}

impl FbChannelConfig {
    pub fn new() -> FbChannelConfig {
        FbChannelConfig::default()
    }

    pub fn with_socket_path(mut self, path: PathBuf) -> FbChannelConfig {
        self.socket_path = Some(path);
        self
    }
}

const INPUT_RING_OFFSET: usize = FbHeader::BYTE_SIZE + CURSOR_BYTES;

fn region_size(stride: u32, height: u32) -> usize {
    INPUT_RING_OFFSET + InputRing::BYTE_SIZE + stride as usize * height as usize
}

struct Region {
    mapping: Mapping,
}

impl Region {
    fn header(&self) -> &FbHeader {
        // SAFETY: the mapping is always at least FbHeader::BYTE_SIZE bytes
        // (region_size's first term), zero-initialized by the kernel.
        unsafe { &*(self.mapping.as_ptr() as *const FbHeader) }
    }

    fn cursor_slab_mut(&mut self) -> &mut [u8] {
        &mut self.mapping.as_mut_slice()[FbHeader::BYTE_SIZE..FbHeader::BYTE_SIZE + CURSOR_BYTES]
    }

    fn input_ring(&self) -> &InputRing {
        // SAFETY: the mapping reserves InputRing::BYTE_SIZE bytes at
        // INPUT_RING_OFFSET (region_size's second term); zero-initialized
        // atomics and a zeroed event array are a valid InputRing.
        unsafe { &*(self.mapping.as_ptr().add(INPUT_RING_OFFSET) as *const InputRing) }
    }

    fn pixel_buffer_mut(&mut self) -> &mut [u8] {
        let offset = INPUT_RING_OFFSET + InputRing::BYTE_SIZE;
        &mut self.mapping.as_mut_slice()[offset..]
    }
}

/// The VMM's graphics update pipeline (spec §4.4 `on_refresh` step 3, §4.7):
/// out of scope for this crate, represented as a callback seam that is
/// expected to call back into [`FbChannel::on_gfx_update`] for dirty
/// regions it discovers.
pub trait GfxSource {
    fn update(&mut self, channel: &mut FbChannel);
}

/// Producer-side framebuffer + cursor + input channel.
pub struct FbChannel {
    config: FbChannelConfig,
    rendezvous: crate::rendezvous::Rendezvous,
    region: Option<Region>,
}

impl FbChannel {
    pub fn new(config: FbChannelConfig) -> FbChannel {
        let socket_path = config.socket_path.clone();
        FbChannel {
            config,
            rendezvous: crate::rendezvous::Rendezvous::new(socket_path),
            region: None,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.region.is_some()
    }

    /// Geometry/format change (spec §4.4 `on_gfx_switch`). `pixels` is the
    /// full current surface contents at `surface.stride * surface.height`
    /// bytes, copied in its entirety into the fresh region.
    pub fn on_gfx_switch(&mut self, surface: Surface, pixels: &[u8]) {
        let needed = region_size(surface.stride, surface.height);
        let current_size = self.region.as_ref().map(|r| r.mapping.len());
        let must_reallocate = match current_size {
            Some(size) => needed > size,
            None => true,
        };

        if must_reallocate {
            let file = match system::create_sealed_memfd("juke-fb", needed as u64) {
                Ok(file) => file,
                Err(e) => {
                    error!("failed to allocate framebuffer region: {}", e);
                    return;
                }
            };
            let mapping = match Mapping::new(file) {
                Ok(mapping) => mapping,
                Err(e) => {
                    error!("failed to map framebuffer region: {}", e);
                    return;
                }
            };
            self.region = Some(Region { mapping });
            self.rendezvous.reset_fd_sent();
        }

        let region = self.region.as_mut().expect("region allocated above");
        region.header().init(&surface);
        region.input_ring().reset();

        let row_bytes = surface.stride as usize * surface.height as usize;
        region.pixel_buffer_mut()[..row_bytes].copy_from_slice(&pixels[..row_bytes]);

        self.rendezvous.connect();
        if !self.rendezvous.fd_sent() {
            self.rendezvous.send_fd(region.mapping.raw_fd());
        }
    }

    /// Dirty-region update (spec §4.4 `on_gfx_update`). Copies the entire
    /// row stride for each row in `[y, y+h)`, not just the dirty column
    /// span, then publishes the dirty rect and bumps `frame_counter`.
    pub fn on_gfx_update(&mut self, x: u32, y: u32, w: u32, h: u32, pixels: &[u8]) {
        let region = match &mut self.region {
            Some(region) => region,
            None => return,
        };
        let stride = region.header().stride() as usize;

        if h > 0 {
            let start = y as usize * stride;
            let len = h as usize * stride;
            region.pixel_buffer_mut()[start..start + len].copy_from_slice(&pixels[start..start + len]);
        }

        region.header().publish_dirty_rect(x, y, w, h);
    }

    /// Cursor shape change (spec §4.4 `on_cursor_define`). Reads the
    /// authoritative cursor from `source`, not from any caller-supplied
    /// data — `on_cursor_define` only signals that a query is due.
    pub fn on_cursor_define(&mut self, source: &dyn CursorSource) {
        let region = match &mut self.region {
            Some(region) => region,
            None => return,
        };

        match source.current_cursor() {
            Some(shape) => {
                let mut slab = [0u8; SLAB_BYTES];
                cursor::copy_into_slab(&mut slab, &shape);
                region.cursor_slab_mut().copy_from_slice(&slab);
                region
                    .header()
                    .publish_cursor_shape(shape.width, shape.height, shape.hot_x, shape.hot_y);
            }
            None => {
                // No cursor: zero dimensions and still bump the version so
                // the consumer notices the hide (spec §4.4, §8 scenario 6).
                region.header().publish_cursor_shape(0, 0, 0, 0);
            }
        }
    }

    /// Cursor position/visibility (spec §4.4 `on_mouse_set`).
    pub fn on_mouse_set(&mut self, x: i32, y: i32, visible: bool) {
        if let Some(region) = &self.region {
            region.header().set_cursor_position(x, y, visible);
        }
    }

    /// Per-tick entry point (spec §4.4 `on_refresh`): retry rendezvous,
    /// drain the input ring, then hand control to the graphics pipeline so
    /// it can call back into `on_gfx_update`.
    pub fn on_refresh(&mut self, sink: &mut dyn InputSink, gfx: &mut dyn GfxSource) {
        self.rendezvous.connect();
        if let Some(region) = &self.region {
            if !self.rendezvous.fd_sent() {
                self.rendezvous.send_fd(region.mapping.raw_fd());
            }
        }

        if let Some(region) = &self.region {
            let width = region.header().width();
            let height = region.header().height();
            region.input_ring().drain(width, height, sink);
        }

        gfx.update(self);
    }

    #[cfg(test)]
    fn header_for_test(&self) -> &FbHeader {
        self.region.as_ref().expect("region allocated").header()
    }

    #[cfg(test)]
    fn region_len_for_test(&self) -> usize {
        self.region.as_ref().expect("region allocated").mapping.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(width: u32, height: u32, stride: u32) -> Surface {
        Surface {
            width,
            height,
            stride,
            format: 1,
        }
    }

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

    struct NoCursor;
    impl CursorSource for NoCursor {
        fn current_cursor(&self) -> Option<CursorShape> {
            None
        }
    }

    #[test]
    fn gfx_switch_allocates_region_sized_exactly() {
        let mut channel = FbChannel::new(FbChannelConfig::new());
        let surf = surface(800, 600, 3200);
        let pixels = vec![0u8; 3200 * 600];
        channel.on_gfx_switch(surf, &pixels);

        assert!(channel.is_allocated());
        assert_eq!(channel.header_for_test().frame_counter(), 0);
        assert_eq!(
            channel.region_len_for_test(),
            FbHeader::BYTE_SIZE + CURSOR_BYTES + InputRing::BYTE_SIZE + 3200 * 600
        );
    }

    #[test]
    fn resize_to_larger_surface_reallocates_and_resets_frame_counter() {
        let mut channel = FbChannel::new(FbChannelConfig::new());
        channel.on_gfx_switch(surface(800, 600, 3200), &vec![0u8; 3200 * 600]);
        channel.on_gfx_update(0, 0, 800, 600, &vec![0u8; 3200 * 600]);
        assert_eq!(channel.header_for_test().frame_counter(), 1);

        channel.on_gfx_switch(surface(1024, 768, 4096), &vec![0xABu8; 4096 * 768]);
        assert_eq!(channel.header_for_test().frame_counter(), 0);
        assert_eq!(channel.header_for_test().width(), 1024);
    }

    #[test]
    fn gfx_update_with_zero_height_is_a_no_op_copy_but_still_bumps_counter() {
        let mut channel = FbChannel::new(FbChannelConfig::new());
        channel.on_gfx_switch(surface(800, 600, 3200), &vec![0u8; 3200 * 600]);
        channel.on_gfx_update(0, 0, 0, 0, &[]);
        assert_eq!(channel.header_for_test().frame_counter(), 1);
    }

    #[test]
    fn cursor_hide_zeroes_dimensions_and_bumps_version() {
        let mut channel = FbChannel::new(FbChannelConfig::new());
        channel.on_gfx_switch(surface(800, 600, 3200), &vec![0u8; 3200 * 600]);
        channel.on_cursor_define(&NoCursor);
        assert_eq!(channel.header_for_test().cursor_width(), 0);
        assert_eq!(channel.header_for_test().cursor_version(), 1);
    }

    #[test]
    fn on_refresh_invokes_the_gfx_source_callback() {
        let mut channel = FbChannel::new(FbChannelConfig::new());
        channel.on_gfx_switch(surface(64, 64, 256), &vec![0u8; 256 * 64]);
        let mut sink = NullSink;
        let mut gfx = NullGfxSource;
        channel.on_refresh(&mut sink, &mut gfx);
    }
}
