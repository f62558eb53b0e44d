//! Framebuffer region header (spec §3.1): geometry, frame counter, dirty
//! rect, and cursor metadata, followed in the region by the cursor pixel
//! slab, the input ring, and the pixel buffer itself.

use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering};

pub const MAGIC: u32 = 0x454B_554A; // "JUKE"
pub const VERSION: u32 = 3;

pub const CURSOR_SIZE: u32 = 64;
pub const CURSOR_BYTES: usize = (CURSOR_SIZE * CURSOR_SIZE * 4) as usize;

/// Framebuffer geometry as reported by the guest's display surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: u32,
}

#[repr(C)]
pub struct FbHeader {
    magic: AtomicU32,
    version: AtomicU32,
    width: AtomicU32,
    height: AtomicU32,
    stride: AtomicU32,
    format: AtomicU32,
    frame_counter: AtomicU64,
    dirty_x: AtomicU32,
    dirty_y: AtomicU32,
    dirty_w: AtomicU32,
    dirty_h: AtomicU32,
    cursor_version: AtomicU32,
    cursor_x: AtomicI32,
    cursor_y: AtomicI32,
    cursor_visible: AtomicU32,
    cursor_width: AtomicU32,
    cursor_height: AtomicU32,
    cursor_hot_x: AtomicI32,
    cursor_hot_y: AtomicI32,
}

impl FbHeader {
    pub const BYTE_SIZE: usize = std::mem::size_of::<FbHeader>();

    /// Reinitialize for a freshly (re)allocated region (spec §4.4
    /// `on_gfx_switch`): geometry, `frame_counter = 0`, dirty rect spanning
    /// the whole surface, cursor zeroed.
    pub fn init(&self, surface: &Surface) {
        self.magic.store(MAGIC, Ordering::Relaxed);
        self.version.store(VERSION, Ordering::Relaxed);
        self.width.store(surface.width, Ordering::Relaxed);
        self.height.store(surface.height, Ordering::Relaxed);
        self.stride.store(surface.stride, Ordering::Relaxed);
        self.format.store(surface.format, Ordering::Relaxed);
        self.dirty_x.store(0, Ordering::Relaxed);
        self.dirty_y.store(0, Ordering::Relaxed);
        self.dirty_w.store(surface.width, Ordering::Relaxed);
        self.dirty_h.store(surface.height, Ordering::Relaxed);
        self.cursor_version.store(0, Ordering::Relaxed);
        self.cursor_x.store(0, Ordering::Relaxed);
        self.cursor_y.store(0, Ordering::Relaxed);
        self.cursor_visible.store(0, Ordering::Relaxed);
        self.cursor_width.store(0, Ordering::Relaxed);
        self.cursor_height.store(0, Ordering::Relaxed);
        self.cursor_hot_x.store(0, Ordering::Relaxed);
        self.cursor_hot_y.store(0, Ordering::Relaxed);
        // Release-publish frame_counter last: a consumer mapping the region
        // for the first time observes 0 and only then trusts the geometry
        // fields above it (spec §8 "frame_counter observed by a fresh
        // consumer is 0").
        self.frame_counter.store(0, Ordering::Release);
    }

    pub fn width(&self) -> u32 {
        self.width.load(Ordering::Relaxed)
    }

    pub fn height(&self) -> u32 {
        self.height.load(Ordering::Relaxed)
    }

    pub fn stride(&self) -> u32 {
        self.stride.load(Ordering::Relaxed)
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter.load(Ordering::Acquire)
    }

    /// Publish a dirty rect then bump `frame_counter` (spec §4.4
    /// `on_gfx_update`): dirty-rect fields are plain writes that precede the
    /// release-ordered counter bump in program order, so the counter bump
    /// is the actual cross-process fence.
    pub fn publish_dirty_rect(&self, x: u32, y: u32, w: u32, h: u32) {
        self.dirty_x.store(x, Ordering::Relaxed);
        self.dirty_y.store(y, Ordering::Relaxed);
        self.dirty_w.store(w, Ordering::Relaxed);
        self.dirty_h.store(h, Ordering::Relaxed);
        let prev = self.frame_counter.load(Ordering::Relaxed);
        self.frame_counter.store(prev.wrapping_add(1), Ordering::Release);
    }

    pub fn cursor_version(&self) -> u32 {
        self.cursor_version.load(Ordering::Acquire)
    }

    /// Publish clamped cursor metadata/shape, then bump `cursor_version`
    /// (spec §4.4 `on_cursor_define`).
    pub fn publish_cursor_shape(
        &self,
        width: u32,
        height: u32,
        hot_x: i32,
        hot_y: i32,
    ) {
        self.cursor_width.store(width.min(CURSOR_SIZE), Ordering::Relaxed);
        self.cursor_height.store(height.min(CURSOR_SIZE), Ordering::Relaxed);
        self.cursor_hot_x.store(hot_x, Ordering::Relaxed);
        self.cursor_hot_y.store(hot_y, Ordering::Relaxed);
        let prev = self.cursor_version.load(Ordering::Relaxed);
        self.cursor_version.store(prev.wrapping_add(1), Ordering::Release);
    }

    /// Position/visibility update (spec §4.4 `on_mouse_set`): no version
    /// bump, consumer correlates against `frame_counter` instead.
    pub fn set_cursor_position(&self, x: i32, y: i32, visible: bool) {
        self.cursor_x.store(x, Ordering::Relaxed);
        self.cursor_y.store(y, Ordering::Relaxed);
        self.cursor_visible.store(visible as u32, Ordering::Release);
    }

    pub fn cursor_width(&self) -> u32 {
        self.cursor_width.load(Ordering::Relaxed)
    }

    pub fn cursor_height(&self) -> u32 {
        self.cursor_height.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_header() -> Box<FbHeader> {
        unsafe {
            let layout = std::alloc::Layout::new::<FbHeader>();
            let ptr = std::alloc::alloc_zeroed(layout) as *mut FbHeader;
            Box::from_raw(ptr)
        }
    }

    fn surface() -> Surface {
        Surface {
            width: 800,
            height: 600,
            stride: 3200,
            format: 1,
        }
    }

    #[test]
    fn init_zeroes_frame_counter_and_spans_full_dirty_rect() {
        let header = new_header();
        header.init(&surface());
        assert_eq!(header.frame_counter(), 0);
        assert_eq!(header.dirty_w.load(Ordering::Relaxed), 800);
        assert_eq!(header.dirty_h.load(Ordering::Relaxed), 600);
    }

    #[test]
    fn publish_dirty_rect_increments_frame_counter_monotonically() {
        let header = new_header();
        header.init(&surface());
        header.publish_dirty_rect(0, 0, 800, 10);
        assert_eq!(header.frame_counter(), 1);
        header.publish_dirty_rect(0, 10, 800, 10);
        assert_eq!(header.frame_counter(), 2);
    }

    #[test]
    fn cursor_shape_clamps_to_64_and_bumps_version() {
        let header = new_header();
        header.publish_cursor_shape(128, 96, 3, 5);
        assert_eq!(header.cursor_width(), 64);
        assert_eq!(header.cursor_height(), 64);
        assert_eq!(header.cursor_version(), 1);
    }

    #[test]
    fn cursor_hide_zeroes_dimensions_and_still_bumps_version() {
        let header = new_header();
        header.publish_cursor_shape(64, 64, 0, 0);
        header.publish_cursor_shape(0, 0, 0, 0);
        assert_eq!(header.cursor_width(), 0);
        assert_eq!(header.cursor_height(), 0);
        assert_eq!(header.cursor_version(), 2);
    }
}
