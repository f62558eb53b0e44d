//! Hardware cursor pixel slab: a fixed 64×64 RGBA grid, stride 64, with only
//! the top-left `width × height` subregion holding valid pixels (spec §3.1).

use super::header::CURSOR_SIZE;

pub const BYTES_PER_PIXEL: usize = 4;
pub const SLAB_STRIDE_BYTES: usize = CURSOR_SIZE as usize * BYTES_PER_PIXEL;
pub const SLAB_BYTES: usize = SLAB_STRIDE_BYTES * CURSOR_SIZE as usize;

/// A cursor shape as read from the console subsystem: `CursorSource` is the
/// seam standing in for that query (spec §4.4 "read the authoritative
/// cursor from the console subsystem, not the argument").
#[derive(Debug, Clone)]
pub struct CursorShape {
    pub width: u32,
    pub height: u32,
    pub hot_x: i32,
    pub hot_y: i32,
    /// Tightly packed RGBA rows, `width * height * 4` bytes, row-major,
    /// no padding. Caller is responsible for clamping `width`/`height` to
    /// 64 before constructing this (the copy below also clamps defensively).
    pub pixels: Vec<u8>,
}

pub trait CursorSource {
    /// Returns `None` when no cursor is currently defined (hide).
    fn current_cursor(&self) -> Option<CursorShape>;
}

/// Copy `shape`'s pixels into the fixed 64-wide slab, row by row, clamping
/// both dimensions to 64 and zeroing any row/column beyond the source.
pub fn copy_into_slab(slab: &mut [u8; SLAB_BYTES], shape: &CursorShape) {
    let width = (shape.width as usize).min(CURSOR_SIZE as usize);
    let height = (shape.height as usize).min(CURSOR_SIZE as usize);
    let src_stride = shape.width as usize * BYTES_PER_PIXEL;

    slab.fill(0);
    for row in 0..height {
        let src_start = row * src_stride;
        let src_end = src_start + width * BYTES_PER_PIXEL;
        let dst_start = row * SLAB_STRIDE_BYTES;
        let dst_end = dst_start + width * BYTES_PER_PIXEL;
        slab[dst_start..dst_end].copy_from_slice(&shape.pixels[src_start..src_end]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_a_small_cursor_into_the_top_left_of_the_slab() {
        let shape = CursorShape {
            width: 2,
            height: 2,
            hot_x: 0,
            hot_y: 0,
            pixels: vec![
                0xFF, 0, 0, 0xFF, 0, 0xFF, 0, 0xFF, // row 0: red, green
                0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // row 1: blue, white
            ],
        };
        let mut slab = [0u8; SLAB_BYTES];
        copy_into_slab(&mut slab, &shape);

        assert_eq!(&slab[0..4], &[0xFF, 0, 0, 0xFF]);
        assert_eq!(&slab[4..8], &[0, 0xFF, 0, 0xFF]);
        assert_eq!(&slab[SLAB_STRIDE_BYTES..SLAB_STRIDE_BYTES + 4], &[0, 0, 0xFF, 0xFF]);
        // Beyond the 2x2 source, the slab stays zeroed.
        assert_eq!(&slab[8..12], &[0, 0, 0, 0]);
    }

    #[test]
    fn oversized_cursor_is_clamped_to_64() {
        let shape = CursorShape {
            width: 128,
            height: 96,
            hot_x: 0,
            hot_y: 0,
            pixels: vec![0x7Fu8; 128 * 96 * 4],
        };
        let mut slab = [0u8; SLAB_BYTES];
        copy_into_slab(&mut slab, &shape);
        assert_eq!(slab.len(), SLAB_BYTES);
        assert_eq!(&slab[0..4], &[0x7F, 0x7F, 0x7F, 0x7F]);
    }
}
