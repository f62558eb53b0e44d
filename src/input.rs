//! Input event ring (spec §3.3, §4.5): consumer → producer. The consumer
//! writes `InputEvent`s and advances `write_idx`; the producer drains them
//! each refresh tick and advances `read_idx`. Roles are the mirror image of
//! the audio ring's producer/consumer split.

use std::sync::atomic::{AtomicU32, Ordering};

pub const INPUT_RING_SLOTS: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InputEventKind {
    MouseRel = 1,
    MouseAbs = 2,
    MouseBtn = 3,
    Key = 4,
}

impl InputEventKind {
    fn from_raw(v: u8) -> Option<InputEventKind> {
        match v {
            1 => Some(InputEventKind::MouseRel),
            2 => Some(InputEventKind::MouseAbs),
            3 => Some(InputEventKind::MouseBtn),
            4 => Some(InputEventKind::Key),
            _ => None,
        }
    }
}

/// One 12-byte wire-format input event (spec §3.3). Plain (non-atomic)
/// fields: the ring protocol, not the hardware, is what guarantees a slot is
/// never read while it is being written (the consumer only writes slots the
/// producer has not yet reached, and advances `write_idx` with a release
/// store only after the slot contents are in place).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InputEvent {
    pub kind: u8,
    pub button: u8,
    pub pressed: u8,
    pub reserved: u8,
    pub x: i32,
    pub y: i32,
}

impl InputEvent {
    pub fn mouse_rel(dx: i32, dy: i32) -> InputEvent {
        InputEvent {
            kind: InputEventKind::MouseRel as u8,
            button: 0,
            pressed: 0,
            reserved: 0,
            x: dx,
            y: dy,
        }
    }

    pub fn mouse_abs(x: i32, y: i32) -> InputEvent {
        InputEvent {
            kind: InputEventKind::MouseAbs as u8,
            button: 0,
            pressed: 0,
            reserved: 0,
            x,
            y,
        }
    }

    pub fn mouse_button(button: u8, pressed: bool) -> InputEvent {
        InputEvent {
            kind: InputEventKind::MouseBtn as u8,
            button,
            pressed: pressed as u8,
            reserved: 0,
            x: 0,
            y: 0,
        }
    }

    pub fn key(scancode: i32, pressed: bool) -> InputEvent {
        InputEvent {
            kind: InputEventKind::Key as u8,
            button: 0,
            pressed: pressed as u8,
            reserved: 0,
            x: scancode,
            y: 0,
        }
    }
}

/// The embedded input ring, matching the C ABI byte-for-byte: two 32-bit
/// indices, 8 bytes of padding to align the event array to 16 bytes, then
/// 256 fixed-size event slots.
#[repr(C)]
pub struct InputRing {
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    _padding: [u32; 2],
    events: [InputEvent; INPUT_RING_SLOTS as usize],
}

/// Sink for drained input events, standing in for the VMM's input-injection
/// API (spec §1 external collaborator, "the surrounding VMM's input
/// injection API").
pub trait InputSink {
    fn mouse_rel(&mut self, dx: i32, dy: i32);
    fn mouse_abs(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn mouse_button(&mut self, button: u8, pressed: bool);
    fn key(&mut self, scancode: i32, pressed: bool);
    /// Commit the batch drained since the last `sync` call. Called at most
    /// once per `InputRing::drain` invocation, and only if it drained at
    /// least one event (spec §4.5 step 3).
    fn sync(&mut self);
}

impl InputRing {
    /// Reset both indices to zero. Called once per surface-configuration
    /// epoch by `on_gfx_switch` (spec §4.4).
    pub fn reset(&self) {
        self.write_idx.store(0, Ordering::Relaxed);
        self.read_idx.store(0, Ordering::Relaxed);
    }

    fn read_event(&self, idx: u32) -> InputEvent {
        let slot = &self.events[(idx & (INPUT_RING_SLOTS - 1)) as usize] as *const InputEvent;
        // SAFETY: `slot` points within `self`, which is a valid mapped
        // region; `read_volatile` prevents the compiler from assuming the
        // consumer process cannot have written here since our last read.
        unsafe { std::ptr::read_volatile(slot) }
    }

    /// Drain every event visible at the moment of the initial acquire load,
    /// injecting each into `sink` in program order, then release-publish the
    /// new `read_idx` (spec §4.5). Returns the number of events drained.
    pub fn drain(&self, width: u32, height: u32, sink: &mut dyn InputSink) -> u32 {
        let write_idx = self.write_idx.load(Ordering::Acquire);
        let start = self.read_idx.load(Ordering::Relaxed);
        let mut read_idx = start;

        while read_idx != write_idx {
            let ev = self.read_event(read_idx);
            match InputEventKind::from_raw(ev.kind) {
                Some(InputEventKind::MouseRel) => sink.mouse_rel(ev.x, ev.y),
                Some(InputEventKind::MouseAbs) => sink.mouse_abs(ev.x, ev.y, width, height),
                Some(InputEventKind::MouseBtn) => sink.mouse_button(ev.button, ev.pressed != 0),
                Some(InputEventKind::Key) => sink.key(ev.x, ev.pressed != 0),
                None => warn!("dropping input event with unknown type {}", ev.kind),
            }
            read_idx = read_idx.wrapping_add(1);
        }

        let drained = read_idx.wrapping_sub(start);
        if drained > 0 {
            sink.sync();
            self.read_idx.store(read_idx, Ordering::Release);
        }
        drained
    }

    pub const BYTE_SIZE: usize = std::mem::size_of::<InputRing>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, PartialEq)]
    enum Recorded {
        Rel(i32, i32),
        Abs(i32, i32, u32, u32),
        Btn(u8, bool),
        Key(i32, bool),
        Sync,
    }

    #[derive(Default)]
    struct FakeSink {
        events: VecDeque<Recorded>,
    }

    impl InputSink for FakeSink {
        fn mouse_rel(&mut self, dx: i32, dy: i32) {
            self.events.push_back(Recorded::Rel(dx, dy));
        }
        fn mouse_abs(&mut self, x: i32, y: i32, width: u32, height: u32) {
            self.events.push_back(Recorded::Abs(x, y, width, height));
        }
        fn mouse_button(&mut self, button: u8, pressed: bool) {
            self.events.push_back(Recorded::Btn(button, pressed));
        }
        fn key(&mut self, scancode: i32, pressed: bool) {
            self.events.push_back(Recorded::Key(scancode, pressed));
        }
        fn sync(&mut self) {
            self.events.push_back(Recorded::Sync);
        }
    }

    fn new_ring() -> Box<InputRing> {
        // SAFETY: InputRing is plain-old-data; zero-initialized atomics and
        // a zeroed event array are both valid bit patterns.
        unsafe {
            let layout = std::alloc::Layout::new::<InputRing>();
            let ptr = std::alloc::alloc_zeroed(layout) as *mut InputRing;
            Box::from_raw(ptr)
        }
    }

    fn write_event(ring: &InputRing, idx: u32, ev: InputEvent) {
        let slot = &ring.events[(idx & (INPUT_RING_SLOTS - 1)) as usize] as *const InputEvent as *mut InputEvent;
        unsafe { std::ptr::write_volatile(slot, ev) };
    }

    #[test]
    fn drains_three_events_in_order_with_one_sync_call() {
        let ring = new_ring();

        write_event(&ring, 0, InputEvent::mouse_abs(400, 300));
        write_event(&ring, 1, InputEvent::mouse_button(1, true));
        write_event(&ring, 2, InputEvent::key(0x1C, true));
        ring.write_idx.store(3, Ordering::Release);

        let mut sink = FakeSink::default();
        let drained = ring.drain(1024, 768, &mut sink);

        assert_eq!(drained, 3);
        assert_eq!(ring.read_idx.load(Ordering::Relaxed), 3);
        assert_eq!(
            sink.events,
            VecDeque::from(vec![
                Recorded::Abs(400, 300, 1024, 768),
                Recorded::Btn(1, true),
                Recorded::Key(0x1C, true),
                Recorded::Sync,
            ])
        );
    }

    #[test]
    fn empty_ring_drains_nothing_and_never_calls_sync() {
        let ring = new_ring();
        let mut sink = FakeSink::default();
        assert_eq!(ring.drain(100, 100, &mut sink), 0);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn drain_only_sees_events_visible_at_the_acquire_moment() {
        let ring = new_ring();
        write_event(&ring, 0, InputEvent::mouse_rel(1, 1));
        ring.write_idx.store(1, Ordering::Release);

        let mut sink = FakeSink::default();
        assert_eq!(ring.drain(0, 0, &mut sink), 1);

        // A later-arriving event is not retroactively visible to the drain
        // that already completed; it shows up on the next call.
        write_event(&ring, 1, InputEvent::mouse_rel(2, 2));
        ring.write_idx.store(2, Ordering::Release);
        sink.events.clear();
        assert_eq!(ring.drain(0, 0, &mut sink), 1);
        assert_eq!(sink.events[0], Recorded::Rel(2, 2));
    }
}
