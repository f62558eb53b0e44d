use std::fs::File;
use std::os::unix::io::{AsRawFd, RawFd};

use memmap2::MmapMut;

/// A read-write mapping of a memfd into this process's own address space.
///
/// This is the host-side counterpart of the teacher's `SharedMemoryMapping`,
/// narrowed: the teacher also registers the mapping as KVM guest memory
/// (`DeviceSharedMemoryManager`), which this crate has no use for since there
/// is no guest address space on this side of the rendezvous socket — the
/// producer only ever needs its own process-local view of the region.
pub struct Mapping {
    file: File,
    mmap: MmapMut,
}

impl Mapping {
    pub fn new(file: File) -> crate::system::Result<Mapping> {
        let mmap =
            unsafe { MmapMut::map_mut(&file) }.map_err(crate::system::Error::MmapRegionCreate)?;
        Ok(Mapping { file, mmap })
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.mmap.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }

    pub fn raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}
