mod mapping;
mod memfd;
mod socket;

pub use mapping::Mapping;
pub use memfd::create_sealed_memfd;
pub use socket::ScmSocket;

use std::{io, result};
use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

/// Aggregates every syscall-boundary failure this module's three
/// operations (memfd creation, mmap, fd-passing) can produce, the way the
/// teacher's own `system::Error` aggregates its device/ioctl failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create memfd: {0}")]
    MemfdCreate(memfd::CreateError),
    #[error("failed to map shared memory: {0}")]
    MmapRegionCreate(io::Error),
    #[error("failed to send fd over rendezvous socket: {0}")]
    SendFd(io::Error),
    #[error("failed to receive fd over rendezvous socket: {0}")]
    RecvFd(io::Error),
}
