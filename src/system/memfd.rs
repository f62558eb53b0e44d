use std::fs::File;
use std::io;

use memfd::{FileSeal, Memfd, MemfdOptions};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("memfd_create failed: {0}")]
    Create(memfd::Error),
    #[error("failed to size memfd: {0}")]
    SetLen(io::Error),
    #[error("failed to apply seals to memfd: {0}")]
    Seal(memfd::Error),
}

/// Create an anonymous, sealed, `size`-byte shared memory file descriptor.
///
/// The seals (`SealShrink`, `SealGrow`, then `SealSeal`) match the teacher's
/// `SharedMemoryMapping::create_memfd`: once sized, the region's extent can
/// never change again, which is the guarantee a second process mapping the
/// fd relies on (no TOCTOU on the region size it read from the header).
pub fn create_sealed_memfd(name: &str, size: u64) -> crate::system::Result<File> {
    create_sealed_memfd_inner(name, size).map_err(crate::system::Error::MemfdCreate)
}

fn create_sealed_memfd_inner(name: &str, size: u64) -> Result<File, CreateError> {
    let memfd: Memfd = MemfdOptions::default()
        .allow_sealing(true)
        .create(name)
        .map_err(CreateError::Create)?;

    memfd.as_file().set_len(size).map_err(CreateError::SetLen)?;

    memfd
        .add_seals(&[FileSeal::SealShrink, FileSeal::SealGrow])
        .map_err(CreateError::Seal)?;
    memfd.add_seal(FileSeal::SealSeal).map_err(CreateError::Seal)?;

    Ok(memfd.into_file())
}
