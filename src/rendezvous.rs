//! Rendezvous transport (spec §4.1, §6.1): the producer connects to the
//! consumer's listening Unix stream socket and hands over the region's memfd
//! via `SCM_RIGHTS`. Connection and send failures are non-fatal; the caller
//! retries on the next refresh tick.

use std::os::unix::io::RawFd;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use crate::system::ScmSocket;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to send fd to consumer: {0}")]
    SendFd(#[source] std::io::Error),
}

/// Per-channel connection state, mirroring spec §3.5.
pub struct Rendezvous {
    socket_path: Option<PathBuf>,
    client: Option<UnixStream>,
    fd_sent: bool,
}

impl Rendezvous {
    pub fn new(socket_path: Option<PathBuf>) -> Rendezvous {
        Rendezvous {
            socket_path,
            client: None,
            fd_sent: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn fd_sent(&self) -> bool {
        self.fd_sent
    }

    /// The region was reallocated: any previously sent fd is now stale, so a
    /// fresh one must be sent on the existing (or next) connection.
    pub fn reset_fd_sent(&mut self) {
        self.fd_sent = false;
    }

    /// Attempt to connect if not already connected. Silent on failure except
    /// for socket-creation errors, which are unusual enough to report (spec
    /// §4.1, §7 "Rendezvous absent" vs the creation-failure carve-out).
    pub fn connect(&mut self) {
        if self.client.is_some() {
            return;
        }
        let Some(path) = self.socket_path.as_ref() else {
            return;
        };

        match UnixStream::connect(path) {
            Ok(stream) => {
                info!("connected to rendezvous socket {}", path.display());
                self.client = Some(stream);
                self.fd_sent = false;
            }
            Err(_) => {
                // Silent: consumer socket not there yet, retry next refresh.
            }
        }
    }

    /// Send `fd` once per (connection, fd) pairing.
    pub fn send_fd(&mut self, fd: RawFd) {
        if self.fd_sent {
            return;
        }
        let Some(client) = self.client.as_ref() else {
            return;
        };

        match client.send_fd(fd) {
            Ok(()) => {
                self.fd_sent = true;
            }
            Err(e) => {
                warn!("failed to send shared memory fd to consumer: {}", e);
                // Leave fd_sent false; caller retries on the next tick.
            }
        }
    }

    pub fn socket_path(&self) -> Option<&Path> {
        self.socket_path.as_deref()
    }
}
