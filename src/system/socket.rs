use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

use nix::sys::socket::{self, ControlMessage, ControlMessageOwned, MsgFlags, UnixAddr};
use nix::sys::uio::{IoSlice, IoSliceMut};

/// Extension trait for passing a single file descriptor over a connected
/// `AF_UNIX` stream socket via `SCM_RIGHTS`, the way the rendezvous protocol
/// (spec §4.1/§6.1) hands the shared memory fd to the consumer.
///
/// Named after the teacher's own `crate::system::ScmSocket`.
pub trait ScmSocket {
    /// Send one zero byte with `fd` attached as ancillary data. This is the
    /// entire wire protocol: no framing, no handshake, one message per
    /// region pairing.
    fn send_fd(&self, fd: RawFd) -> crate::system::Result<()>;

    /// Receive one fd sent by `send_fd`. Not used by the producer (which
    /// only ever sends), but kept symmetric so the same trait can drive a
    /// test double standing in for the consumer.
    fn recv_fd(&self) -> crate::system::Result<Option<RawFd>>;
}

impl ScmSocket for UnixStream {
    fn send_fd(&self, fd: RawFd) -> crate::system::Result<()> {
        let payload = [0u8; 1];
        let iov = [IoSlice::new(&payload)];
        let fds = [fd];
        let cmsg = [ControlMessage::ScmRights(&fds)];

        socket::sendmsg::<UnixAddr>(self.as_raw_fd(), &iov, &cmsg, MsgFlags::empty(), None)
            .map_err(|e| crate::system::Error::SendFd(io::Error::from(e)))?;
        Ok(())
    }

    fn recv_fd(&self) -> crate::system::Result<Option<RawFd>> {
        let mut payload = [0u8; 1];
        let mut iov = [IoSliceMut::new(&mut payload)];
        let mut cmsg_buffer = nix::cmsg_space!(RawFd);

        let msg = socket::recvmsg::<UnixAddr>(
            self.as_raw_fd(),
            &mut iov,
            Some(&mut cmsg_buffer),
            MsgFlags::empty(),
        )
        .map_err(|e| crate::system::Error::RecvFd(io::Error::from(e)))?;

        for cmsg in msg.cmsgs() {
            if let ControlMessageOwned::ScmRights(fds) = cmsg {
                if let Some(&fd) = fds.first() {
                    return Ok(Some(fd));
                }
            }
        }
        Ok(None)
    }
}
