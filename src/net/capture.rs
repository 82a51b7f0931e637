//! Layer-2 capture and injection on the trunk interface.
//!
//! Frames are read from an `AF_PACKET` socket bound to the trunk. Linux
//! strips the 802.1Q tag from received frames and reports it through
//! `PACKET_AUXDATA`; the tag is written back in front of the ethertype so
//! the classifier sees the frame as it was on the wire.

use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::ptr;
use std::sync::Arc;
use std::time::Duration;

use nix::net::if_::if_nametoindex;
use pnet::packet::ethernet::EtherTypes;
use tracing::info;

use crate::error::{Error, Result};
use crate::mdns::frame::VLAN_TAG_LEN;
use crate::mdns::PACKET_SIZE;

/// How long a capture read waits before giving the caller a chance to
/// check for shutdown.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Destination and source MAC addresses.
const MAC_PAIR_LEN: usize = 12;

/// Room for one `PACKET_AUXDATA` control message.
const CONTROL_LEN: usize = 64;

/// A stream of raw captured frames.
pub trait FrameSource: Send {
    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when no frame arrived within the read timeout.
    fn next_frame(&mut self) -> io::Result<Option<&[u8]>>;
}

/// Somewhere to put rewritten frames.
pub trait FrameSink {
    /// Transmit one complete Ethernet frame.
    fn inject(&mut self, frame: &[u8]) -> io::Result<()>;
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn inject(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).inject(frame)
    }
}

/// Read half of the trunk socket.
pub struct CaptureSource {
    socket: Arc<OwnedFd>,
    // VLAN_TAG_LEN bytes of headroom for re-inserting a stripped tag.
    buf: Vec<u8>,
}

/// Write half of the trunk socket.
pub struct CaptureSink {
    socket: Arc<OwnedFd>,
}

/// Open a promiscuous layer-2 socket on `ifname`.
pub fn open(ifname: &str) -> Result<(CaptureSource, CaptureSink)> {
    let ifindex = if_nametoindex(ifname).map_err(|_| Error::InterfaceNotFound(ifname.to_string()))?;

    let socket = open_socket(ifindex).map_err(|err| Error::CaptureError {
        ifname: ifname.to_string(),
        reason: err.to_string(),
    })?;
    info!(interface = %ifname, ifindex, "Capture socket open");

    let socket = Arc::new(socket);
    let source = CaptureSource {
        socket: Arc::clone(&socket),
        buf: vec![0u8; VLAN_TAG_LEN + PACKET_SIZE],
    };
    Ok((source, CaptureSink { socket }))
}

fn open_socket(ifindex: u32) -> io::Result<OwnedFd> {
    let protocol = (libc::ETH_P_ALL as u16).to_be();

    let fd = unsafe {
        libc::socket(
            libc::AF_PACKET,
            libc::SOCK_RAW | libc::SOCK_CLOEXEC,
            libc::c_int::from(protocol),
        )
    };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `fd` is a freshly created descriptor owned by nobody else.
    let socket = unsafe { OwnedFd::from_raw_fd(fd) };

    let mut addr: libc::sockaddr_ll = unsafe { mem::zeroed() };
    addr.sll_family = libc::AF_PACKET as libc::c_ushort;
    addr.sll_protocol = protocol;
    addr.sll_ifindex = ifindex as libc::c_int;
    let rc = unsafe {
        libc::bind(
            socket.as_raw_fd(),
            ptr::addr_of!(addr).cast::<libc::sockaddr>(),
            mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    let mut membership: libc::packet_mreq = unsafe { mem::zeroed() };
    membership.mr_ifindex = ifindex as libc::c_int;
    membership.mr_type = libc::PACKET_MR_PROMISC as libc::c_ushort;
    set_option(
        socket.as_raw_fd(),
        libc::SOL_PACKET,
        libc::PACKET_ADD_MEMBERSHIP,
        &membership,
    )?;

    let enable: libc::c_int = 1;
    set_option(
        socket.as_raw_fd(),
        libc::SOL_PACKET,
        libc::PACKET_AUXDATA,
        &enable,
    )?;

    let timeout = libc::timeval {
        tv_sec: READ_TIMEOUT.as_secs() as libc::time_t,
        tv_usec: READ_TIMEOUT.subsec_micros() as libc::suseconds_t,
    };
    set_option(
        socket.as_raw_fd(),
        libc::SOL_SOCKET,
        libc::SO_RCVTIMEO,
        &timeout,
    )?;

    Ok(socket)
}

fn set_option<T>(fd: RawFd, level: libc::c_int, name: libc::c_int, value: &T) -> io::Result<()> {
    let rc = unsafe {
        libc::setsockopt(
            fd,
            level,
            name,
            (value as *const T).cast::<libc::c_void>(),
            mem::size_of::<T>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

impl CaptureSource {
    /// Receive one frame into the buffer after the headroom.
    ///
    /// Returns the frame length and the tag the kernel stripped, if any.
    fn recv(&mut self) -> io::Result<(usize, Option<(u16, u16)>)> {
        let frame = &mut self.buf[VLAN_TAG_LEN..];
        let mut iov = libc::iovec {
            iov_base: frame.as_mut_ptr().cast::<libc::c_void>(),
            iov_len: frame.len(),
        };
        // u64 words keep the control buffer aligned for cmsghdr.
        let mut control = [0u64; CONTROL_LEN / mem::size_of::<u64>()];

        let mut msg: libc::msghdr = unsafe { mem::zeroed() };
        msg.msg_iov = &mut iov;
        msg.msg_iovlen = 1;
        msg.msg_control = control.as_mut_ptr().cast::<libc::c_void>();
        msg.msg_controllen = CONTROL_LEN as _;

        let n = unsafe { libc::recvmsg(self.socket.as_raw_fd(), &mut msg, 0) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok((n as usize, auxdata(&msg).and_then(|aux| stripped_tag(&aux))))
    }
}

impl FrameSource for CaptureSource {
    fn next_frame(&mut self) -> io::Result<Option<&[u8]>> {
        match self.recv() {
            Ok((len, tag)) => Ok(Some(restore_tag(&mut self.buf, len, tag))),
            Err(err) if is_timeout(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl FrameSink for CaptureSink {
    fn inject(&mut self, frame: &[u8]) -> io::Result<()> {
        let n = unsafe {
            libc::send(
                self.socket.as_raw_fd(),
                frame.as_ptr().cast::<libc::c_void>(),
                frame.len(),
                0,
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        if n as usize != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", n, frame.len()),
            ));
        }
        Ok(())
    }
}

/// Find the `PACKET_AUXDATA` control message of a received packet.
fn auxdata(msg: &libc::msghdr) -> Option<libc::tpacket_auxdata> {
    // SAFETY: `msg` was filled in by `recvmsg`; the CMSG macros stay within
    // `msg_controllen` and the payload is read unaligned.
    unsafe {
        let mut cmsg = libc::CMSG_FIRSTHDR(msg);
        while !cmsg.is_null() {
            if (*cmsg).cmsg_level == libc::SOL_PACKET
                && (*cmsg).cmsg_type == libc::PACKET_AUXDATA
            {
                let data = libc::CMSG_DATA(cmsg).cast::<libc::tpacket_auxdata>();
                return Some(ptr::read_unaligned(data));
            }
            cmsg = libc::CMSG_NXTHDR(msg, cmsg);
        }
    }
    None
}

/// The (TPID, TCI) pair the kernel took off the frame, if it took one.
fn stripped_tag(aux: &libc::tpacket_auxdata) -> Option<(u16, u16)> {
    // Kernels before TP_STATUS_VLAN_VALID only report a non-zero TCI.
    if aux.tp_vlan_tci == 0 && aux.tp_status & libc::TP_STATUS_VLAN_VALID == 0 {
        return None;
    }

    let tpid = if aux.tp_status & libc::TP_STATUS_VLAN_TPID_VALID != 0 {
        aux.tp_vlan_tpid
    } else {
        EtherTypes::Vlan.0
    };
    Some((tpid, aux.tp_vlan_tci))
}

/// Put a stripped tag back between the MAC addresses and the ethertype.
///
/// `buf[VLAN_TAG_LEN..VLAN_TAG_LEN + len]` holds the frame as received.
fn restore_tag(buf: &mut [u8], len: usize, tag: Option<(u16, u16)>) -> &[u8] {
    match tag {
        Some((tpid, tci)) if len >= MAC_PAIR_LEN => {
            buf.copy_within(VLAN_TAG_LEN..VLAN_TAG_LEN + MAC_PAIR_LEN, 0);
            buf[MAC_PAIR_LEN..MAC_PAIR_LEN + 2].copy_from_slice(&tpid.to_be_bytes());
            buf[MAC_PAIR_LEN + 2..MAC_PAIR_LEN + VLAN_TAG_LEN].copy_from_slice(&tci.to_be_bytes());
            &buf[..VLAN_TAG_LEN + len]
        }
        _ => &buf[VLAN_TAG_LEN..VLAN_TAG_LEN + len],
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
