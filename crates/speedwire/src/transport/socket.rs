// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw Speedwire UDP socket.
//!
//! The open/send/receive capability the topology manager orchestrates. Every
//! socket binds the Speedwire port with address (and, on Unix, port) reuse
//! enabled so that per-interface unicast sockets can coexist with a shared
//! wildcard multicast socket, and multiple processes can listen at once.
//! Closing is RAII: dropping the socket releases it.

use crate::protocol::constants::{MULTICAST_GROUP, SPEEDWIRE_PORT};
use crate::transport::interfaces::local_ipv4_addresses;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

/// One bound Speedwire UDP socket, unicast or multicast-joined.
#[derive(Debug)]
pub struct SpeedwireSocket {
    socket: UdpSocket,
    interface: Ipv4Addr,
    multicast: bool,
}

impl SpeedwireSocket {
    /// Open a socket bound to `interface` (or the wildcard) on the Speedwire
    /// port, joining the multicast group when `multicast` is set.
    ///
    /// Multicast join failures are non-fatal: some adapters cannot join, and
    /// the socket is still usable for unicast traffic. Bind failures are
    /// returned to the caller.
    pub fn open(interface: Ipv4Addr, multicast: bool) -> io::Result<SpeedwireSocket> {
        let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket2.set_reuse_address(true)?;
        #[cfg(unix)]
        set_reuseport(&socket2)?;

        let bind_addr = SocketAddr::new(IpAddr::V4(interface), SPEEDWIRE_PORT);
        socket2.bind(&bind_addr.into())?;
        let socket: UdpSocket = socket2.into();

        if multicast {
            join_multicast_group(&socket, interface)?;
        }

        log::debug!(
            "[SOCKET] opened {} socket bound to {}",
            if multicast { "multicast" } else { "unicast" },
            bind_addr
        );

        Ok(SpeedwireSocket {
            socket,
            interface,
            multicast,
        })
    }

    /// Send a datagram to `dest`.
    pub fn send_to(&self, data: &[u8], dest: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(data, dest)
    }

    /// Send a datagram to the Speedwire multicast group.
    pub fn send_multicast(&self, data: &[u8]) -> io::Result<usize> {
        self.send_to(
            data,
            SocketAddr::new(IpAddr::V4(MULTICAST_GROUP), SPEEDWIRE_PORT),
        )
    }

    /// Receive a datagram; blocks unless the socket is non-blocking.
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf)
    }

    /// Switch the socket between blocking and non-blocking receive.
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        self.socket.set_nonblocking(nonblocking)
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// The interface address this socket was opened for (wildcard for
    /// shared sockets).
    pub fn interface(&self) -> Ipv4Addr {
        self.interface
    }

    /// Whether this socket joined the multicast group.
    pub fn is_multicast(&self) -> bool {
        self.multicast
    }
}

#[cfg(unix)]
impl std::os::unix::io::AsRawFd for SpeedwireSocket {
    fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        self.socket.as_raw_fd()
    }
}

/// Join the Speedwire multicast group.
///
/// A wildcard-bound socket joins on every local interface (devices announce
/// on all networks); an interface-bound socket joins on that interface only.
/// Individual join failures are tolerated: adapters without multicast
/// support or routes simply stay unicast-only.
fn join_multicast_group(socket: &UdpSocket, interface: Ipv4Addr) -> io::Result<()> {
    let interfaces = if interface.is_unspecified() {
        local_ipv4_addresses()
    } else {
        vec![interface]
    };

    if interfaces.is_empty() {
        log::debug!("[SOCKET] no suitable interfaces found for multicast, joining on UNSPECIFIED");
        if let Err(e) = socket.join_multicast_v4(&MULTICAST_GROUP, &Ipv4Addr::UNSPECIFIED) {
            log::debug!(
                "[SOCKET] join_multicast_v4({}) on UNSPECIFIED failed (non-fatal): {}",
                MULTICAST_GROUP,
                e
            );
        }
    } else {
        for iface in &interfaces {
            match socket.join_multicast_v4(&MULTICAST_GROUP, iface) {
                Ok(()) => {
                    log::debug!(
                        "[SOCKET] join_multicast_v4({}) on interface {}",
                        MULTICAST_GROUP,
                        iface
                    );
                }
                Err(e) if e.raw_os_error() == Some(98) => {
                    // EADDRINUSE (98) Linux: already joined on same physical NIC
                    log::debug!(
                        "[SOCKET] join_multicast_v4({}) on {} - already joined, skipping",
                        MULTICAST_GROUP,
                        iface
                    );
                }
                Err(e) => {
                    log::debug!(
                        "[SOCKET] join_multicast_v4({}) on {} failed (non-fatal): {}",
                        MULTICAST_GROUP,
                        iface,
                        e
                    );
                }
            }
        }
    }

    socket.set_multicast_loop_v4(true)?;
    let _ = socket.set_multicast_ttl_v4(1);
    Ok(())
}

/// Set SO_REUSEPORT so identical binds coexist (shared wildcard multicast
/// socket next to per-interface unicast sockets, multiple listening
/// processes on one host).
#[cfg(unix)]
fn set_reuseport(socket: &Socket) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let fd = socket.as_raw_fd();
    let optval: libc::c_int = 1;
    // SAFETY: setsockopt FFI with valid fd, standard socket option, and correctly sized optval pointer
    let ret = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEPORT,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
