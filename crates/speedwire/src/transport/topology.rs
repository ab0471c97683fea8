// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Socket topology manager.
//!
//! Opens a set of Speedwire sockets according to a selectable strategy and
//! the list of local interface addresses, and resolves "the right socket"
//! for a given send/receive direction, cast type, and interface.
//!
//! The registry is an insertion-ordered sequence of entries, immutable after
//! construction: lookups are plain `&self` scans and need no locking, and
//! teardown is dropping the topology. There is no process-wide instance --
//! the process entry point constructs one topology and hands it to whatever
//! moves raw bytes.

use crate::transport::socket::SpeedwireSocket;
use std::fmt;
use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Direction capability bitmask of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction(u8);

impl Direction {
    /// Socket may send
    pub const SEND: Direction = Direction(1 << 0);
    /// Socket may receive
    pub const RECV: Direction = Direction(1 << 1);

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True iff every bit of `other` is present.
    pub const fn contains(self, other: Direction) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Combine two direction masks.
    pub const fn or(self, other: Direction) -> Direction {
        Direction(self.0 | other.0)
    }
}

impl std::ops::BitOr for Direction {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

/// Cast-type capability bitmask of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastType(u8);

impl CastType {
    /// One-to-many group delivery
    pub const MULTICAST: CastType = CastType(1 << 0);
    /// Point-to-point delivery
    pub const UNICAST: CastType = CastType(1 << 1);
    /// Reserved third delivery category
    pub const ANYCAST: CastType = CastType(1 << 2);

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True iff every bit of `other` is present.
    pub const fn contains(self, other: CastType) -> bool {
        (self.0 & other.0) == other.0
    }

    /// True iff any bit of `other` is present.
    pub const fn intersects(self, other: CastType) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two cast masks.
    pub const fn or(self, other: CastType) -> CastType {
        CastType(self.0 | other.0)
    }
}

impl std::ops::BitOr for CastType {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bit, name) in [
            (CastType::MULTICAST, "multicast"),
            (CastType::UNICAST, "unicast"),
            (CastType::ANYCAST, "anycast"),
        ] {
            if self.contains(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// Socket-opening policy across local interfaces and cast types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// One socket per local interface, serving both casts
    SocketPerInterface,
    /// One single wildcard-bound socket for everything
    SingleSocket,
    /// One multicast wildcard socket shared across interfaces plus one
    /// unicast socket per interface
    #[default]
    SharedMulticast,
    /// One unicast socket per interface only
    UnicastPerInterface,
}

/// One registry entry: an open socket plus its capability tags.
#[derive(Debug)]
pub struct SocketEntry {
    socket: Arc<SpeedwireSocket>,
    direction: Direction,
    cast: CastType,
    interface: Ipv4Addr,
}

impl SocketEntry {
    /// The shared socket handle.
    pub fn socket(&self) -> &Arc<SpeedwireSocket> {
        &self.socket
    }

    /// Direction capability.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Cast-type capability.
    pub fn cast(&self) -> CastType {
        self.cast
    }

    /// Bound interface address (wildcard for shared sockets).
    pub fn interface(&self) -> Ipv4Addr {
        self.interface
    }
}

/// A socket that failed to open during construction.
#[derive(Debug)]
pub struct BindFailure {
    /// Interface the open was attempted for (wildcard for shared sockets)
    pub interface: Ipv4Addr,
    /// The underlying failure
    pub error: io::Error,
}

/// Errors raised while constructing a topology.
#[derive(Debug)]
pub enum TopologyError {
    /// Not a single socket could be opened; the failures tell which
    /// interfaces were attempted.
    NoSockets(Vec<BindFailure>),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::NoSockets(failures) => {
                write!(f, "no socket could be opened ({} attempts failed", failures.len())?;
                for failure in failures {
                    write!(f, "; {}: {}", failure.interface, failure.error)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

/// Process-lifetime registry of Speedwire sockets.
///
/// # Example
///
/// ```no_run
/// use speedwire::transport::{local_ipv4_addresses, CastType, SocketTopology, Strategy};
///
/// let interfaces = local_ipv4_addresses();
/// let topology = SocketTopology::open(Strategy::default(), &interfaces)?;
/// let sockets = topology.recv_sockets(CastType::MULTICAST, &interfaces);
/// # Ok::<(), speedwire::transport::TopologyError>(())
/// ```
#[derive(Debug)]
pub struct SocketTopology {
    strategy: Strategy,
    sockets: Vec<SocketEntry>,
    bind_failures: Vec<BindFailure>,
}

impl SocketTopology {
    /// Open the socket set the strategy requires for the given local
    /// interface addresses.
    ///
    /// Every socket is opened send+receive capable. An individual open
    /// failure does not abort construction: the remaining sockets are still
    /// opened and the failure is kept, visible via
    /// [`bind_failures`](Self::bind_failures). Only an entirely empty
    /// registry is an error.
    pub fn open(strategy: Strategy, interfaces: &[Ipv4Addr]) -> Result<Self, TopologyError> {
        let mut topology = SocketTopology {
            strategy,
            sockets: Vec::new(),
            bind_failures: Vec::new(),
        };

        let both = Direction::SEND | Direction::RECV;
        match strategy {
            Strategy::SocketPerInterface => {
                topology.open_for_each_interface(
                    both,
                    CastType::MULTICAST | CastType::UNICAST,
                    interfaces,
                );
            }
            Strategy::SingleSocket => {
                topology.open_for_interface(
                    both,
                    CastType::MULTICAST | CastType::UNICAST,
                    Ipv4Addr::UNSPECIFIED,
                );
            }
            Strategy::SharedMulticast => {
                topology.open_for_each_interface(both, CastType::UNICAST, interfaces);
                topology.open_for_interface(
                    both,
                    CastType::MULTICAST | CastType::UNICAST,
                    Ipv4Addr::UNSPECIFIED,
                );
            }
            Strategy::UnicastPerInterface => {
                topology.open_for_each_interface(both, CastType::UNICAST, interfaces);
            }
        }

        if topology.sockets.is_empty() {
            return Err(TopologyError::NoSockets(topology.bind_failures));
        }
        log::debug!(
            "[TOPOLOGY] opened {} sockets (strategy {:?}, {} failures)",
            topology.sockets.len(),
            strategy,
            topology.bind_failures.len()
        );
        Ok(topology)
    }

    /// The strategy this topology was constructed with.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// All registry entries, in insertion order.
    pub fn sockets(&self) -> &[SocketEntry] {
        &self.sockets
    }

    /// The interfaces whose sockets failed to open during construction.
    pub fn bind_failures(&self) -> &[BindFailure] {
        &self.bind_failures
    }

    /// Resolve a socket for sending with the given cast type via the given
    /// interface.
    ///
    /// Interface-specific entries win over wildcard-bound ones; a miss is
    /// `None`, never an arbitrary entry.
    pub fn send_socket(
        &self,
        cast: CastType,
        interface: Ipv4Addr,
    ) -> Option<&Arc<SpeedwireSocket>> {
        if !interface.is_unspecified() {
            if let Some(entry) = self.scan(Direction::SEND, cast, interface, MatchMode::Exact) {
                return Some(entry.socket());
            }
        }
        if let Some(entry) =
            self.scan(Direction::SEND, cast, Ipv4Addr::UNSPECIFIED, MatchMode::Exact)
        {
            return Some(entry.socket());
        }
        log::warn!(
            "[TOPOLOGY] no send socket for cast={} interface={}",
            cast,
            interface
        );
        None
    }

    /// Resolve a socket for receiving with the given cast type on the given
    /// interface.
    ///
    /// Three-tier fallback, each tier scanning in registry order: exact cast
    /// on the interface, overlapping cast on the interface (both skipped for
    /// the wildcard interface), exact cast on the wildcard binding.
    pub fn recv_socket(
        &self,
        cast: CastType,
        interface: Ipv4Addr,
    ) -> Option<&Arc<SpeedwireSocket>> {
        if !interface.is_unspecified() {
            if let Some(entry) = self.scan(Direction::RECV, cast, interface, MatchMode::Exact) {
                return Some(entry.socket());
            }
            if let Some(entry) = self.scan(Direction::RECV, cast, interface, MatchMode::Overlap) {
                return Some(entry.socket());
            }
        }
        if let Some(entry) =
            self.scan(Direction::RECV, cast, Ipv4Addr::UNSPECIFIED, MatchMode::Exact)
        {
            return Some(entry.socket());
        }
        log::warn!(
            "[TOPOLOGY] no recv socket for cast={} interface={}",
            cast,
            interface
        );
        None
    }

    /// Resolve the deduplicated receive-socket set for multiplexed waiting
    /// across the given interfaces.
    ///
    /// Under the default strategy a pure multicast request short-circuits to
    /// the single shared wildcard socket -- it already serves every
    /// interface. Otherwise one receive socket is resolved per interface for
    /// each requested cast bit (unicast, then multicast, then anycast),
    /// skipping sockets already present by identity.
    pub fn recv_sockets(
        &self,
        cast: CastType,
        interfaces: &[Ipv4Addr],
    ) -> Vec<Arc<SpeedwireSocket>> {
        let mut result: Vec<Arc<SpeedwireSocket>> = Vec::new();

        if cast == CastType::MULTICAST && self.strategy == Strategy::SharedMulticast {
            if let Some(socket) = self.recv_socket(CastType::MULTICAST, Ipv4Addr::UNSPECIFIED) {
                result.push(Arc::clone(socket));
            }
            return result;
        }

        for bit in [CastType::UNICAST, CastType::MULTICAST, CastType::ANYCAST] {
            if !cast.intersects(bit) {
                continue;
            }
            for &interface in interfaces {
                if let Some(socket) = self.recv_socket(bit, interface) {
                    let duplicate = result.iter().any(|known| Arc::ptr_eq(known, socket));
                    if !duplicate {
                        result.push(Arc::clone(socket));
                    }
                }
            }
        }

        result
    }

    fn open_for_each_interface(
        &mut self,
        direction: Direction,
        cast: CastType,
        interfaces: &[Ipv4Addr],
    ) {
        for &interface in interfaces {
            self.open_for_interface(direction, cast, interface);
        }
    }

    fn open_for_interface(&mut self, direction: Direction, cast: CastType, interface: Ipv4Addr) {
        match SpeedwireSocket::open(interface, cast.intersects(CastType::MULTICAST)) {
            Ok(socket) => {
                self.sockets.push(SocketEntry {
                    socket: Arc::new(socket),
                    direction,
                    cast,
                    interface,
                });
            }
            Err(error) => {
                log::warn!(
                    "[TOPOLOGY] cannot open socket on {} (cast={}): {}",
                    interface,
                    cast,
                    error
                );
                self.bind_failures.push(BindFailure { interface, error });
            }
        }
    }

    // Registry scan shared by the lookup tiers. Exact mode requires the
    // entry's cast capability to cover every requested bit (a combined-cast
    // entry serves its parts); overlap mode settles for any common bit.
    fn scan(
        &self,
        direction: Direction,
        cast: CastType,
        interface: Ipv4Addr,
        mode: MatchMode,
    ) -> Option<&SocketEntry> {
        self.sockets.iter().find(|entry| {
            entry.direction.contains(direction)
                && match mode {
                    MatchMode::Exact => entry.cast.contains(cast),
                    MatchMode::Overlap => entry.cast.intersects(cast),
                }
                && entry.interface == interface
        })
    }
}

#[derive(Clone, Copy)]
enum MatchMode {
    Exact,
    Overlap,
}
