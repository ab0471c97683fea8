// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Speedwire - SMA telemetry wire codec and socket topology
//!
//! A pure Rust implementation of the SMA Speedwire smart-meter/inverter
//! telemetry wire format carried over UDP, plus the socket topology needed
//! to send and receive it across multiple local interfaces with mixed
//! multicast/unicast delivery.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use speedwire::protocol::{emeter, SpeedwireHeader};
//! use speedwire::transport::{local_ipv4_addresses, CastType, SocketTopology, Strategy};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Open the socket set once, at process start
//!     let interfaces = local_ipv4_addresses();
//!     let topology = SocketTopology::open(Strategy::default(), &interfaces)?;
//!
//!     // Receive a datagram on the shared multicast socket
//!     let socket = topology
//!         .recv_socket(CastType::MULTICAST, std::net::Ipv4Addr::UNSPECIFIED)
//!         .ok_or("no multicast socket")?;
//!     let mut buf = [0u8; 1500];
//!     let (len, _from) = socket.recv_from(&mut buf)?;
//!
//!     // Validate the envelope and walk the payload
//!     let header = SpeedwireHeader::new(&buf[..len]);
//!     if header.check_header() && header.is_emeter_protocol_id() {
//!         for record in emeter::decode_payload(header.payload(), 0) {
//!             println!("{}", record);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                     Dispatch / application                   |
//! |        (poll loops, aggregation -- not part of this crate)   |
//! +--------------------------------------------------------------+
//! |                        Protocol layer                        |
//! |   SpeedwireHeader | ObisId/ObisRecord | catalog | payload    |
//! +--------------------------------------------------------------+
//! |                       Transport layer                        |
//! |   SocketTopology | SpeedwireSocket | interface discovery     |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SpeedwireHeader`] | Zero-copy view over the 24-byte datagram envelope |
//! | [`ObisId`] | Four-field key identifying one physical quantity |
//! | [`ObisRecord`] | Identifier + unit/scale descriptor + value slot |
//! | [`ObisCatalog`] | Predefined records in payload order |
//! | [`SocketTopology`] | Strategy-driven socket registry with lookups |
//! | [`SpeedwireSocket`] | One bound UDP socket, unicast or multicast |

/// Speedwire wire-format implementation (header, records, payload walk).
pub mod protocol;
/// Transport layer (sockets, interface discovery, topology).
pub mod transport;

pub use protocol::{
    EncodeError, Line, MeasurementType, MeasurementValue, ObisCatalog, ObisId, ObisRecord,
    SpeedwireHeader, ValueEncoding,
};
pub use transport::{
    local_ipv4_addresses, CastType, Direction, SocketTopology, SpeedwireSocket, Strategy,
    TopologyError,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
