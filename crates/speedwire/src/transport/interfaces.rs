// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local interface discovery.
//!
//! Supplies the list of local IPv4 addresses the topology manager binds
//! sockets across. Loopback interfaces are excluded; Speedwire devices are
//! only ever reachable over real networks.

use std::net::{IpAddr, Ipv4Addr};

/// Enumerate the non-loopback local IPv4 addresses.
///
/// Enumeration failure is not an error: it yields an empty list and a debug
/// log, and the caller decides whether a topology without interfaces is
/// usable.
pub fn local_ipv4_addresses() -> Vec<Ipv4Addr> {
    let interfaces = match local_ip_address::list_afinet_netifas() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            log::debug!("[IFACE] failed to list network interfaces: {}", e);
            return Vec::new();
        }
    };

    let mut addrs = Vec::new();
    for (_name, ip) in interfaces {
        if let IpAddr::V4(ipv4) = ip {
            if !ipv4.is_loopback() {
                addrs.push(ipv4);
            }
        }
    }

    log::debug!("[IFACE] discovered {} non-loopback interfaces", addrs.len());
    addrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_excludes_loopback() {
        for addr in local_ipv4_addresses() {
            assert!(!addr.is_loopback(), "loopback {} must be filtered", addr);
        }
    }
}
