//! Client origin check.
//!
//! The only access control the gateway has: peers outside the loopback
//! range are rejected before any request byte is read.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};

/// Returns true if `addr` is a loopback address.
///
/// IPv4 addresses match `127.0.0.0/8`, IPv6 addresses match `::1` exactly.
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are unwrapped first since a
/// dual-stack listener reports IPv4 peers in that form.
pub fn is_local(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.octets()[0] == 127,
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.octets()[0] == 127,
            None => v6 == Ipv6Addr::LOCALHOST,
        },
    }
}

/// Convenience wrapper over [`is_local`] for accepted peers.
pub fn is_local_peer(peer: &SocketAddr) -> bool {
    is_local(peer.ip())
}
