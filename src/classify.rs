//! Deciding whether a token names a non-routable address.
//!
//! A special address is annotated `Local` without ever reaching the geo
//! database. Tokens that do not parse are not special; they are left for the
//! resolver, which reports them as `Unknown`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A policy that decides whether a token should skip geolocation.
pub trait Classify {
    /// Returns `true` for loopback, unspecified, link-local or private tokens.
    fn is_special(&self, token: &str) -> bool;
}

/// The default policy, based on the well-known special ranges.
#[derive(Copy, Clone, Debug, Default)]
pub struct SpecialRanges;

impl Classify for SpecialRanges {
    #[inline]
    fn is_special(&self, token: &str) -> bool {
        match parse_token(token) {
            Some(ip) => is_special_ip(ip),
            None => false,
        }
    }
}

/// Parse a token as an address, tolerating enclosing brackets.
#[inline]
pub fn parse_token(token: &str) -> Option<IpAddr> {
    token
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .ok()
}

/// Classify a parsed address.
///
/// IPv4-mapped IPv6 addresses are judged by the IPv4 address they carry.
#[inline]
pub fn is_special_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_special_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_special_v4(v4),
            None => is_special_v6(v6),
        },
    }
}

#[inline]
fn is_special_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    // 224.0.0.0/24
    let link_local_multicast = a == 224 && b == 0 && c == 0;

    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_link_local()
        || link_local_multicast
        || ip.is_private()
}

#[inline]
fn is_special_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    // fe80::/10
    let link_local_unicast = first & 0xffc0 == 0xfe80;
    // ff02::/16 with any flag nibble, e.g. ff12::/16 and ff32::/16
    let link_local_multicast = first & 0xff0f == 0xff02;
    // fc00::/7
    let unique_local = first & 0xfe00 == 0xfc00;

    ip.is_loopback()
        || ip.is_unspecified()
        || link_local_unicast
        || link_local_multicast
        || unique_local
}
