//! IP address scope classification.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Net, Ipv6Net};
use libp2p::{Multiaddr, multiaddr::Protocol};

/// RFC 6598 shared address space used by carrier-grade NAT.
const SHARED_ADDRESS_SPACE: Ipv4Net = Ipv4Net::new_assert(Ipv4Addr::new(100, 64, 0, 0), 10);

/// IPv4 blocks reserved for special use that are never reachable on the internet.
const RESERVED_IPV4: [Ipv4Net; 7] = [
    // "This network" (RFC 1122)
    Ipv4Net::new_assert(Ipv4Addr::new(0, 0, 0, 0), 8),
    // IETF protocol assignments (RFC 6890)
    Ipv4Net::new_assert(Ipv4Addr::new(192, 0, 0, 0), 24),
    // TEST-NET-1, TEST-NET-2, TEST-NET-3 (RFC 5737)
    Ipv4Net::new_assert(Ipv4Addr::new(192, 0, 2, 0), 24),
    Ipv4Net::new_assert(Ipv4Addr::new(198, 51, 100, 0), 24),
    Ipv4Net::new_assert(Ipv4Addr::new(203, 0, 113, 0), 24),
    // Benchmarking (RFC 2544)
    Ipv4Net::new_assert(Ipv4Addr::new(198, 18, 0, 0), 15),
    // Reserved for future use (RFC 1112)
    Ipv4Net::new_assert(Ipv4Addr::new(240, 0, 0, 0), 4),
];

/// IPv6 documentation prefix (RFC 3849).
const DOCUMENTATION_IPV6: Ipv6Net =
    Ipv6Net::new_assert(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0), 32);

/// Scope of an IP address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressScope {
    /// Loopback addresses (127.0.0.0/8, ::1)
    Loopback,
    /// Private addresses (RFC 1918: 10/8, 172.16/12, 192.168/16; RFC 4193: fc00::/7)
    Private,
    /// Carrier-grade NAT shared space (100.64.0.0/10)
    Shared,
    /// Link-local addresses (169.254.0.0/16, fe80::/10)
    LinkLocal,
    /// Multicast, documentation, benchmarking and other special-use blocks
    Reserved,
    /// Public/global addresses (everything else)
    Public,
}

/// Extract the IP address from a multiaddr.
///
/// When a multiaddr carries several IP components (e.g. a relayed address) the
/// last one wins, as it names the host the address ultimately resolves to.
/// Returns `None` if the multiaddr doesn't contain an IP protocol.
pub fn extract_ip(addr: &Multiaddr) -> Option<IpAddr> {
    addr.iter()
        .filter_map(|proto| match proto {
            Protocol::Ip4(ip) => Some(IpAddr::V4(ip)),
            Protocol::Ip6(ip) => Some(IpAddr::V6(ip)),
            _ => None,
        })
        .last()
}

/// Classify the scope of an IP address.
///
/// Returns `None` for unspecified and broadcast addresses, which are not routable.
pub fn classify_ip(ip: IpAddr) -> Option<AddressScope> {
    match ip {
        IpAddr::V4(ipv4) => classify_ipv4(ipv4),
        IpAddr::V6(ipv6) => classify_ipv6(ipv6),
    }
}

fn classify_ipv4(ip: Ipv4Addr) -> Option<AddressScope> {
    if ip.is_unspecified() || ip.is_broadcast() {
        None
    } else if ip.is_loopback() {
        Some(AddressScope::Loopback)
    } else if ip.is_private() {
        Some(AddressScope::Private)
    } else if SHARED_ADDRESS_SPACE.contains(&ip) {
        Some(AddressScope::Shared)
    } else if ip.is_link_local() {
        Some(AddressScope::LinkLocal)
    } else if ip.is_multicast() || RESERVED_IPV4.iter().any(|net| net.contains(&ip)) {
        Some(AddressScope::Reserved)
    } else {
        Some(AddressScope::Public)
    }
}

fn classify_ipv6(ip: Ipv6Addr) -> Option<AddressScope> {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return classify_ipv4(mapped);
    }

    if ip.is_unspecified() {
        None
    } else if ip.is_loopback() {
        Some(AddressScope::Loopback)
    } else if ip.is_unique_local() {
        Some(AddressScope::Private)
    } else if ip.is_unicast_link_local() {
        Some(AddressScope::LinkLocal)
    } else if ip.is_multicast() || DOCUMENTATION_IPV6.contains(&ip) {
        Some(AddressScope::Reserved)
    } else {
        Some(AddressScope::Public)
    }
}

/// Classify the scope of the IP carried by a multiaddr.
///
/// Returns `None` if the multiaddr doesn't contain an IP address or
/// if the IP is unspecified.
pub fn classify_multiaddr(addr: &Multiaddr) -> Option<AddressScope> {
    extract_ip(addr).and_then(classify_ip)
}

/// Whether `ip` is globally routable.
pub fn is_public_ip(ip: IpAddr) -> bool {
    classify_ip(ip) == Some(AddressScope::Public)
}

/// Whether `ip` is not globally routable.
pub fn is_private_ip(ip: IpAddr) -> bool {
    !is_public_ip(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(addr: &str) -> Option<AddressScope> {
        classify_multiaddr(&addr.parse().unwrap())
    }

    #[test]
    fn test_classify_ipv4_loopback() {
        assert_eq!(scope("/ip4/127.0.0.1/tcp/1234"), Some(AddressScope::Loopback));
        assert_eq!(scope("/ip4/127.255.255.255/tcp/1234"), Some(AddressScope::Loopback));
    }

    #[test]
    fn test_classify_ipv4_private() {
        // 10.0.0.0/8
        assert_eq!(scope("/ip4/10.0.0.1/tcp/1234"), Some(AddressScope::Private));
        // 172.16.0.0/12
        assert_eq!(scope("/ip4/172.16.0.1/tcp/1234"), Some(AddressScope::Private));
        assert_eq!(scope("/ip4/172.31.255.255/tcp/1234"), Some(AddressScope::Private));
        // 192.168.0.0/16
        assert_eq!(scope("/ip4/192.168.0.1/udp/4001/quic-v1"), Some(AddressScope::Private));
    }

    #[test]
    fn test_classify_ipv4_shared() {
        assert_eq!(scope("/ip4/100.64.0.1/tcp/1234"), Some(AddressScope::Shared));
        assert_eq!(scope("/ip4/100.127.255.254/tcp/1234"), Some(AddressScope::Shared));
        // Just outside 100.64.0.0/10
        assert_eq!(scope("/ip4/100.128.0.1/tcp/1234"), Some(AddressScope::Public));
    }

    #[test]
    fn test_classify_ipv4_link_local() {
        assert_eq!(scope("/ip4/169.254.0.1/tcp/1234"), Some(AddressScope::LinkLocal));
    }

    #[test]
    fn test_classify_ipv4_public() {
        assert_eq!(scope("/ip4/8.8.8.8/tcp/1234"), Some(AddressScope::Public));
        // Just outside private range
        assert_eq!(scope("/ip4/172.15.255.255/tcp/1234"), Some(AddressScope::Public));
        assert_eq!(scope("/ip4/172.32.0.0/tcp/1234"), Some(AddressScope::Public));
    }

    #[test]
    fn test_classify_ipv6() {
        assert_eq!(scope("/ip6/::1/tcp/1234"), Some(AddressScope::Loopback));
        assert_eq!(scope("/ip6/fd00::1/tcp/1234"), Some(AddressScope::Private));
        assert_eq!(scope("/ip6/fc00::1/tcp/1234"), Some(AddressScope::Private));
        assert_eq!(scope("/ip6/fe80::1/tcp/1234"), Some(AddressScope::LinkLocal));
        assert_eq!(
            scope("/ip6/2607:f8b0:4004:800::200e/tcp/1234"),
            Some(AddressScope::Public)
        );
    }

    #[test]
    fn test_classify_ipv4_mapped_ipv6() {
        assert_eq!(scope("/ip6/::ffff:10.0.0.1/tcp/1234"), Some(AddressScope::Private));
        assert_eq!(scope("/ip6/::ffff:8.8.8.8/tcp/1234"), Some(AddressScope::Public));
    }

    #[test]
    fn test_classify_unroutable() {
        assert_eq!(scope("/ip4/0.0.0.0/tcp/1234"), None);
        assert_eq!(scope("/ip4/255.255.255.255/tcp/1234"), None);
        assert_eq!(scope("/ip6/::/tcp/1234"), None);
        assert_eq!(scope("/dns4/example.com/tcp/1234"), None);

        for reserved in [
            "/ip4/0.1.2.3/tcp/1234",
            "/ip4/192.0.0.5/tcp/1234",
            "/ip4/192.0.2.1/tcp/1234",
            "/ip4/198.51.100.1/tcp/1234",
            "/ip4/203.0.113.7/tcp/1234",
            "/ip4/198.18.0.1/tcp/1234",
            "/ip4/198.19.255.255/tcp/1234",
            "/ip4/240.0.0.1/tcp/1234",
            "/ip4/224.0.0.1/udp/1234",
            "/ip6/2001:db8::1/tcp/1234",
            "/ip6/ff02::1/udp/1234",
        ] {
            assert_eq!(scope(reserved), Some(AddressScope::Reserved), "{reserved}");
            assert!(is_private_ip(extract_ip(&reserved.parse().unwrap()).unwrap()));
        }

        // Neighbours of the reserved blocks stay public.
        assert_eq!(scope("/ip4/192.0.3.1/tcp/1234"), Some(AddressScope::Public));
        assert_eq!(scope("/ip4/198.20.0.1/tcp/1234"), Some(AddressScope::Public));
        assert_eq!(scope("/ip4/223.255.255.254/tcp/1234"), Some(AddressScope::Public));
        assert_eq!(scope("/ip6/2001:db9::1/tcp/1234"), Some(AddressScope::Public));
    }

    #[test]
    fn test_extract_ip() {
        let addr: Multiaddr = "/ip4/192.168.1.1/tcp/1234".parse().unwrap();
        assert_eq!(extract_ip(&addr), Some("192.168.1.1".parse().unwrap()));

        let addr: Multiaddr = "/ip6/2001:db8::1/tcp/1234".parse().unwrap();
        assert_eq!(extract_ip(&addr), Some("2001:db8::1".parse().unwrap()));

        let addr: Multiaddr = "/dns4/example.com/tcp/1234".parse().unwrap();
        assert_eq!(extract_ip(&addr), None);
    }

    #[test]
    fn test_extract_ip_takes_last_component() {
        let addr: Multiaddr = "/ip4/1.2.3.4/tcp/4001/p2p-circuit/ip4/5.6.7.8/tcp/4002"
            .parse()
            .unwrap();
        assert_eq!(extract_ip(&addr), Some("5.6.7.8".parse().unwrap()));
    }

    #[test]
    fn test_public_private_are_complementary() {
        let public: IpAddr = "1.1.1.1".parse().unwrap();
        let private: IpAddr = "10.1.2.3".parse().unwrap();
        let unspecified: IpAddr = "0.0.0.0".parse().unwrap();

        assert!(is_public_ip(public));
        assert!(!is_private_ip(public));
        assert!(is_private_ip(private));
        assert!(is_private_ip(unspecified));
    }
}
