use hostres_domain::{DomainError, Hostname};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[test]
fn test_parse_normalizes_case_and_trailing_dot() {
    let host = Hostname::parse("WWW.Example.COM.").unwrap();
    assert_eq!(host.as_str(), "www.example.com");
    assert!(!host.is_ip_literal());
}

#[test]
fn test_parse_ipv4_literal() {
    let host = Hostname::parse("192.0.2.1").unwrap();
    assert_eq!(
        host.ip_literal(),
        Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)))
    );
}

#[test]
fn test_parse_bracketed_ipv6_literal() {
    let host = Hostname::parse("[::1]").unwrap();
    assert_eq!(host.ip_literal(), Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));
    assert_eq!(host.as_str(), "::1");
}

#[test]
fn test_parse_rejects_empty() {
    assert_eq!(Hostname::parse("   "), Err(DomainError::EmptyHostname));
    assert_eq!(Hostname::parse("."), Err(DomainError::EmptyHostname));
}

#[test]
fn test_parse_rejects_bad_labels() {
    assert!(matches!(
        Hostname::parse("foo..bar"),
        Err(DomainError::InvalidHostname(_))
    ));
    assert!(matches!(
        Hostname::parse("-foo.com"),
        Err(DomainError::InvalidHostname(_))
    ));
    assert!(matches!(
        Hostname::parse("foo bar.com"),
        Err(DomainError::InvalidHostname(_))
    ));
    let long_label = format!("{}.com", "a".repeat(64));
    assert!(matches!(
        Hostname::parse(&long_label),
        Err(DomainError::InvalidHostname(_))
    ));
}

#[test]
fn test_parse_rejects_too_long() {
    let name = vec!["abcdefghi"; 30].join(".");
    assert!(matches!(
        Hostname::parse(&name),
        Err(DomainError::HostnameTooLong(_))
    ));
}

#[test]
fn test_underscore_labels_are_accepted() {
    assert!(Hostname::parse("_service._tcp.example.com").is_ok());
}

#[test]
fn test_localhost_names() {
    for name in ["localhost", "LOCALHOST.", "ip6-loopback", "foo.localhost"] {
        assert!(Hostname::parse(name).unwrap().is_localhost(), "{name}");
    }
    assert!(!Hostname::parse("localhost.example").unwrap().is_localhost());
    assert!(!Hostname::parse("127.0.0.1").unwrap().is_localhost());
}

#[test]
fn test_multicast_dns_names() {
    assert!(Hostname::parse("printer.local").unwrap().is_multicast_dns());
    assert!(!Hostname::parse("printer.localdomain").unwrap().is_multicast_dns());
    assert!(!Hostname::parse("example.com").unwrap().is_multicast_dns());
}

#[test]
fn test_equal_hosts_hash_equal() {
    use std::collections::HashSet;

    let mut set = HashSet::new();
    set.insert(Hostname::parse("Example.com").unwrap());
    assert!(set.contains(&Hostname::parse("example.com.").unwrap()));
}
