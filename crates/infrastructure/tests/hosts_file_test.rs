use hostres_application::ports::{DnsConfigSource, HostsSource};
use hostres_domain::config::DnsConfig;
use hostres_domain::{Hostname, QueryTypeSet};
use hostres_infrastructure::{HostsFile, ResolvConfSource};
use std::io::Write;

// ============================================================================
// Hosts file
// ============================================================================

#[test]
fn test_reload_picks_up_file_changes() {
    // Arrange
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "192.0.2.10 nas.lan").unwrap();
    let hosts = HostsFile::load(file.path());
    let nas = Hostname::parse("nas.lan").unwrap();
    let media = Hostname::parse("media.lan").unwrap();
    assert!(hosts.lookup(&nas, QueryTypeSet::ADDRESS).is_some());

    // Act
    std::fs::write(file.path(), "192.0.2.11 media.lan\n").unwrap();
    hosts.reload().unwrap();

    // Assert
    assert!(hosts.lookup(&nas, QueryTypeSet::ADDRESS).is_none());
    assert!(hosts.lookup(&media, QueryTypeSet::ADDRESS).is_some());
}

#[test]
fn test_failed_reload_keeps_previous_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hosts");
    std::fs::write(&path, "192.0.2.10 nas.lan\n").unwrap();
    let hosts = HostsFile::load(&path);

    std::fs::remove_file(&path).unwrap();

    assert!(hosts.reload().is_err());
    assert_eq!(hosts.len(), 1);
}

// ============================================================================
// resolv.conf
// ============================================================================

#[test]
fn test_resolv_conf_source_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "nameserver 192.0.2.53\nsearch corp.example").unwrap();
    let dns = DnsConfig {
        resolv_conf: file.path().display().to_string(),
        ..DnsConfig::default()
    };

    let config = ResolvConfSource::new(dns).read().unwrap();

    assert_eq!(config.nameservers, vec!["192.0.2.53:53".parse().unwrap()]);
    assert_eq!(config.search_domains, vec!["corp.example".to_string()]);
    assert!(config.has_secure_servers());
    assert!(config.is_usable());
}
