use arc_swap::ArcSwap;
use hostres_application::ports::HostsSource;
use hostres_domain::host_entry::filter_addresses;
use hostres_domain::{DomainError, EntrySource, HostEntry, Hostname, QueryTypeSet};
use rustc_hash::FxHashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

type HostsTable = FxHashMap<Hostname, Vec<IpAddr>>;

/// `/etc/hosts`-style name table. Reloads swap the whole table atomically,
/// so lookups never see a half-parsed file.
pub struct HostsFile {
    path: Option<PathBuf>,
    table: ArcSwap<HostsTable>,
}

impl HostsFile {
    /// Loads `path`. A missing or unreadable file yields an empty table.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table = read_table(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Hosts file not loaded, using empty table");
            HostsTable::default()
        });
        Self {
            path: Some(path),
            table: ArcSwap::from_pointee(table),
        }
    }

    /// In-memory table that cannot be reloaded.
    pub fn from_content(content: &str) -> Self {
        Self {
            path: None,
            table: ArcSwap::from_pointee(parse_hosts(content)),
        }
    }

    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HostsSource for HostsFile {
    fn lookup(&self, host: &Hostname, query_types: QueryTypeSet) -> Option<HostEntry> {
        let table = self.table.load();
        let addresses = table.get(host)?;
        let filtered = filter_addresses(addresses, query_types);
        if filtered.is_empty() {
            return None;
        }
        Some(HostEntry::new(filtered, EntrySource::Hosts))
    }

    fn reload(&self) -> Result<(), DomainError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let table = read_table(path)?;
        info!(path = %path.display(), names = table.len(), "Hosts file reloaded");
        self.table.store(Arc::new(table));
        Ok(())
    }
}

fn read_table(path: &PathBuf) -> Result<HostsTable, DomainError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DomainError::IoError(format!("{}: {}", path.display(), e)))?;
    Ok(parse_hosts(&content))
}

/// Parses hosts-file syntax: `address name [alias...]`, `#` comments.
/// Malformed lines and invalid names are skipped.
pub fn parse_hosts(content: &str) -> HostsTable {
    let mut table = HostsTable::default();

    for (line_no, line) in content.lines().enumerate() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let mut fields = line.split_whitespace();
        let Some(address) = fields.next() else {
            continue;
        };
        let address = match address.split('%').next().unwrap_or(address).parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => {
                debug!(line = line_no + 1, "Skipping hosts line with invalid address");
                continue;
            }
        };

        for name in fields {
            match Hostname::parse(name) {
                Ok(host) if !host.is_ip_literal() => {
                    let addresses = table.entry(host).or_default();
                    if !addresses.contains(&address) {
                        addresses.push(address);
                    }
                }
                _ => debug!(line = line_no + 1, name, "Skipping invalid hosts name"),
            }
        }
    }

    table
}
