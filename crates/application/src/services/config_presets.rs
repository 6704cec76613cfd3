use hostres_domain::host_entry::filter_addresses;
use hostres_domain::{DomainError, EntrySource, HostEntry, Hostname, QueryTypeSet};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Static host overrides served by the config-preset stage.
#[derive(Debug, Clone, Default)]
pub struct ConfigPresets {
    entries: FxHashMap<Hostname, Arc<Vec<IpAddr>>>,
}

impl ConfigPresets {
    pub fn from_config(presets: &BTreeMap<String, Vec<IpAddr>>) -> Result<Self, DomainError> {
        let mut entries = FxHashMap::default();
        for (name, addresses) in presets {
            let host = Hostname::parse(name)?;
            if host.is_ip_literal() {
                return Err(DomainError::InvalidConfig(format!(
                    "preset name '{name}' is an IP literal"
                )));
            }
            entries.insert(host, Arc::new(addresses.clone()));
        }
        Ok(Self { entries })
    }

    pub fn contains(&self, host: &Hostname) -> bool {
        self.entries.contains_key(host)
    }

    pub fn lookup(&self, host: &Hostname, query_types: QueryTypeSet) -> Option<HostEntry> {
        let addresses = self.entries.get(host)?;
        let filtered = filter_addresses(addresses, query_types);
        if filtered.is_empty() {
            return None;
        }
        Some(HostEntry::new(filtered, EntrySource::ConfigPreset))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
