use hostres_application::services::{
    allows_system_fallback, build_stage_sequence, effective_query_types, resolution_key,
    ConfigPresets, DnsSettings, ManagerState,
};
use hostres_domain::{
    CacheUsage, ContextId, DnsQueryType, HostResolverSource, NetworkHandle, QueryTypeSet,
    ResolveParameters, SecureDnsMode, SecureDnsPolicy, Security, Stage,
};
use std::collections::BTreeMap;
use std::net::IpAddr;

mod helpers;
use helpers::{host, settings};

const CACHE_SECURE: Stage = Stage::CacheLookup(Security::Secure);
const CACHE_INSECURE: Stage = Stage::CacheLookup(Security::Insecure);
const DNS_SECURE: Stage = Stage::DnsClient(Security::Secure);
const DNS_INSECURE: Stage = Stage::DnsClient(Security::Insecure);

fn manager_state(settings: DnsSettings, presets: &ConfigPresets) -> ManagerState<'_> {
    ManagerState {
        settings,
        dns_config_available: true,
        ipv6_reachable: true,
        presets,
    }
}

fn plan(name: &str, params: ResolveParameters, state: &ManagerState<'_>) -> Vec<Stage> {
    let key = resolution_key(
        host(name),
        &params,
        ContextId::DEFAULT,
        NetworkHandle::DEFAULT,
        state,
    );
    build_stage_sequence(&key, params.cache_usage, state).to_vec()
}

// ============================================================================
// Special hosts
// ============================================================================

#[test]
fn test_ip_literal_yields_single_pseudo_stage() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Automatic), &presets);

    assert_eq!(
        plan("192.0.2.7", ResolveParameters::default(), &state),
        vec![Stage::IpLiteral]
    );
    assert_eq!(
        plan("[2001:db8::1]", ResolveParameters::default(), &state),
        vec![Stage::IpLiteral]
    );
}

#[test]
fn test_multicast_names_only_use_mdns() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Secure), &presets);

    assert_eq!(
        plan("printer.local", ResolveParameters::default(), &state),
        vec![Stage::MulticastDns]
    );
    let explicit = ResolveParameters::default().with_source(HostResolverSource::MulticastDns);
    assert_eq!(plan("example.com", explicit, &state), vec![Stage::MulticastDns]);
}

// ============================================================================
// Secure DNS modes
// ============================================================================

#[test]
fn test_off_mode_uses_insecure_dns() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Off), &presets);

    assert_eq!(
        plan("example.com", ResolveParameters::default(), &state),
        vec![CACHE_INSECURE, Stage::Hosts, DNS_INSECURE]
    );
}

#[test]
fn test_off_mode_without_insecure_dns_uses_system() {
    let presets = ConfigPresets::default();
    let mut settings = settings(SecureDnsMode::Off);
    settings.insecure_dns_enabled = false;
    settings.fallback_to_system = false;
    let state = manager_state(settings, &presets);

    assert_eq!(
        plan("example.com", ResolveParameters::default(), &state),
        vec![CACHE_INSECURE, Stage::Hosts, Stage::System]
    );
}

#[test]
fn test_secure_mode_only_secure_stages() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Secure), &presets);

    assert_eq!(
        plan("example.com", ResolveParameters::default(), &state),
        vec![CACHE_SECURE, DNS_SECURE]
    );
}

#[test]
fn test_automatic_mode_orders_secure_before_insecure() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Automatic), &presets);

    assert_eq!(
        plan("example.com", ResolveParameters::default(), &state),
        vec![CACHE_SECURE, Stage::Hosts, DNS_SECURE, CACHE_INSECURE, DNS_INSECURE]
    );
}

#[test]
fn test_stale_allowed_pulls_insecure_cache_ahead() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Automatic), &presets);
    let params = ResolveParameters::default().with_cache_usage(CacheUsage::StaleAllowed);

    assert_eq!(
        plan("example.com", params, &state),
        vec![CACHE_SECURE, CACHE_INSECURE, Stage::Hosts, DNS_SECURE, DNS_INSECURE]
    );
}

#[test]
fn test_prioritizing_can_be_disabled() {
    let presets = ConfigPresets::default();
    let mut settings = settings(SecureDnsMode::Automatic);
    settings.prioritize_local_lookups_on_stale = false;
    let state = manager_state(settings, &presets);
    let params = ResolveParameters::default().with_cache_usage(CacheUsage::StaleAllowed);

    assert_eq!(
        plan("example.com", params, &state),
        vec![CACHE_SECURE, Stage::Hosts, DNS_SECURE, CACHE_INSECURE, DNS_INSECURE]
    );
}

#[test]
fn test_automatic_mode_race() {
    let presets = ConfigPresets::default();
    let mut settings = settings(SecureDnsMode::Automatic);
    settings.race_secure_and_insecure = true;
    let state = manager_state(settings, &presets);

    assert_eq!(
        plan("example.com", ResolveParameters::default(), &state),
        vec![CACHE_SECURE, Stage::Hosts, CACHE_INSECURE, Stage::DnsRace]
    );
}

#[test]
fn test_automatic_without_insecure_dns_appends_system_when_fallback_enabled() {
    let presets = ConfigPresets::default();
    let mut settings = settings(SecureDnsMode::Automatic);
    settings.insecure_dns_enabled = false;
    settings.race_secure_and_insecure = true;
    let state = manager_state(settings, &presets);

    assert_eq!(
        plan("example.com", ResolveParameters::default(), &state),
        vec![CACHE_SECURE, Stage::Hosts, DNS_SECURE, CACHE_INSECURE, Stage::System]
    );
}

#[test]
fn test_without_dns_config() {
    let presets = ConfigPresets::default();
    let mut automatic = manager_state(settings(SecureDnsMode::Automatic), &presets);
    automatic.dns_config_available = false;
    assert_eq!(
        plan("example.com", ResolveParameters::default(), &automatic),
        vec![CACHE_SECURE, CACHE_INSECURE, Stage::System]
    );

    let mut secure = manager_state(settings(SecureDnsMode::Secure), &presets);
    secure.dns_config_available = false;
    assert_eq!(
        plan("example.com", ResolveParameters::default(), &secure),
        vec![CACHE_SECURE, DNS_SECURE]
    );
}

#[test]
fn test_secure_mode_never_produces_insecure_stages() {
    let presets = ConfigPresets::default();
    let sources = [
        HostResolverSource::Any,
        HostResolverSource::System,
        HostResolverSource::Dns,
        HostResolverSource::LocalOnly,
    ];
    let usages = [
        CacheUsage::Allowed,
        CacheUsage::StaleAllowed,
        CacheUsage::Disallowed,
    ];

    for race in [false, true] {
        for insecure in [false, true] {
            for config in [false, true] {
                let mut settings = settings(SecureDnsMode::Secure);
                settings.race_secure_and_insecure = race;
                settings.insecure_dns_enabled = insecure;
                let mut state = manager_state(settings, &presets);
                state.dns_config_available = config;

                for source in sources {
                    for usage in usages {
                        let params = ResolveParameters::default()
                            .with_source(source)
                            .with_cache_usage(usage);
                        let stages = plan("example.com", params, &state);
                        assert!(
                            stages.iter().all(|s| !s.is_insecure_network()
                                && *s != CACHE_INSECURE
                                && *s != Stage::Hosts),
                            "{source:?} {usage:?} produced {stages:?}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_request_policy_restricts_global_mode() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Automatic), &presets);

    let require = ResolveParameters::default().with_secure_dns_policy(SecureDnsPolicy::Require);
    assert_eq!(plan("example.com", require, &state), vec![CACHE_SECURE, DNS_SECURE]);

    let disable = ResolveParameters::default().with_secure_dns_policy(SecureDnsPolicy::Disable);
    assert_eq!(
        plan("example.com", disable, &state),
        vec![CACHE_INSECURE, Stage::Hosts, DNS_INSECURE]
    );

    let global_secure = manager_state(settings(SecureDnsMode::Secure), &presets);
    assert_eq!(
        plan("example.com", disable, &global_secure),
        vec![CACHE_SECURE, DNS_SECURE]
    );
}

// ============================================================================
// Cache usage, sources, presets
// ============================================================================

#[test]
fn test_disallowed_cache_has_no_cache_stages() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Automatic), &presets);
    let params = ResolveParameters::default().with_cache_usage(CacheUsage::Disallowed);

    assert_eq!(
        plan("example.com", params, &state),
        vec![Stage::Hosts, DNS_SECURE, DNS_INSECURE]
    );
}

#[test]
fn test_system_source() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Automatic), &presets);
    let params = ResolveParameters::default().with_source(HostResolverSource::System);

    assert_eq!(
        plan("example.com", params, &state),
        vec![CACHE_SECURE, CACHE_INSECURE, Stage::Hosts, Stage::System]
    );
}

#[test]
fn test_dns_source_never_uses_system() {
    let presets = ConfigPresets::default();
    let mut settings = settings(SecureDnsMode::Off);
    settings.insecure_dns_enabled = false;
    let state = manager_state(settings, &presets);
    let params = ResolveParameters::default().with_source(HostResolverSource::Dns);

    assert_eq!(
        plan("example.com", params, &state),
        vec![CACHE_INSECURE, Stage::Hosts]
    );
}

#[test]
fn test_local_only_source_has_no_network_stage() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Automatic), &presets);
    let params = ResolveParameters::default().with_source(HostResolverSource::LocalOnly);

    let stages = plan("example.com", params, &state);
    assert!(stages.iter().all(Stage::is_local), "{stages:?}");
}

#[test]
fn test_system_stage_only_for_address_queries() {
    let presets = ConfigPresets::default();
    let mut settings = settings(SecureDnsMode::Off);
    settings.insecure_dns_enabled = false;
    let state = manager_state(settings, &presets);
    let params = ResolveParameters::default().with_query_type(DnsQueryType::TXT);

    assert_eq!(
        plan("example.com", params, &state),
        vec![CACHE_INSECURE, Stage::Hosts]
    );
}

#[test]
fn test_preset_stage_follows_hosts() {
    let mut table: BTreeMap<String, Vec<IpAddr>> = BTreeMap::new();
    table.insert("doh.example".to_string(), vec!["192.0.2.53".parse().unwrap()]);
    let presets = ConfigPresets::from_config(&table).unwrap();
    let state = manager_state(settings(SecureDnsMode::Off), &presets);

    assert_eq!(
        plan("DOH.example.", ResolveParameters::default(), &state),
        vec![CACHE_INSECURE, Stage::Hosts, Stage::ConfigPreset, DNS_INSECURE]
    );
}

// ============================================================================
// Keys and reachability
// ============================================================================

#[test]
fn test_unreachable_ipv6_narrows_unspecified_queries() {
    let name = host("example.com");
    assert_eq!(
        effective_query_types(&name, DnsQueryType::Unspecified, false),
        QueryTypeSet::single(DnsQueryType::A)
    );
    assert_eq!(
        effective_query_types(&name, DnsQueryType::AAAA, false),
        QueryTypeSet::single(DnsQueryType::AAAA)
    );
    assert_eq!(
        effective_query_types(&name, DnsQueryType::Unspecified, true),
        QueryTypeSet::ADDRESS
    );
    assert_eq!(
        effective_query_types(&host("::1"), DnsQueryType::Unspecified, false),
        QueryTypeSet::ADDRESS
    );
}

#[test]
fn test_identical_requests_produce_identical_keys() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Automatic), &presets);
    let params = ResolveParameters::default();

    let a = resolution_key(
        host("Example.COM"),
        &params,
        ContextId::DEFAULT,
        NetworkHandle::DEFAULT,
        &state,
    );
    let b = resolution_key(
        host("example.com."),
        &params,
        ContextId::DEFAULT,
        NetworkHandle::DEFAULT,
        &state,
    );
    assert_eq!(a, b);

    let other_context = resolution_key(
        host("example.com"),
        &params,
        ContextId(7),
        NetworkHandle::DEFAULT,
        &state,
    );
    assert_ne!(a, other_context);
}

#[test]
fn test_system_fallback_conditions() {
    let presets = ConfigPresets::default();
    let state = manager_state(settings(SecureDnsMode::Automatic), &presets);
    let key = |params: ResolveParameters| {
        resolution_key(
            host("example.com"),
            &params,
            ContextId::DEFAULT,
            NetworkHandle::DEFAULT,
            &state,
        )
    };

    assert!(allows_system_fallback(&key(ResolveParameters::default()), &state.settings));
    assert!(!allows_system_fallback(
        &key(ResolveParameters::default().with_secure_dns_policy(SecureDnsPolicy::Require)),
        &state.settings
    ));
    assert!(!allows_system_fallback(
        &key(ResolveParameters::default().with_source(HostResolverSource::Dns)),
        &state.settings
    ));
    assert!(!allows_system_fallback(
        &key(ResolveParameters::default().with_query_type(DnsQueryType::TXT)),
        &state.settings
    ));

    let mut no_fallback = state.settings;
    no_fallback.fallback_to_system = false;
    assert!(!allows_system_fallback(&key(ResolveParameters::default()), &no_fallback));
}
