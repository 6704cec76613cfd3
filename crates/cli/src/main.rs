//! # hostres
//!
//! Resolves hostnames through the scheduler and prints one line per name.

mod bootstrap;

use bootstrap::{init_logging, load_config};
use clap::Parser;
use futures::future::join_all;
use hostres_domain::{
    CacheUsage, CliOverrides, DnsQueryType, HostEntry, HostResolverSource, RequestPriority,
    ResolveParameters, SecureDnsMode,
};
use hostres_infrastructure::{HostResolver, HostResolverBuilder};
use tracing::info;

#[derive(Parser)]
#[command(name = "hostres")]
#[command(version)]
#[command(about = "Host resolution with secure DNS policy, deduplication and admission control")]
struct Cli {
    /// Hostnames or IP literals to resolve
    #[arg(required = true)]
    hosts: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Secure DNS mode: off, automatic or secure
    #[arg(short = 'm', long)]
    mode: Option<SecureDnsMode>,

    /// Maximum number of concurrently running network stages
    #[arg(short = 'l', long)]
    limit: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Query type: A, AAAA or unspecified
    #[arg(short = 't', long, default_value = "unspecified")]
    query_type: DnsQueryType,

    #[arg(short = 'p', long, default_value = "low")]
    priority: RequestPriority,

    /// Restrict resolution to one source: any, system, dns, mdns, local
    #[arg(short = 's', long, default_value = "any")]
    source: HostResolverSource,

    /// Accept stale cache entries
    #[arg(long)]
    allow_stale: bool,

    /// Resolve the list this many times; later rounds show cache hits
    #[arg(short = 'r', long, default_value = "1")]
    repeat: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        secure_dns_mode: cli.mode,
        max_concurrent_stages: cli.limit,
        log_level: cli.log_level.clone(),
    };
    let config = load_config(cli.config.as_deref(), overrides)?;
    init_logging(&config.logging, cli.log_level.as_deref());

    info!(
        config_file = cli.config.as_deref().unwrap_or("default"),
        mode = %config.resolver.secure_dns_mode,
        max_concurrent_stages = config.resolver.max_concurrent_stages,
        "Configuration loaded"
    );

    let resolver = HostResolverBuilder::new(&config).build()?;

    let params = ResolveParameters {
        query_type: cli.query_type,
        priority: cli.priority,
        cache_usage: if cli.allow_stale {
            CacheUsage::StaleAllowed
        } else {
            CacheUsage::Allowed
        },
        source: cli.source,
        ..ResolveParameters::default()
    };

    let mut failures = 0;
    for round in 1..=cli.repeat.max(1) {
        if cli.repeat > 1 {
            println!("# round {round}");
        }
        failures += resolve_all(&resolver, &cli.hosts, params).await;
    }

    if let Ok(stats) = resolver.stats().await {
        info!(
            jobs = stats.num_jobs,
            running = stats.num_running_stages,
            queued = stats.num_queued_stages,
            "Resolver idle"
        );
    }
    resolver.shutdown();

    if failures > 0 {
        anyhow::bail!("{failures} name(s) failed to resolve");
    }
    Ok(())
}

/// Resolves every host concurrently and prints the outcomes in input order.
/// Returns the number of failures.
async fn resolve_all(resolver: &HostResolver, hosts: &[String], params: ResolveParameters) -> usize {
    let pending = hosts.iter().map(|host| {
        let request = resolver.resolve(host, params);
        async move {
            match request {
                Ok(request) => request.wait().await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            }
        }
    });

    let results = join_all(pending).await;
    let mut failures = 0;
    for (host, result) in hosts.iter().zip(results) {
        match result {
            Ok(entry) => println!("{}", format_entry(host, &entry)),
            Err(e) => {
                failures += 1;
                println!("{host}\terror: {e}");
            }
        }
    }
    failures
}

fn format_entry(host: &str, entry: &HostEntry) -> String {
    let addresses: Vec<String> = entry.addresses.iter().map(ToString::to_string).collect();
    let mut line = format!("{host}\t{}\t{}", addresses.join(","), entry.source.as_str());
    if let Some(ttl) = entry.ttl {
        line.push_str(&format!("\tttl={}s", ttl.as_secs()));
    }
    if !entry.aliases.is_empty() {
        let aliases: Vec<&str> = entry.aliases.iter().map(|a| a.as_ref()).collect();
        line.push_str(&format!("\taliases={}", aliases.join(",")));
    }
    line
}
