use hostres_domain::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, writing to stderr so stdout carries only
/// resolution results.
///
/// `--log-level` wins, then `RUST_LOG`, then `[logging] level`. The first
/// directive that parses is used; `info` if none does.
pub fn init_logging(logging: &LoggingConfig, cli_level: Option<&str>) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref(), &logging.level);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().with_current_span(false).init(),
    }
}

fn build_filter(cli_level: Option<&str>, env: Option<&str>, configured: &str) -> EnvFilter {
    cli_level
        .into_iter()
        .chain(env)
        .chain(Some(configured))
        .filter(|directive| !directive.trim().is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
