use hostres_domain::{CliOverrides, Config};

pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostres_domain::SecureDnsMode;

    #[test]
    fn test_overrides_apply_without_config_file() {
        let overrides = CliOverrides {
            secure_dns_mode: Some(SecureDnsMode::Secure),
            max_concurrent_stages: Some(2),
            log_level: None,
        };

        let config = load_config(None, overrides).unwrap();

        assert_eq!(config.resolver.secure_dns_mode, SecureDnsMode::Secure);
        assert_eq!(config.resolver.max_concurrent_stages, 2);
    }

    #[test]
    fn test_invalid_limit_is_rejected() {
        let overrides = CliOverrides {
            max_concurrent_stages: Some(0),
            ..CliOverrides::default()
        };

        assert!(load_config(None, overrides).is_err());
    }
}
