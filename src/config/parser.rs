use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use hostcrawl::config::load_config;
///
/// let config = load_config(Path::new("hostcrawl.toml")).unwrap();
/// println!("Timeout: {:?}", config.crawler.timeout);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Parses a duration string such as `10s`, `500ms` or `1m30s`
///
/// Supported units are `ns`, `us`, `ms`, `s`, `m` and `h`; each component
/// may carry a decimal fraction (`1.5s`). A bare `0` is accepted.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(input.to_string());
    let s = input.trim();

    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total_nanos: u128 = 0;
    let mut rest = s;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (whole, fraction) = match rest[..number_len].split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (&rest[..number_len], ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit: u128 = match &rest[..unit_len] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        total_nanos = whole
            .checked_mul(nanos_per_unit)
            .and_then(|nanos| total_nanos.checked_add(nanos))
            .ok_or_else(invalid)?;

        if !fraction.is_empty() {
            let digits: u128 = fraction.parse().map_err(|_| invalid())?;
            let scale = 10u128
                .checked_pow(fraction.len() as u32)
                .ok_or_else(invalid)?;
            total_nanos = digits
                .checked_mul(nanos_per_unit)
                .map(|nanos| nanos / scale)
                .and_then(|nanos| total_nanos.checked_add(nanos))
                .ok_or_else(invalid)?;
        }
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total_nanos % 1_000_000_000) as u32))
}

/// Serde adapter for duration strings in the configuration file
pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_CONFIG: &str = r#"
[crawler]
timeout = "5s"
rate-limit = 120
fetch-workers = 64
parse-workers = 4
channel-capacity = 256

[user-agent]
crawler-name = "TestBot"
crawler-version = "2.0"

[output]
directory = "/tmp/sitemaps"
"#;

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VALID_CONFIG.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.crawler.timeout, Duration::from_secs(5));
        assert_eq!(config.crawler.rate_limit, 120);
        assert_eq!(config.crawler.fetch_workers, 64);
        assert_eq!(config.crawler.parse_workers, 4);
        assert_eq!(config.crawler.channel_capacity, 256);
        assert_eq!(config.user_agent.header_value(), "TestBot/2.0");
        assert_eq!(config.output.directory.to_str(), Some("/tmp/sitemaps"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.crawler.timeout, Duration::from_secs(10));
        assert_eq!(config.crawler.rate_limit, 0);
        assert_eq!(config.crawler.channel_capacity, 1024);
        assert!(config.crawler.fetch_workers >= config.crawler.parse_workers);
        assert_eq!(config.user_agent.crawler_name, "hostcrawl");
    }

    #[test]
    fn test_partial_section() {
        let config = parse_config("[crawler]\nrate-limit = 30\n").unwrap();
        assert_eq!(config.crawler.rate_limit, 30);
        assert_eq!(config.crawler.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_toml() {
        let result = parse_config("[crawler\ntimeout = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_duration_in_file() {
        let result = parse_config("[crawler]\ntimeout = \"ten seconds\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Path::new("/nonexistent/hostcrawl.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_compound() {
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(matches!(
            parse_duration("99999999999999999999999999999999h"),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(parse_duration("1.99999999999999999999999999999999999999h").is_err());
        assert!(parse_duration("18446744073709551616s").is_err());
    }
}
