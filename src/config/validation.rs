use crate::config::types::{
    ClassifierConfig, Config, CrawlerConfig, DomainPatternEntry, OutputConfig, SeedEntry,
    UserAgentConfig,
};
use crate::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seeds)?;
    validate_classifier_config(&config.classifier)?;
    validate_domain_entries(&config.domains)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.pool_size < 1 || config.pool_size > 64 {
        return Err(ConfigError::Validation(format!(
            "pool_size must be between 1 and 64, got {}",
            config.pool_size
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    validate_max_in_flight(config.max_in_flight)?;

    if config.domain_deadline_secs == Some(0) {
        return Err(ConfigError::Validation(
            "domain_deadline_secs must be > 0 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_max_in_flight(value: usize) -> Result<(), ConfigError> {
    if !(1..=100).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "max_in_flight must be between 1 and 100, got {}",
            value
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed entries
///
/// Seeds that do not parse are accepted here: they surface as failed
/// domains in the report rather than aborting the whole run. Two seeds that
/// resolve to the same hostname are rejected, since the report is keyed by
/// hostname.
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[seed]] entry is required".to_string(),
        ));
    }

    let mut hostnames = HashSet::new();

    for seed in seeds {
        if seed.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "seed url cannot be empty".to_string(),
            ));
        }

        if let Some(max_in_flight) = seed.max_in_flight {
            validate_max_in_flight(max_in_flight)?;
        }

        if let Some(host) = Url::parse(seed.url.trim())
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        {
            if !hostnames.insert(host.clone()) {
                return Err(ConfigError::Validation(format!(
                    "hostname '{}' appears in more than one seed",
                    host
                )));
            }
        }
    }

    Ok(())
}

/// Validates classifier settings
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    if let Some(patterns) = &config.default_patterns {
        if patterns.is_empty() {
            return Err(ConfigError::Validation(
                "default_patterns cannot be empty when set".to_string(),
            ));
        }
        validate_regexes(patterns)?;
    }
    Ok(())
}

/// Validates per-hostname pattern entries
fn validate_domain_entries(entries: &[DomainPatternEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in entries {
        validate_domain_pattern(&entry.hostname)?;

        if !seen.insert(entry.hostname.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "hostname '{}' has more than one [[domain]] entry",
                entry.hostname
            )));
        }

        if entry.product_patterns.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Domain '{}' must have at least one product pattern",
                entry.hostname
            )));
        }

        validate_regexes(&entry.product_patterns)?;
    }

    Ok(())
}

/// Checks that every pattern compiles
fn validate_regexes(patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
