use std::time::Duration;

use super::{
    types::{Config, ScrapeConfig, SortConfig},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - At least one search page
/// - Concurrency limit is not 0
/// - Timeout, when set, is a positive duration that fits in `Duration`
/// - Sort batch size is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_scrape(&config.scrape)?;
    validate_sort(&config.sort)
}

/// Validate only the `[scrape]` section, for commands that crawl.
pub fn validate_scrape(scrape: &ScrapeConfig) -> Result<(), ConfigError> {
    if scrape.pages == 0 {
        return Err(ConfigError::ValidationError(
            "scrape.pages must be at least 1".to_string(),
        ));
    }

    if scrape.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "scrape.concurrency cannot be 0".to_string(),
        ));
    }

    if let Some(timeout) = scrape.timeout_secs {
        let valid = timeout > 0.0 && Duration::try_from_secs_f64(timeout).is_ok();
        if !valid {
            return Err(ConfigError::ValidationError(format!(
                "scrape.timeout_secs must be a positive number of seconds, got {}",
                timeout
            )));
        }
    }

    Ok(())
}

/// Validate only the `[sort]` section, for commands that sort.
pub fn validate_sort(sort: &SortConfig) -> Result<(), ConfigError> {
    if sort.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "sort.batch_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}
