use crate::app_config::FinderConfig;
use crate::options::{LocationOptions, PredicateOption};
use crate::ConfigError;

/// Load finder configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_finder_config() -> Result<FinderConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_finder_config_from_env()
}

/// Load finder configuration from environment variables already in the process.
///
/// Unlike [`load_finder_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_finder_config_from_env() -> Result<FinderConfig, ConfigError> {
    build_finder_config(|key| std::env::var(key))
}

/// Build finder configuration using the provided env-var lookup function.
///
/// Every variable is optional; parsing is decoupled from the process
/// environment so tests can pass a plain `HashMap` lookup.
fn build_finder_config<F>(lookup: F) -> Result<FinderConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_predicate = |var: &str, default: PredicateOption| -> Result<PredicateOption, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.parse::<PredicateOption>().map_err(|e| invalid(var, e)),
            Err(_) => Ok(default),
        }
    };

    let imagery_base_url = or_default(
        "PANOFIND_IMAGERY_BASE_URL",
        "https://imagery.example.invalid/",
    );
    let imagery_api_key = lookup("PANOFIND_IMAGERY_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let request_timeout_secs = parse_u64("PANOFIND_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PANOFIND_USER_AGENT", "panofind/0.1 (panorama-discovery)");

    let max_concurrent_lookups = parse_usize("PANOFIND_MAX_CONCURRENT_LOOKUPS", "1")?;
    if max_concurrent_lookups == 0 {
        return Err(invalid(
            "PANOFIND_MAX_CONCURRENT_LOOKUPS",
            "must be at least 1".to_string(),
        ));
    }

    let search_radius_m = parse_u32("PANOFIND_SEARCH_RADIUS_M", "50")?;
    if search_radius_m == 0 {
        return Err(invalid(
            "PANOFIND_SEARCH_RADIUS_M",
            "must be at least 1".to_string(),
        ));
    }

    let locale = or_default("PANOFIND_LOCALE", "en");
    let max_retries = parse_u32("PANOFIND_MAX_RETRIES", "5")?;
    let retry_backoff_base_ms = parse_u64("PANOFIND_RETRY_BACKOFF_BASE_MS", "500")?;
    let log_level = or_default("PANOFIND_LOG_LEVEL", "info");

    let defaults = LocationOptions::default();
    let options = LocationOptions {
        trekker: parse_predicate("PANOFIND_TREKKER", defaults.trekker)?,
        first_gen: parse_predicate("PANOFIND_FIRST_GEN", defaults.first_gen)?,
        intersections: parse_predicate("PANOFIND_INTERSECTIONS", defaults.intersections)?,
        buildings: parse_predicate("PANOFIND_BUILDINGS", defaults.buildings)?,
        unofficial: parse_predicate("PANOFIND_UNOFFICIAL", defaults.unofficial)?,
        terminus: parse_predicate("PANOFIND_TERMINUS", defaults.terminus)?,
    };

    Ok(FinderConfig {
        imagery_base_url,
        imagery_api_key,
        request_timeout_secs,
        user_agent,
        max_concurrent_lookups,
        search_radius_m,
        locale,
        max_retries,
        retry_backoff_base_ms,
        log_level,
        options,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
