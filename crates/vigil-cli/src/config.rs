//! CLI configuration via environment variables
//!
//! vigil uses environment variables for optional configuration.
//! Command-line flags override these values; no configuration file is read.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Run self-tests on a worker pool (VIGIL_PARALLEL=1)
    pub parallel: bool,
    /// Worker pool size (VIGIL_WORKERS=4)
    pub workers: Option<usize>,
    /// Disable colored output (VIGIL_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Default to JSON report output (VIGIL_JSON=1)
    pub json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            parallel: env::var("VIGIL_PARALLEL").map(|v| truthy(&v)).unwrap_or(false),
            workers: env::var("VIGIL_WORKERS")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
            no_color: env::var("VIGIL_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
            json: env::var("VIGIL_JSON").map(|v| truthy(&v)).unwrap_or(false),
        }
    }
}

fn truthy(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    !(lower.is_empty() || lower == "0" || lower == "false" || lower == "off")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "VIGIL_PARALLEL",
        "VIGIL_WORKERS",
        "VIGIL_NO_COLOR",
        "NO_COLOR",
        "VIGIL_JSON",
    ];

    fn clear() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear();
        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    #[serial]
    fn test_config_parallel() {
        clear();
        env::set_var("VIGIL_PARALLEL", "1");
        assert!(Config::from_env().parallel);

        env::set_var("VIGIL_PARALLEL", "off");
        assert!(!Config::from_env().parallel);
        clear();
    }

    #[test]
    #[serial]
    fn test_config_workers() {
        clear();
        env::set_var("VIGIL_WORKERS", " 4 ");
        assert_eq!(Config::from_env().workers, Some(4));

        env::set_var("VIGIL_WORKERS", "many");
        assert_eq!(Config::from_env().workers, None);
        clear();
    }

    #[test]
    #[serial]
    fn test_config_no_color() {
        clear();
        env::set_var("VIGIL_NO_COLOR", "1");
        assert!(Config::from_env().no_color);
        env::remove_var("VIGIL_NO_COLOR");

        // Also test NO_COLOR (standard)
        env::set_var("NO_COLOR", "1");
        assert!(Config::from_env().no_color);
        clear();
    }

    #[test]
    #[serial]
    fn test_config_json() {
        clear();
        env::set_var("VIGIL_JSON", "true");
        assert!(Config::from_env().json);
        env::set_var("VIGIL_JSON", "FALSE");
        assert!(!Config::from_env().json);
        clear();
    }
}
