use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

const INTERVAL_ENV: &str = "CRUMBTRAIL_INTERVAL_MS";
const PERF_ENV: &str = "CRUMBTRAIL_PERF";

/// Engine configuration. Fixed once the engine has seen its first scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Record call-forest timings. Tracing works either way.
    pub performance_counting: bool,
    /// Length of the rolling window behind the last-interval report.
    pub interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            performance_counting: cfg!(feature = "perf"),
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl Config {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_performance_counting(mut self, on: bool) -> Self {
        self.performance_counting = on;
        self
    }

    /// Defaults overridden by `CRUMBTRAIL_INTERVAL_MS` and `CRUMBTRAIL_PERF`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(INTERVAL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.interval = Duration::from_millis(ms),
                Err(e) => log::warn!("ignoring {INTERVAL_ENV}={raw:?}: {e}"),
            }
        }
        if let Some(raw) = lookup(PERF_ENV) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "off" | "no" => config.performance_counting = false,
                "1" | "true" | "on" | "yes" => config.performance_counting = cfg!(feature = "perf"),
                _ => log::warn!("ignoring {PERF_ENV}={raw:?}: expected a boolean"),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_interval_is_five_seconds() {
        assert_eq!(Config::default().interval, Duration::from_millis(5000));
    }

    #[test]
    fn env_overrides_interval_and_perf() {
        let config = Config::from_lookup(lookup(&[(INTERVAL_ENV, "250"), (PERF_ENV, "off")]));
        assert_eq!(config.interval, Duration::from_millis(250));
        assert!(!config.performance_counting);
    }

    #[test]
    fn invalid_env_values_keep_defaults() {
        let config = Config::from_lookup(lookup(&[(INTERVAL_ENV, "soon"), (PERF_ENV, "maybe")]));
        assert_eq!(config, Config::default());
    }
}
