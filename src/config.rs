use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for the client, read from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_base: String,
    /// `None` waits on the server indefinitely.
    pub request_timeout: Option<Duration>,
    /// Talk to the in-process fake server instead of `api_base`.
    pub offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            offline: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        fn flag_env(name: &str) -> bool {
            std::env::var(name)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        }
        let api_base = std::env::var("BOOKREVIEW_API_BASE")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let secs = std::env::var("BOOKREVIEW_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            api_base,
            request_timeout: (secs > 0).then(|| Duration::from_secs(secs)),
            offline: flag_env("BOOKREVIEW_OFFLINE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for k in ["BOOKREVIEW_API_BASE", "BOOKREVIEW_TIMEOUT_SECS", "BOOKREVIEW_OFFLINE"] {
            std::env::remove_var(k);
        }
    }

    #[test]
    #[serial]
    fn defaults_without_env() {
        clear();
        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    #[serial]
    fn reads_overrides() {
        clear();
        std::env::set_var("BOOKREVIEW_API_BASE", "http://reviews.local:8000/");
        std::env::set_var("BOOKREVIEW_TIMEOUT_SECS", "0");
        std::env::set_var("BOOKREVIEW_OFFLINE", "true");
        let cfg = Config::from_env();
        clear();
        assert_eq!(cfg.api_base, "http://reviews.local:8000");
        assert_eq!(cfg.request_timeout, None);
        assert!(cfg.offline);
    }

    #[test]
    #[serial]
    fn bad_timeout_falls_back() {
        clear();
        std::env::set_var("BOOKREVIEW_TIMEOUT_SECS", "soon");
        let cfg = Config::from_env();
        clear();
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));
    }
}
