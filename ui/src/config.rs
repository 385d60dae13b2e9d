//! Build-time configuration.
//!
//! Values come from environment variables present when the wasm bundle is
//! compiled (e.g. `BACKEND_URL=https://api.example.com trunk build`).

const DEFAULT_LOG_FILTER: &str = "error,ui=debug,loading=debug";
const DEFAULT_TOAST_DURATION_MS: u32 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backend origin; `None` means same origin as the page.
    pub backend_url: Option<&'static str>,
    pub log_filter: &'static str,
    /// How long toasts stay on screen.
    pub toast_duration_ms: u32,
}

impl Config {
    pub fn from_build_env() -> Self {
        Self {
            backend_url: option_env!("BACKEND_URL").filter(|url| !url.is_empty()),
            log_filter: option_env!("UI_LOG_FILTER").unwrap_or(DEFAULT_LOG_FILTER),
            toast_duration_ms: parse_duration(option_env!("UI_TOAST_DURATION_MS")),
        }
    }
}

fn parse_duration(raw: Option<&str>) -> u32 {
    raw.and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(DEFAULT_TOAST_DURATION_MS)
}

pub fn config() -> Config {
    Config::from_build_env()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration(None), DEFAULT_TOAST_DURATION_MS);
        assert_eq!(parse_duration(Some("2500")), 2500);
        assert_eq!(parse_duration(Some(" 800 ")), 800);
        assert_eq!(parse_duration(Some("soon")), DEFAULT_TOAST_DURATION_MS);
    }
}
