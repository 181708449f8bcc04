use std::{env, path::PathBuf, time::Duration};
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub environment: String,
    pub port: u16,
    pub session_path: PathBuf,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            environment: "development".to_string(),
            port: DEFAULT_PORT,
            session_path: PathBuf::from("data/session.json"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(name).filter(|value| !value.trim().is_empty()))
        };

        let defaults = Self::default();
        let api_url = first(&["CARE_API_URL", "NEXT_PUBLIC_API_URL"])
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let environment = first(&["CARE_ENVIRONMENT", "NEXT_PUBLIC_ENVIRONMENT"])
            .unwrap_or(defaults.environment);
        let port = parse_or(first(&["PORT"]), "PORT", defaults.port);
        let session_path = first(&["CARE_SESSION_PATH"])
            .map(PathBuf::from)
            .unwrap_or(defaults.session_path);
        let timeout_secs = match parse_or(
            first(&["CARE_REQUEST_TIMEOUT_SECS"]),
            "CARE_REQUEST_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        ) {
            0 => {
                warn!("ignoring CARE_REQUEST_TIMEOUT_SECS=0, a zero timeout fails every request");
                DEFAULT_TIMEOUT_SECS
            }
            secs => secs,
        };

        Self {
            api_url,
            environment,
            port,
            session_path,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(value: Option<String>, name: &str, fallback: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {name}={raw:?}");
            fallback
        }),
        None => fallback,
    }
}
