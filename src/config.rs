// =============================================================================
// config.rs — THE KNOBS
// =============================================================================
//
// Every tunable in the engine lives here and can be overridden through an
// environment variable prefixed with PARCEL_TRACK_. A .env file next to the
// binary is picked up too, for people who would rather not export things by
// hand every time they want to know where their socks are.
//
// The defaults point at the real courier endpoints. Tests build a Config
// with `Config::default()`, which never looks at the environment.
// =============================================================================

use std::env;
use std::time::Duration;

/// Runtime configuration for the resolver and the built-in providers.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Deadline for each provider fetch, delegation included.
    /// `None` lets a hung courier hold the whole resolution hostage.
    /// Default: 45 seconds. `PARCEL_TRACK_FETCH_TIMEOUT_SECS=0` disables it.
    pub fetch_timeout: Option<Duration>,

    // =========================================================================
    // HTTP
    // =========================================================================

    /// Per-request timeout of the shared reqwest client. Default: 20 seconds.
    pub http_timeout: Duration,

    /// User-Agent sent to every courier. Some of them are picky about
    /// talking to anything that does not look like a browser.
    pub user_agent: String,

    // =========================================================================
    // COURIER ENDPOINTS
    // =========================================================================

    /// Speedy public site. The tracking page lives under /en/track-shipment.
    pub speedy_base_url: String,

    /// YunExpress tracking query API.
    pub yunexpress_query_url: String,

    /// Origin/Referer presented to the YunExpress API.
    pub yunexpress_origin: String,

    // =========================================================================
    // LOGGING
    // =========================================================================

    /// Emit logs as JSON lines instead of the human-friendly format.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            fetch_timeout: Some(Duration::from_secs(45)),
            http_timeout: Duration::from_secs(20),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0"
                .to_string(),
            speedy_base_url: "https://www.speedy.bg".to_string(),
            yunexpress_query_url: "https://services.yuntrack.com/Track/Query".to_string(),
            yunexpress_origin: "https://www.yuntrack.com".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// [`Config::default`] for anything unset or unparseable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a Config from an arbitrary key lookup. `from_env` is this with
    /// the process environment plugged in.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str, default: String| lookup(key).unwrap_or(default);

        let fetch_timeout_secs: u64 = get(
            "PARCEL_TRACK_FETCH_TIMEOUT_SECS",
            defaults.fetch_timeout.map_or(0, |d| d.as_secs()).to_string(),
        )
        .parse()
        .unwrap_or(45);

        Config {
            fetch_timeout: match fetch_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            http_timeout: Duration::from_secs(
                get(
                    "PARCEL_TRACK_HTTP_TIMEOUT_SECS",
                    defaults.http_timeout.as_secs().to_string(),
                )
                .parse()
                .unwrap_or(20),
            ),
            user_agent: get("PARCEL_TRACK_USER_AGENT", defaults.user_agent),
            speedy_base_url: get("PARCEL_TRACK_SPEEDY_BASE_URL", defaults.speedy_base_url)
                .trim_end_matches('/')
                .to_string(),
            yunexpress_query_url: get(
                "PARCEL_TRACK_YUNEXPRESS_QUERY_URL",
                defaults.yunexpress_query_url,
            ),
            yunexpress_origin: get("PARCEL_TRACK_YUNEXPRESS_ORIGIN", defaults.yunexpress_origin)
                .trim_end_matches('/')
                .to_string(),
            log_json: matches!(
                get("PARCEL_TRACK_LOG_JSON", "false".to_string())
                    .to_ascii_lowercase()
                    .as_str(),
                "1" | "true" | "yes"
            ),
        }
    }
}
