use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub messaging: MessagingConfig,

    #[command(flatten)]
    pub typing: TypingConfig,

    #[command(flatten)]
    pub reports: ReportConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long = "database-url", env = "ALERTDAVAO_DATABASE_URL")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "ALERTDAVAO_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub max_connections: u32,

    /// Minimum number of idle connections kept open
    #[arg(long, env = "ALERTDAVAO_DB_MIN_CONNECTIONS", default_value_t = 2)]
    pub min_connections: u32,

    /// Seconds to wait for a free connection before failing
    #[arg(long, env = "ALERTDAVAO_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// Seconds an idle connection may live
    #[arg(long, env = "ALERTDAVAO_DB_IDLE_TIMEOUT_SECS", default_value_t = 300)]
    pub idle_timeout_secs: u64,

    /// Maximum lifetime of a connection in seconds
    #[arg(long, env = "ALERTDAVAO_DB_MAX_LIFETIME_SECS", default_value_t = 1800)]
    pub max_lifetime_secs: u64,

    /// Connection attempts at startup before giving up
    #[arg(long, env = "ALERTDAVAO_DB_CONNECT_RETRIES", default_value_t = 5)]
    pub connect_retries: usize,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "ALERTDAVAO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the public API
    #[arg(long, env = "ALERTDAVAO_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for liveness/readiness probes
    #[arg(long, env = "ALERTDAVAO_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Deadline for a single API request
    #[arg(long, env = "ALERTDAVAO_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// How long to wait for background workers on shutdown
    #[arg(long, env = "ALERTDAVAO_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "ALERTDAVAO_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for JWT signing
    #[arg(long, env = "ALERTDAVAO_JWT_SECRET")]
    pub jwt_secret: String,

    /// Access token time-to-live in seconds
    #[arg(long, env = "ALERTDAVAO_ACCESS_TOKEN_TTL_SECS", default_value_t = 86_400)]
    pub access_token_ttl_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for standard endpoints
    #[arg(long, env = "ALERTDAVAO_RATE_LIMIT_PER_SECOND", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=1_000_000_000))]
    pub per_second: u32,

    /// Burst allowance for standard endpoints
    #[arg(long, env = "ALERTDAVAO_RATE_LIMIT_BURST", default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..))]
    pub burst: u32,

    /// Stricter rate limit for register/login
    #[arg(long, env = "ALERTDAVAO_AUTH_RATE_LIMIT_PER_SECOND", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=1_000_000_000))]
    pub auth_per_second: u32,

    /// Burst allowance for register/login
    #[arg(long, env = "ALERTDAVAO_AUTH_RATE_LIMIT_BURST", default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub auth_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct MessagingConfig {
    /// Maximum message body length in characters
    #[arg(long, env = "ALERTDAVAO_MAX_MESSAGE_CHARS", default_value_t = 5000)]
    pub max_body_chars: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TypingBackend {
    #[default]
    Memory,
    Database,
}

impl TypingBackend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Database => "database",
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct TypingConfig {
    /// Where typing signals are kept
    #[arg(long = "typing-backend", env = "ALERTDAVAO_TYPING_BACKEND", value_enum, default_value_t = TypingBackend::Memory)]
    pub backend: TypingBackend,

    /// How long a typing signal stays live after it was last set
    #[arg(long, env = "ALERTDAVAO_TYPING_LIVENESS_MS", default_value_t = 3000)]
    pub liveness_window_ms: u64,

    /// How often expired typing signals are swept
    #[arg(long = "typing-sweep-interval-secs", env = "ALERTDAVAO_TYPING_SWEEP_INTERVAL_SECS", default_value_t = 30)]
    pub sweep_interval_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct ReportConfig {
    /// Search radius used by the map view when none is given
    #[arg(long, env = "ALERTDAVAO_REPORTS_DEFAULT_RADIUS_KM", default_value_t = 1.0)]
    pub default_radius_km: f64,

    /// Largest radius the map view accepts
    #[arg(long, env = "ALERTDAVAO_REPORTS_MAX_RADIUS_KM", default_value_t = 50.0)]
    pub max_radius_km: f64,

    /// Report count at which an area is classified as medium risk
    #[arg(long, env = "ALERTDAVAO_REPORTS_MEDIUM_RISK_THRESHOLD", default_value_t = 3)]
    pub medium_risk_threshold: usize,

    /// Report count at which an area is classified as high risk
    #[arg(long, env = "ALERTDAVAO_REPORTS_HIGH_RISK_THRESHOLD", default_value_t = 6)]
    pub high_risk_threshold: usize,

    /// Maximum media attachments per report
    #[arg(long, env = "ALERTDAVAO_REPORTS_MAX_MEDIA", default_value_t = 10)]
    pub max_media_per_report: usize,

    /// Upper bound on reports listed by the nearby query
    #[arg(long, env = "ALERTDAVAO_REPORTS_MAX_NEARBY_RESULTS", default_value_t = 200)]
    pub max_nearby_results: usize,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the database readiness probe
    #[arg(long, env = "ALERTDAVAO_HEALTH_DB_TIMEOUT_MS", default_value_t = 2000)]
    pub db_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint; telemetry export is disabled when unset
    #[arg(long, env = "ALERTDAVAO_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "ALERTDAVAO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// How often metrics are pushed to the collector
    #[arg(long, env = "ALERTDAVAO_METRICS_EXPORT_INTERVAL_SECS", default_value_t = 60)]
    pub metrics_export_interval_secs: u64,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_args() {
        let config = Config::parse_from([
            "alertdavao-server",
            "--database-url",
            "postgres://localhost/alertdavao",
            "--jwt-secret",
            "secret",
        ]);

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.messaging.max_body_chars, 5000);
        assert_eq!(config.typing.backend, TypingBackend::Memory);
        assert_eq!(config.typing.liveness_window_ms, 3000);
        assert_eq!(config.telemetry.log_format, LogFormat::Text);
        assert_eq!(config.server.trusted_proxies.len(), 4);
    }

    #[test]
    fn test_typing_backend_selection() {
        let config = Config::parse_from([
            "alertdavao-server",
            "--database-url",
            "postgres://localhost/alertdavao",
            "--jwt-secret",
            "secret",
            "--typing-backend",
            "database",
        ]);

        assert_eq!(config.typing.backend, TypingBackend::Database);
    }

    fn parse_with(extra: &[&str]) -> Result<Config, clap::Error> {
        let base = ["alertdavao-server", "--database-url", "postgres://localhost/alertdavao", "--jwt-secret", "secret"];
        Config::try_parse_from(base.iter().chain(extra))
    }

    #[test]
    fn test_rate_limit_values_the_limiter_cannot_use_are_rejected() {
        for args in [
            ["--per-second", "0"],
            ["--burst", "0"],
            ["--auth-per-second", "0"],
            ["--auth-burst", "0"],
            ["--per-second", "1000000001"],
        ] {
            assert!(parse_with(&args).is_err(), "accepted {args:?}");
        }

        let config = parse_with(&["--per-second", "1000000000", "--auth-burst", "1"]).unwrap();
        assert_eq!(config.rate_limit.per_second, 1_000_000_000);
        assert_eq!(config.rate_limit.auth_burst, 1);
    }

    #[test]
    fn test_nearby_results_cap_default() {
        let config = parse_with(&[]).unwrap();
        assert_eq!(config.reports.max_nearby_results, 200);
    }
}
