use anyhow::Context;
use std::env;

/// URL for accessing the PostgreSQL database (should contain a database name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Secret used to sign and verify session tokens. Must be identical across all instances of the service.
pub const JWT_SECRET: &str = "JWT_SECRET";
/// Socket address the HTTP server binds to. Defaults to [DEFAULT_LISTEN_ADDR].
pub const LISTEN_ADDR: &str = "LISTEN_ADDR";
/// Log level configuration for the application. For formatting info, see [EnvFilter's documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Runtime configuration assembled from the environment at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    pub jwt_secret: String,
    pub listen_addr: String,
    /// Raw filter directives for the stdout logger
    pub log_filter: Option<String>,
    /// Span and metric export endpoints, only present if both are configured
    pub otel_endpoints: Option<(String, String)>,
}

impl AppConfig {
    /// Reads configuration from environment variables, failing with the name of the first
    /// required variable that's missing
    pub fn from_env() -> Result<AppConfig, anyhow::Error> {
        let db_url = env::var(DB_URL).with_context(|| format!("{DB_URL} must be set"))?;
        let jwt_secret =
            env::var(JWT_SECRET).with_context(|| format!("{JWT_SECRET} must be set"))?;
        let listen_addr = env::var(LISTEN_ADDR).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_owned());
        let log_filter = env::var(LOG_LEVEL).ok();
        let otel_endpoints = match (env::var(OTEL_SPAN_EXPORT_URL), env::var(OTEL_METRIC_EXPORT_URL)) {
            (Ok(spans), Ok(metrics)) => Some((spans, metrics)),
            _ => None,
        };

        Ok(AppConfig {
            db_url,
            jwt_secret,
            listen_addr,
            log_filter,
            otel_endpoints,
        })
    }
}

#[cfg(test)]
pub mod test {
    /// URL for accessing the PostgreSQL database during integration tests (should not contain a database name in the path)
    pub const TEST_DB_URL: &str = "TEST_DB_URL";
}
