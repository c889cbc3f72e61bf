use clap::Parser;

use crate::state::{DEFAULT_TREND_WINDOW_DAYS, MAX_TREND_WINDOW_DAYS};

/// Server configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug, Clone)]
#[command(name = "freelance-analytics")]
#[command(author, version, about = "Aggregate analytics for the freelance marketplace")]
pub struct ServerConfig {
    /// MongoDB connection string
    #[arg(
        long,
        env = "MONGO_URI",
        default_value = "mongodb://localhost:27017/freelance"
    )]
    pub mongo_uri: String,

    /// Database name; defaults to the one named in the connection string
    #[arg(long, env = "MONGO_DATABASE")]
    pub database: Option<String>,

    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5002)]
    pub port: u16,

    /// Allowed CORS origins: "*" or a comma-separated list
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Look-back window of the trend endpoints, in days (1 to 365)
    #[arg(
        long,
        env = "TREND_WINDOW_DAYS",
        default_value_t = DEFAULT_TREND_WINDOW_DAYS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_TREND_WINDOW_DAYS)
    )]
    pub trend_window_days: i64,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "freelance-analytics",
            "--mongo-uri",
            "mongodb://db:27017/market",
            "--database",
            "analytics",
            "--port",
            "8080",
            "--cors-origins",
            "http://localhost:3000",
            "--trend-window-days",
            "7",
        ])
        .unwrap();

        assert_eq!(config.mongo_uri, "mongodb://db:27017/market");
        assert_eq!(config.database.as_deref(), Some("analytics"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, "http://localhost:3000");
        assert_eq!(config.trend_window_days, 7);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_rejects_non_numeric_port() {
        assert!(ServerConfig::try_parse_from(["freelance-analytics", "--port", "abc"]).is_err());
    }

    #[test]
    fn test_rejects_trend_window_out_of_range() {
        for days in ["0", "-5", "400"] {
            assert!(
                ServerConfig::try_parse_from(["freelance-analytics", "--trend-window-days", days])
                    .is_err(),
                "accepted --trend-window-days {}",
                days
            );
        }

        let config =
            ServerConfig::try_parse_from(["freelance-analytics", "--trend-window-days", "365"])
                .unwrap();
        assert_eq!(config.trend_window_days, 365);
    }

    #[test]
    fn test_bind_address() {
        let config = ServerConfig::try_parse_from([
            "freelance-analytics",
            "--host",
            "0.0.0.0",
            "--port",
            "5002",
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5002");
    }
}
