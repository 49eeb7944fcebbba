//! Server configuration from the command line and environment

use clap::Parser;
use shared::{DEFAULT_PORT, HEARTBEAT_INTERVAL};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Presence server for the arena demo")]
pub struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory of static client assets
    #[arg(short = 's', long, default_value = "public")]
    pub static_dir: PathBuf,

    /// Seconds between liveness sweeps
    #[arg(long, default_value_t = HEARTBEAT_INTERVAL.as_secs())]
    pub heartbeat_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub heartbeat: Duration,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("public"),
            heartbeat: HEARTBEAT_INTERVAL,
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            static_dir: args.static_dir,
            heartbeat: Duration::from_secs(args.heartbeat_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_constants() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.heartbeat, Duration::from_secs(30));
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_args_into_config() {
        let args = Args::try_parse_from([
            "server",
            "--host",
            "127.0.0.1",
            "--port",
            "4000",
            "--static-dir",
            "assets",
            "--heartbeat-secs",
            "5",
        ])
        .unwrap();
        let config = ServerConfig::from(args);

        assert_eq!(config.bind_address(), "127.0.0.1:4000");
        assert_eq!(config.static_dir, PathBuf::from("assets"));
        assert_eq!(config.heartbeat, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_invalid_port() {
        assert!(Args::try_parse_from(["server", "--port", "99999"]).is_err());
        assert!(Args::try_parse_from(["server", "--heartbeat-secs", "soon"]).is_err());
    }
}
