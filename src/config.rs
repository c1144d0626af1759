use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub host: IpAddr,
    pub port: u16,
    pub static_dir: PathBuf,
    pub dev_server_url: String,
    pub data_dir: PathBuf,
    pub session_ttl: Duration,
    pub success_reset: Duration,
    pub max_body_size: usize,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// Proxy page and asset requests to the live-reloading bundler.
    Development,
    /// Serve the pre-built bundle from `static_dir`.
    Production,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let mode = match env_or("CLINCELL_MODE", "production").as_str() {
            "development" => Mode::Development,
            _ => Mode::Production,
        };

        let host: IpAddr = env_or("CLINCELL_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CLINCELL_HOST: {e}"))?;

        let port_raw = std::env::var("CLINCELL_PORT")
            .or_else(|_| std::env::var("PORT"))
            .unwrap_or_else(|_| "5000".to_string());
        let port: u16 = port_raw
            .parse()
            .map_err(|e| format!("Invalid CLINCELL_PORT: {e}"))?;

        let static_dir = PathBuf::from(env_or("CLINCELL_STATIC_DIR", "dist/public"));
        let dev_server_url = env_or("CLINCELL_DEV_SERVER_URL", "http://127.0.0.1:5173")
            .trim_end_matches('/')
            .to_string();
        let data_dir = PathBuf::from(env_or("CLINCELL_DATA_DIR", "data"));

        let session_ttl: u64 = env_or("CLINCELL_SESSION_TTL_SECS", "1800")
            .parse()
            .map_err(|e| format!("Invalid CLINCELL_SESSION_TTL_SECS: {e}"))?;

        let success_reset: u64 = env_or("CLINCELL_SUCCESS_RESET_SECS", "5")
            .parse()
            .map_err(|e| format!("Invalid CLINCELL_SUCCESS_RESET_SECS: {e}"))?;

        let max_body_size: usize = env_or("CLINCELL_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid CLINCELL_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("CLINCELL_LOG_LEVEL", "info");

        Ok(Config {
            mode,
            host,
            port,
            static_dir,
            dev_server_url,
            data_dir,
            session_ttl: Duration::from_secs(session_ttl),
            success_reset: Duration::from_secs(success_reset),
            max_body_size,
            log_level,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
