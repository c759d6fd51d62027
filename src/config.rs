use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_max_upload_bytes() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Directory rendered charts are written to and served from.
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
    /// Write every chart straight into `media_root` instead of a per-request
    /// subdirectory. Identically named columns then overwrite each other.
    pub shared_plot_dir: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            media_root: PathBuf::from("media/plots"),
            max_upload_bytes: default_max_upload_bytes(),
            shared_plot_dir: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            bind_addr: parse_var("EDA_BIND_ADDR", std::env::var("EDA_BIND_ADDR").ok(), defaults.bind_addr)?,
            media_root: std::env::var("EDA_MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            max_upload_bytes: parse_var(
                "EDA_MAX_UPLOAD_BYTES",
                std::env::var("EDA_MAX_UPLOAD_BYTES").ok(),
                defaults.max_upload_bytes,
            )?,
            shared_plot_dir: parse_var(
                "EDA_SHARED_PLOT_DIR",
                std::env::var("EDA_SHARED_PLOT_DIR").ok(),
                defaults.shared_plot_dir,
            )?,
        })
    }
}

fn parse_var<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, value)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_values_fall_back_to_defaults() {
        assert_eq!(parse_var("X", None, 7usize).unwrap(), 7);
        assert_eq!(parse_var("X", Some("  ".to_string()), 7usize).unwrap(), 7);
    }

    #[test]
    fn values_are_parsed_and_trimmed() {
        assert_eq!(parse_var("X", Some(" 42 ".to_string()), 7usize).unwrap(), 42);
        assert!(parse_var("X", Some("true".to_string()), false).unwrap());
        let addr: SocketAddr = parse_var("X", Some("0.0.0.0:8080".to_string()), default_bind_addr()).unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn invalid_values_are_reported_with_the_key() {
        let err = parse_var("EDA_MAX_UPLOAD_BYTES", Some("lots".to_string()), 1usize).unwrap_err();
        assert!(err.to_string().contains("EDA_MAX_UPLOAD_BYTES"));
    }
}
