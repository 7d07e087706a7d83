//! Relay configuration from the environment.

use roiscope_core::protocol::ChannelId;
use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_BIND: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_FPS: u32 = 5;
const DEFAULT_JPEG_QUALITY: u8 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Synthetic frames per second, per channel.
    pub fps: u32,
    pub channels: Vec<ChannelId>,
    pub jpeg_quality: u8,
    /// Emit a synthetic alert this often; off when unset.
    pub alert_interval_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(DEFAULT_BIND),
            fps: DEFAULT_FPS,
            channels: vec![1, 2, 3],
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            alert_interval_secs: None,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `ROISCOPE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("ROISCOPE_BIND") {
            config.bind = parse("ROISCOPE_BIND", &value)?;
        }
        if let Some(value) = lookup("ROISCOPE_FPS") {
            config.fps = parse("ROISCOPE_FPS", &value)?;
            if config.fps == 0 {
                return Err(ConfigError::Invalid {
                    key: "ROISCOPE_FPS",
                    value,
                });
            }
        }
        if let Some(value) = lookup("ROISCOPE_CHANNELS") {
            config.channels = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse("ROISCOPE_CHANNELS", s))
                .collect::<Result<_, _>>()?;
        }
        if let Some(value) = lookup("ROISCOPE_JPEG_QUALITY") {
            let quality: u8 = parse("ROISCOPE_JPEG_QUALITY", &value)?;
            config.jpeg_quality = quality.clamp(1, 100);
        }
        if let Some(value) = lookup("ROISCOPE_ALERT_INTERVAL") {
            config.alert_interval_secs = Some(parse("ROISCOPE_ALERT_INTERVAL", &value)?);
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.jpeg_quality, 60);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ROISCOPE_BIND", "127.0.0.1:9000"),
            ("ROISCOPE_FPS", "10"),
            ("ROISCOPE_CHANNELS", "4, 7,"),
            ("ROISCOPE_ALERT_INTERVAL", "30"),
        ]))
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.fps, 10);
        assert_eq!(config.channels, vec![4, 7]);
        assert_eq!(config.alert_interval_secs, Some(30));
    }

    #[test]
    fn test_invalid_values() {
        assert!(ServerConfig::from_lookup(lookup(&[("ROISCOPE_FPS", "0")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("ROISCOPE_CHANNELS", "1,x")])).is_err());
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[("ROISCOPE_BIND", "nowhere")])),
            Err(ConfigError::Invalid {
                key: "ROISCOPE_BIND",
                value: "nowhere".to_string()
            })
        );
    }
}
