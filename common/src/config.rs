use core::fmt;

use embassy_time::Duration;
use heapless::String;
use waypoint_nmea::ChecksumPolicy;

use crate::consts::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Only plain `http://` backends can be probed.
    UnsupportedScheme,
    MissingHost,
    BadPort,
    TooLong,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedScheme => f.write_str("unsupported url scheme"),
            ConfigError::MissingHost => f.write_str("url has no host"),
            ConfigError::BadPort => f.write_str("url port is not a number"),
            ConfigError::TooLong => f.write_str("url does not fit"),
        }
    }
}

/// Backend base url, split into what an HTTP/1.1 request needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrl {
    host: String<MAX_HOST_LEN>,
    port: u16,
    base_path: String<MAX_PATH_LEN>,
}

impl BackendUrl {
    /// Accepts `http://host[:port][/base]` or the same without a scheme.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let rest = match url.strip_prefix("http://") {
            Some(rest) => rest,
            None if url.contains("://") => return Err(ConfigError::UnsupportedScheme),
            None => url,
        };

        let (authority, path) = match rest.find('/') {
            Some(slash) => rest.split_at(slash),
            None => (rest, ""),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| ConfigError::BadPort)?),
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(ConfigError::MissingHost);
        }

        Ok(Self {
            host: String::try_from(host).map_err(|_| ConfigError::TooLong)?,
            port,
            base_path: String::try_from(path.trim_end_matches('/'))
                .map_err(|_| ConfigError::TooLong)?,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request path for an endpoint below the base url.
    pub fn path_to(&self, endpoint: &str) -> Result<String<MAX_PATH_LEN>, ConfigError> {
        let mut path = self.base_path.clone();
        path.push_str(endpoint).map_err(|_| ConfigError::TooLong)?;
        if path.is_empty() {
            path.push('/').map_err(|_| ConfigError::TooLong)?;
        }
        Ok(path)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub device_name: &'static str,
    pub backend: BackendUrl,
    pub checksum: ChecksumPolicy,
    pub probe_period: Duration,
    pub probe_timeout: Duration,
}

impl Config {
    pub fn new(backend: BackendUrl) -> Self {
        Self {
            device_name: DEVICE_NAME,
            backend,
            checksum: ChecksumPolicy::default(),
            probe_period: PROBE_PERIOD,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_checksum(mut self, checksum: ChecksumPolicy) -> Self {
        self.checksum = checksum;
        self
    }
}
